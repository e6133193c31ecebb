//! Form rendering module
//!
//! - `question_renderer`: maps a question and its answer to a widget description
//! - `field_renderer`: turns a widget description into styled lines
//! - `form_view`: lays out the current page with its navigation buttons

mod field_renderer;
mod form_view;
mod question_renderer;

pub use form_view::draw_form;
