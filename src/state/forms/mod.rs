//! Form domain layer
//!
//! Answers, validation and navigation for a loaded definition. Everything
//! here is independent of the terminal so it can be tested directly.

mod answer;
mod event;
mod form_state;
pub mod navigation;
pub mod other_option;
mod validation;

pub use answer::{empty_file_error, AnswerValue, FileAttachment};
pub use event::{WidgetEvent, WidgetEventKind};
pub use form_state::{FormContext, ValidationErrors};
pub use navigation::{NavOutcome, Navigator, Section};
pub use validation::{validate, validate_files, validate_live};
