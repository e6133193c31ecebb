//! Application state module

mod app_state;
mod definition;
mod forms;

pub use app_state::*;
pub use definition::*;
pub use forms::*;
