//! UI module for rendering the TUI

mod components;
mod forms;
mod layout;
mod screens;

use crate::state::{AppState, View};
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, state: &AppState) {
    let (header_area, content_area, status_area) = layout::create_layout(frame.area());

    layout::draw_header(frame, header_area, state);

    match state.current_view {
        View::IdentifierPrompt => screens::draw_identifier_prompt(frame, content_area, state),
        View::Loading => screens::draw_loading(frame, content_area, state),
        View::LoadFailed => screens::draw_load_failed(frame, state),
        View::Form => forms::draw_form(frame, content_area, state),
        View::Submitting => {
            forms::draw_form(frame, content_area, state);
            screens::draw_submitting(frame);
        }
        View::Submitted => screens::draw_submitted(frame, content_area, state),
    }

    layout::draw_status_bar(frame, status_area, state);
}
