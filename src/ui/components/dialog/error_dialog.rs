//! Error dialog component

use super::base::{render_dialog, DialogConfig};
use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
    Frame,
};

/// Render an error dialog with key hints, e.g. `[("r", "retry")]`
pub fn render_error_dialog(
    frame: &mut Frame,
    title: &str,
    error_message: &str,
    hints: &[(&str, &str)],
) {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut hint = Vec::new();
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            hint.push(Span::raw("  "));
        }
        hint.push(Span::styled(key.to_string(), key_style));
        hint.push(Span::raw(format!(" {action}")));
    }

    render_dialog(
        frame,
        DialogConfig {
            title,
            title_color: Color::Red,
            border_color: Color::Red,
            message: error_message,
            hint: (!hint.is_empty()).then_some(hint),
            max_width: 64,
        },
    );
}
