//! Button component for TUI

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Button height in rows (top border + content + bottom border)
pub const BUTTON_HEIGHT: u16 = 3;

/// Render a bordered button showing its shortcut and label
pub fn render_button(
    frame: &mut Frame,
    area: Rect,
    shortcut: &str,
    label: &str,
    is_primary: bool,
    is_enabled: bool,
    accent: Color,
) {
    let border_style = if is_primary && is_enabled {
        Style::default().fg(accent)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let text_style = if !is_enabled {
        Style::default().fg(Color::DarkGray)
    } else if is_primary {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let paragraph = Paragraph::new(format!(" {shortcut} {label} ")).style(text_style);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(paragraph.block(block), area);
}

/// Width a button needs, borders included
pub fn button_width(shortcut: &str, label: &str) -> u16 {
    (shortcut.chars().count() + label.chars().count() + 5) as u16
}
