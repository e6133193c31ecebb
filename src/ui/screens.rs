//! Screens around the form: identifier prompt, loading, errors, thanks

use crate::state::{AppState, DefinitionKind};
use crate::ui::components::{render_dialog, render_error_dialog, DialogConfig};
use crate::ui::layout::accent_color;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const DEFAULT_SUCCESS: &str = "Thanks! Your response has been recorded.";

/// Ask which form or quiz to load
pub fn draw_identifier_prompt(frame: &mut Frame, area: Rect, state: &AppState) {
    let width = area.width.min(56);
    let prompt_area = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height.saturating_sub(9) / 2,
        width,
        height: area.height.min(9),
    };

    let block = Block::default()
        .title(" Open ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(prompt_area);
    frame.render_widget(block, prompt_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Kind selector
            Constraint::Length(3), // Identifier input
            Constraint::Min(0),    // Hint
        ])
        .margin(1)
        .split(inner);

    let kind_span = |kind: DefinitionKind| {
        let style = if state.kind == kind {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(format!(" {} ", kind.label()), style)
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            kind_span(DefinitionKind::Form),
            Span::raw(" "),
            kind_span(DefinitionKind::Quiz),
        ])),
        chunks[0],
    );

    let input = Paragraph::new(format!("{}▌", state.identifier)).block(
        Block::default()
            .title(format!(" {} id ", state.kind.label()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(input, chunks[1]);

    frame.render_widget(
        Paragraph::new("Tab switches form/quiz, Enter loads")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

/// Spinner-less loading notice
pub fn draw_loading(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = format!("Loading {} {}…", state.kind.label().to_lowercase(), state.identifier);
    let y = area.y + area.height / 2;
    let line_area = Rect {
        x: area.x,
        y,
        width: area.width,
        height: area.height.min(1),
    };
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow)),
        line_area,
    );
}

/// The definition could not be fetched or understood
pub fn draw_load_failed(frame: &mut Frame, state: &AppState) {
    let message = state
        .load_error
        .as_deref()
        .unwrap_or("The form could not be loaded");
    render_error_dialog(
        frame,
        "Could not load",
        message,
        &[("r", "retry"), ("e", "change id"), ("q", "quit")],
    );
}

/// Overlay shown while the submission is in flight
pub fn draw_submitting(frame: &mut Frame) {
    render_dialog(
        frame,
        DialogConfig {
            title: "Submitting",
            title_color: Color::Yellow,
            border_color: Color::Yellow,
            message: "Sending your answers…",
            hint: None,
            max_width: 40,
        },
    );
}

/// Confirmation after a successful submission
pub fn draw_submitted(frame: &mut Frame, area: Rect, state: &AppState) {
    let accent = accent_color(state);
    let message = state
        .form
        .as_ref()
        .and_then(|form| form.definition().display.success_message.clone())
        .unwrap_or_else(|| DEFAULT_SUCCESS.to_string());

    let key_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled(
            "✓ Submitted",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(message),
        Line::default(),
        Line::from(vec![
            Span::styled("n", key_style),
            Span::raw(" new response  "),
            Span::styled("q", key_style),
            Span::raw(" quit"),
        ]),
    ];

    let top = area.y + area.height.saturating_sub(lines.len() as u16) / 2;
    let body_area = Rect {
        x: area.x,
        y: top,
        width: area.width,
        height: area.height.saturating_sub(top - area.y),
    };
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        body_area,
    );
}
