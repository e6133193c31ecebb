//! Layout components (header, status bar)

use crate::platform::{
    NEXT_SHORTCUT, PASTE_SHORTCUT, PREV_SHORTCUT, RESUME_SHORTCUT, SUBMIT_SHORTCUT,
};
use crate::state::{AppState, FormContext, Navigator, QuestionKind, ToastKind, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::str::FromStr;

/// Header, content and status bar areas
pub fn create_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

/// Accent color requested by the definition, cyan otherwise
pub fn accent_color(state: &AppState) -> Color {
    state
        .form
        .as_ref()
        .and_then(|form| form.definition().display.accent_color.as_deref())
        .and_then(|color| Color::from_str(color).ok())
        .unwrap_or(Color::Cyan)
}

/// Draw the title line and progress
pub fn draw_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let accent = accent_color(state);
    let (title, description, progress) = match &state.form {
        Some(form) => {
            let definition = form.definition();
            (
                format!(" {} · {}", definition.kind.label(), definition.title),
                definition.description.clone().unwrap_or_default(),
                progress_text(form),
            )
        }
        None => (" hookform".to_string(), String::new(), String::new()),
    };

    let progress_width = progress.chars().count() as u16 + 1;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(progress_width)])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {description}"),
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(header, chunks[0]);
    frame.render_widget(
        Paragraph::new(progress).style(Style::default().fg(Color::Gray)),
        chunks[1],
    );
}

/// "Question 2/5", "Section 1/3" or "3/7 answered"
pub fn progress_text(form: &FormContext) -> String {
    let (current, total) = form.navigator.progress();
    match form.navigator {
        Navigator::StepWizard { .. } => format!("Question {current}/{total}"),
        Navigator::SectionWizard { .. } => format!("Section {current}/{total}"),
        Navigator::LinearSinglePage => {
            let inputs: Vec<_> = form
                .definition()
                .questions
                .iter()
                .filter(|q| !q.kind.is_display_only())
                .collect();
            let answered = inputs
                .iter()
                .filter(|q| {
                    form.answer(&q.id)
                        .is_some_and(|value| !value.is_empty_for(&q.kind))
                })
                .count();
            format!("{answered}/{} answered", inputs.len())
        }
    }
}

/// Draw the status bar: toast if any, otherwise key hints
pub fn draw_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let spans = match &state.toast {
        Some(toast) => {
            let color = match toast.kind {
                ToastKind::Info => Color::Blue,
                ToastKind::Success => Color::Green,
                ToastKind::Error => Color::Red,
            };
            vec![Span::styled(
                format!(" {} ", toast.message),
                Style::default().fg(Color::Black).bg(color),
            )]
        }
        None => vec![Span::styled(
            format!(" {}", view_hints(state)),
            Style::default().fg(Color::Gray),
        )],
    };

    let quit_hint = " ^C:quit ";
    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    let quit_width = quit_hint.len() as u16;
    if area.width > quit_width {
        let quit_area = Rect {
            x: area.x + area.width - quit_width,
            y: area.y,
            width: quit_width,
            height: 1,
        };
        let quit_widget =
            Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
        frame.render_widget(quit_widget, quit_area);
    }
}

/// Keyboard hints for the current view
pub fn view_hints(state: &AppState) -> String {
    match state.current_view {
        View::IdentifierPrompt => "Enter:load  Tab:form/quiz  Esc:quit".to_string(),
        View::Loading => "Loading…".to_string(),
        View::LoadFailed => "r:retry  e:change id  q:quit".to_string(),
        View::Submitting => "Submitting…".to_string(),
        View::Submitted => "n:new response  q:quit".to_string(),
        View::Form => form_hints(state),
    }
}

fn form_hints(state: &AppState) -> String {
    let Some(form) = &state.form else {
        return String::new();
    };
    let mut hints = vec!["Tab:field".to_string()];
    if !form.errors().is_empty() {
        hints.push(format!("{} to fix", form.errors().len()));
    }

    let focused_kind = state
        .focused_question_id()
        .and_then(|id| form.definition().question(&id).map(|q| q.kind.clone()));
    let widget_hint = match focused_kind {
        Some(QuestionKind::SingleChoice { .. } | QuestionKind::Dropdown { .. }) => {
            Some("↑↓:move  Space:select")
        }
        Some(QuestionKind::MultiChoice { .. }) => Some("↑↓:move  Space:toggle"),
        Some(
            QuestionKind::Rating { .. }
            | QuestionKind::LinearScale { .. }
            | QuestionKind::Slider { .. },
        ) => Some("←→/digits:set"),
        Some(QuestionKind::Consent { .. }) => Some("Space:toggle"),
        Some(QuestionKind::File { .. }) => Some("type path  Enter:attach  ^D:remove"),
        _ => None,
    };
    if let Some(hint) = widget_hint {
        hints.push(hint.to_string());
    }

    match form.navigator.index() {
        None => hints.push(format!("{SUBMIT_SHORTCUT}:submit")),
        Some(index) => {
            let next = if form.navigator.is_last() { "submit" } else { "next" };
            hints.push(format!("{NEXT_SHORTCUT}:{next}"));
            if index > 0 {
                hints.push(format!("{PREV_SHORTCUT}:back"));
            }
            if form.navigator.furthest().is_some_and(|f| f > index) {
                hints.push(format!("{RESUME_SHORTCUT}:resume"));
            }
        }
    }
    hints.push(format!("{PASTE_SHORTCUT}:paste"));
    hints.join("  ")
}
