//! The form page: visible questions plus navigation buttons

use super::field_renderer::{widget_lines, FieldView};
use super::question_renderer::render_question;
use crate::platform::{NEXT_SHORTCUT, PREV_SHORTCUT, RESUME_SHORTCUT, SUBMIT_SHORTCUT};
use crate::state::{AnswerValue, AppState, FormContext, Navigator};
use crate::ui::components::{button_width, render_button, BUTTON_HEIGHT};
use crate::ui::layout::accent_color;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Draw the current page of the loaded form
pub fn draw_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(form) = &state.form else {
        return;
    };
    let accent = accent_color(state);

    let block = Block::default()
        .title(format!(" {} ", page_title(form)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(BUTTON_HEIGHT)])
        .split(inner);

    let (lines, focused_range) = page_lines(state, form, chunks[0].width, accent);
    let scroll = scroll_offset(focused_range, chunks[0].height as usize);
    frame.render_widget(
        Paragraph::new(lines).scroll((scroll as u16, 0)),
        chunks[0],
    );

    draw_buttons(frame, chunks[1], form, accent);
}

/// Title of the page block: section title, step number or form title
pub fn page_title(form: &FormContext) -> String {
    match &form.navigator {
        Navigator::LinearSinglePage => form.definition().title.clone(),
        Navigator::StepWizard { .. } => {
            let (current, total) = form.navigator.progress();
            format!("Question {current} of {total}")
        }
        Navigator::SectionWizard { .. } => {
            let (current, total) = form.navigator.progress();
            match form.navigator.current_section().and_then(|s| s.title.clone()) {
                Some(title) => format!("{title} ({current}/{total})"),
                None => format!("Section {current} of {total}"),
            }
        }
    }
}

/// Lines of every visible question and the line range of the focused one
fn page_lines(
    state: &AppState,
    form: &FormContext,
    width: u16,
    accent: Color,
) -> (Vec<Line<'static>>, (usize, usize)) {
    let definition = form.definition();
    let focused = state.focused_question_id();
    let empty = AnswerValue::default();

    let mut lines = Vec::new();
    let mut focused_range = (0, 0);
    for id in state.visible_question_ids() {
        let Some(question) = definition.question(&id) else {
            continue;
        };
        let value = form.answer(&id).unwrap_or(&empty);
        let Some(spec) = render_question(question, value, form.errors().get(&id)) else {
            continue;
        };

        let interaction = state.interaction(&id);
        let is_focused = focused.as_deref() == Some(spec.question_id.as_str());
        let view = FieldView {
            is_focused,
            cursor: interaction.cursor,
            path_input: &interaction.path_input,
            accent,
            width,
        };

        let start = lines.len();
        lines.extend(widget_lines(&spec, &view));
        if is_focused {
            focused_range = (start, lines.len());
        }
        lines.push(Line::default());
    }
    (lines, focused_range)
}

/// First line to show so the focused question fits on screen
fn scroll_offset((start, end): (usize, usize), height: usize) -> usize {
    if height == 0 || end <= height {
        return 0;
    }
    (end - height).min(start)
}

fn draw_buttons(frame: &mut Frame, area: Rect, form: &FormContext, accent: Color) {
    let submit_label = form
        .definition()
        .display
        .submit_label
        .clone()
        .unwrap_or_else(|| "Submit".to_string());

    let mut buttons: Vec<(&str, String, bool, bool)> = Vec::new();
    match form.navigator.index() {
        None => buttons.push((SUBMIT_SHORTCUT, submit_label, true, true)),
        Some(index) => {
            buttons.push((PREV_SHORTCUT, "Back".to_string(), false, index > 0));
            if form.navigator.furthest().is_some_and(|f| f > index) {
                buttons.push((RESUME_SHORTCUT, "Resume".to_string(), false, true));
            }
            if form.navigator.is_last() {
                buttons.push((NEXT_SHORTCUT, submit_label, true, true));
            } else {
                buttons.push((NEXT_SHORTCUT, "Next".to_string(), true, true));
            }
        }
    }

    let mut constraints: Vec<Constraint> = buttons
        .iter()
        .map(|(shortcut, label, _, _)| Constraint::Length(button_width(shortcut, label)))
        .collect();
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .spacing(1)
        .split(area);

    for (i, (shortcut, label, is_primary, is_enabled)) in buttons.iter().enumerate() {
        render_button(
            frame,
            chunks[i],
            shortcut,
            label,
            *is_primary,
            *is_enabled,
            accent,
        );
    }
}
