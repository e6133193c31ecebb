//! Key handling for the focused question
//!
//! Keys are translated into widget events against the current answer; the
//! caller applies the event to the form context. Widget-local state that is
//! not part of the answer (highlighted option, path being typed) lives in
//! [`Interaction`].

use crate::state::other_option::{decode_other, encode_other, is_other_option, stored_matches};
use crate::state::{AnswerValue, FileAttachment, Interaction, Question, QuestionKind, WidgetEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::BaseDirs;
use std::path::PathBuf;

/// Translate a key for the focused question
///
/// `Ok(None)` means the key changed nothing in the answer. `Err` carries a
/// message for the user, e.g. a path that could not be attached.
pub fn question_input(
    question: &Question,
    value: &AnswerValue,
    key: KeyEvent,
    interaction: &mut Interaction,
) -> Result<Option<WidgetEvent>, String> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let event = match &question.kind {
        QuestionKind::ShortText | QuestionKind::Email => text_key(value, key, ctrl, |_| true),
        QuestionKind::Phone => text_key(value, key, ctrl, |c| {
            c.is_ascii_digit() || matches!(c, ' ' | '-' | '+')
        }),
        QuestionKind::Date => text_key(value, key, ctrl, |c| c.is_ascii_digit() || c == '-'),
        QuestionKind::Paragraph => match key.code {
            KeyCode::Enter => Some(value.with_char('\n')),
            _ => text_key(value, key, ctrl, |_| true),
        },
        QuestionKind::SingleChoice { options } | QuestionKind::Dropdown { options } => {
            single_choice_key(options, value, key, ctrl, interaction)
        }
        QuestionKind::MultiChoice { options } => {
            multi_choice_key(options, value, key, ctrl, interaction)
        }
        QuestionKind::Rating { max } => {
            number_key(value, key, 1.0, f64::from(*max), 1.0, true)
        }
        QuestionKind::LinearScale { min, max, .. } => {
            number_key(value, key, *min as f64, *max as f64, 1.0, true)
        }
        QuestionKind::Slider { min, max, step } => number_key(value, key, *min, *max, *step, false),
        QuestionKind::Consent { .. } => match key.code {
            KeyCode::Char(' ') | KeyCode::Enter if !ctrl => {
                Some(AnswerValue::Bool(!value.as_bool()))
            }
            _ => None,
        },
        QuestionKind::File { .. } => return file_key(value, key, ctrl, interaction),
        QuestionKind::Image { .. } | QuestionKind::Unknown(_) => None,
    };

    Ok(event.map(WidgetEvent::ValueChanged))
}

/// Insert pasted text into the focused question
pub fn paste_text(
    question: &Question,
    value: &AnswerValue,
    text: &str,
    interaction: &mut Interaction,
) -> Option<WidgetEvent> {
    let single_line = || text.replace(['\r', '\n'], " ").trim().to_string();
    let appended = |extra: &str| {
        let mut current = value.as_text().to_string();
        current.push_str(extra);
        AnswerValue::Text(current)
    };

    match &question.kind {
        QuestionKind::ShortText
        | QuestionKind::Email
        | QuestionKind::Phone
        | QuestionKind::Date => Some(WidgetEvent::ValueChanged(appended(&single_line()))),
        QuestionKind::Paragraph => Some(WidgetEvent::ValueChanged(appended(text))),
        QuestionKind::File { .. } => {
            interaction.path_input.push_str(&single_line());
            None
        }
        QuestionKind::SingleChoice { options } | QuestionKind::Dropdown { options } => {
            let selection = decode_other(value.as_text(), options)?;
            let text = format!("{}{}", selection.text, single_line());
            Some(WidgetEvent::ValueChanged(AnswerValue::Text(encode_other(
                selection.label,
                &text,
            ))))
        }
        QuestionKind::MultiChoice { .. }
        | QuestionKind::Rating { .. }
        | QuestionKind::LinearScale { .. }
        | QuestionKind::Slider { .. }
        | QuestionKind::Consent { .. }
        | QuestionKind::Image { .. }
        | QuestionKind::Unknown(_) => None,
    }
}

fn text_key(
    value: &AnswerValue,
    key: KeyEvent,
    ctrl: bool,
    accept: impl Fn(char) -> bool,
) -> Option<AnswerValue> {
    match key.code {
        KeyCode::Char(c) if !ctrl && accept(c) => Some(value.with_char(c)),
        KeyCode::Backspace if !value.as_text().is_empty() => Some(value.without_last_char()),
        _ => None,
    }
}

fn move_cursor(interaction: &mut Interaction, len: usize, code: KeyCode) -> bool {
    if len == 0 {
        return false;
    }
    match code {
        KeyCode::Up => {
            interaction.cursor = interaction.cursor.min(len - 1).saturating_sub(1);
            true
        }
        KeyCode::Down => {
            interaction.cursor = (interaction.cursor + 1).min(len - 1);
            true
        }
        _ => false,
    }
}

fn single_choice_key(
    options: &[String],
    value: &AnswerValue,
    key: KeyEvent,
    ctrl: bool,
    interaction: &mut Interaction,
) -> Option<AnswerValue> {
    if move_cursor(interaction, options.len(), key.code) || ctrl {
        return None;
    }
    let highlighted = options.get(interaction.cursor)?;
    let stored = value.as_text();

    // Typing into the revealed free-text field of a selected "other" option
    if let Some(selection) = decode_other(stored, options).filter(|s| s.label == highlighted) {
        let mut text = selection.text.to_string();
        match key.code {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => return None,
        }
        return Some(AnswerValue::Text(encode_other(selection.label, &text)));
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter if !stored_matches(stored, highlighted, options) => {
            Some(AnswerValue::Text(highlighted.clone()))
        }
        _ => None,
    }
}

fn multi_choice_key(
    options: &[String],
    value: &AnswerValue,
    key: KeyEvent,
    ctrl: bool,
    interaction: &mut Interaction,
) -> Option<AnswerValue> {
    if move_cursor(interaction, options.len(), key.code) || ctrl {
        return None;
    }
    let highlighted = options.get(interaction.cursor)?;
    let mut choices = value.as_choices().to_vec();
    let existing = choices
        .iter()
        .position(|stored| stored_matches(stored, highlighted, options));

    if let (Some(index), true) = (existing, is_other_option(highlighted)) {
        let mut text = decode_other(&choices[index], options)
            .map(|s| s.text.to_string())
            .unwrap_or_default();
        match key.code {
            KeyCode::Char(c) if c != ' ' || !text.is_empty() => text.push(c),
            KeyCode::Backspace if !text.is_empty() => {
                text.pop();
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                choices.remove(index);
                return Some(AnswerValue::Choices(choices));
            }
            _ => return None,
        }
        choices[index] = encode_other(highlighted, &text);
        return Some(AnswerValue::Choices(choices));
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => {
            match existing {
                Some(index) => {
                    choices.remove(index);
                }
                None => choices.push(highlighted.clone()),
            }
            Some(AnswerValue::Choices(choices))
        }
        _ => None,
    }
}

fn number_key(
    value: &AnswerValue,
    key: KeyEvent,
    min: f64,
    max: f64,
    step: f64,
    clearable: bool,
) -> Option<AnswerValue> {
    let current = value.as_number();
    let snap = |n: f64| {
        let snapped = min + ((n - min) / step).round() * step;
        snapped.clamp(min, max)
    };

    let next = match key.code {
        KeyCode::Right | KeyCode::Up => Some(current.map_or(min, |n| snap(n + step))),
        KeyCode::Left | KeyCode::Down => Some(current.map_or(min, |n| snap(n - step))),
        KeyCode::Home => Some(min),
        KeyCode::End => Some(max),
        KeyCode::Char(c) if c.is_ascii_digit() => {
            let digit = f64::from(c.to_digit(10)?);
            if (min..=max).contains(&digit) {
                Some(digit)
            } else {
                return None;
            }
        }
        KeyCode::Backspace | KeyCode::Delete if clearable => {
            return current.map(|_| AnswerValue::Number(None));
        }
        _ => return None,
    };

    (next != current).then_some(AnswerValue::Number(next))
}

fn file_key(
    value: &AnswerValue,
    key: KeyEvent,
    ctrl: bool,
    interaction: &mut Interaction,
) -> Result<Option<WidgetEvent>, String> {
    match key.code {
        KeyCode::Char('d') if ctrl => Ok(value
            .files()
            .len()
            .checked_sub(1)
            .map(WidgetEvent::FileRemoved)),
        KeyCode::Char(c) if !ctrl => {
            interaction.path_input.push(c);
            Ok(None)
        }
        KeyCode::Backspace => {
            interaction.path_input.pop();
            Ok(None)
        }
        KeyCode::Enter => {
            let typed = interaction.path_input.trim();
            if typed.is_empty() {
                return Ok(None);
            }
            let path = expand_path(typed);
            match FileAttachment::from_path(&path) {
                Ok(file) => {
                    interaction.path_input.clear();
                    Ok(Some(WidgetEvent::FileAdded(file)))
                }
                Err(e) => Err(format!("Cannot attach {}: {e}", path.display())),
            }
        }
        _ => Ok(None),
    }
}

/// Undo shell quoting from drag-and-drop and expand a leading `~`
fn expand_path(typed: &str) -> PathBuf {
    let unquoted = typed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| typed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(typed);

    if let Some(rest) = unquoted.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(unquoted)
}
