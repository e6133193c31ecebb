//! Question to widget dispatch
//!
//! `render_question` decides what a question looks like and which events
//! its widget can raise, without touching the terminal. Drawing happens in
//! `field_renderer`.

use crate::state::other_option::{decode_other, is_other_option, stored_matches};
use crate::state::{AnswerValue, FileAttachment, Question, QuestionKind, WidgetEventKind};

const TEXT_EVENTS: &[WidgetEventKind] = &[WidgetEventKind::ValueChanged];
const FILE_EVENTS: &[WidgetEventKind] = &[WidgetEventKind::FileAdded, WidgetEventKind::FileRemoved];
const NO_EVENTS: &[WidgetEventKind] = &[];

/// Everything needed to draw one question
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub question_id: String,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub error: Option<String>,
    pub kind: WidgetKind,
    pub events: &'static [WidgetEventKind],
}

/// One option of a choice widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub label: String,
    pub selected: bool,
    /// Free text of a selected "other" option
    pub other_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceStyle {
    Radio,
    Checkbox,
    Dropdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    TextInput {
        value: String,
        multiline: bool,
        placeholder: &'static str,
    },
    Choice {
        style: ChoiceStyle,
        options: Vec<ChoiceOption>,
    },
    Stars {
        value: u32,
        max: u32,
    },
    Scale {
        value: Option<i64>,
        min: i64,
        max: i64,
        min_label: Option<String>,
        max_label: Option<String>,
    },
    Slider {
        value: f64,
        min: f64,
        max: f64,
    },
    Checkbox {
        checked: bool,
        text: String,
    },
    FilePicker {
        files: Vec<FileAttachment>,
        accept: Vec<String>,
        max_size_mb: u64,
        multiple: bool,
    },
    Image {
        url: String,
        caption: Option<String>,
    },
}

/// Describe the widget for a question, or `None` for unknown types
pub fn render_question(
    question: &Question,
    value: &AnswerValue,
    error: Option<&str>,
) -> Option<WidgetSpec> {
    let text_input = |multiline, placeholder| WidgetKind::TextInput {
        value: value.as_text().to_string(),
        multiline,
        placeholder,
    };

    let (kind, events) = match &question.kind {
        QuestionKind::ShortText => (text_input(false, "Your answer"), TEXT_EVENTS),
        QuestionKind::Paragraph => (text_input(true, "Your answer"), TEXT_EVENTS),
        QuestionKind::Email => (text_input(false, "name@example.com"), TEXT_EVENTS),
        QuestionKind::Phone => (text_input(false, "0812345678"), TEXT_EVENTS),
        QuestionKind::Date => (text_input(false, "YYYY-MM-DD"), TEXT_EVENTS),
        QuestionKind::SingleChoice { options } => (
            choice(ChoiceStyle::Radio, options, &[value.as_text().to_string()]),
            TEXT_EVENTS,
        ),
        QuestionKind::Dropdown { options } => (
            choice(ChoiceStyle::Dropdown, options, &[value.as_text().to_string()]),
            TEXT_EVENTS,
        ),
        QuestionKind::MultiChoice { options } => (
            choice(ChoiceStyle::Checkbox, options, value.as_choices()),
            TEXT_EVENTS,
        ),
        QuestionKind::Rating { max } => (
            WidgetKind::Stars {
                value: value.as_number().map_or(0, |n| n.max(0.0) as u32),
                max: *max,
            },
            TEXT_EVENTS,
        ),
        QuestionKind::LinearScale {
            min,
            max,
            min_label,
            max_label,
        } => (
            WidgetKind::Scale {
                value: value.as_number().map(|n| n as i64),
                min: *min,
                max: *max,
                min_label: min_label.clone(),
                max_label: max_label.clone(),
            },
            TEXT_EVENTS,
        ),
        QuestionKind::Slider { min, max, .. } => (
            WidgetKind::Slider {
                value: value.as_number().unwrap_or(*min),
                min: *min,
                max: *max,
            },
            TEXT_EVENTS,
        ),
        QuestionKind::Consent { text } => (
            WidgetKind::Checkbox {
                checked: value.as_bool(),
                text: text.clone().unwrap_or_else(|| "I agree".to_string()),
            },
            TEXT_EVENTS,
        ),
        QuestionKind::File {
            accept,
            max_size_mb,
            multiple,
        } => (
            WidgetKind::FilePicker {
                files: value.files().to_vec(),
                accept: accept.clone(),
                max_size_mb: *max_size_mb,
                multiple: *multiple,
            },
            FILE_EVENTS,
        ),
        QuestionKind::Image { url, caption } => (
            WidgetKind::Image {
                url: url.clone(),
                caption: caption.clone(),
            },
            NO_EVENTS,
        ),
        QuestionKind::Unknown(tag) => {
            tracing::debug!("Skipping question {} with unknown type {tag}", question.id);
            return None;
        }
    };

    Some(WidgetSpec {
        question_id: question.id.clone(),
        label: question.label.clone(),
        description: question.description.clone(),
        required: question.required,
        error: error.map(str::to_string),
        kind,
        events,
    })
}

fn choice(style: ChoiceStyle, options: &[String], stored: &[String]) -> WidgetKind {
    let rendered = options
        .iter()
        .map(|option| {
            let matching = stored
                .iter()
                .find(|value| stored_matches(value, option, options));
            let other_text = matching
                .filter(|_| is_other_option(option))
                .and_then(|value| decode_other(value, options))
                .map(|selection| selection.text.to_string());
            ChoiceOption {
                label: option.clone(),
                selected: matching.is_some(),
                other_text,
            }
        })
        .collect();
    WidgetKind::Choice {
        style,
        options: rendered,
    }
}
