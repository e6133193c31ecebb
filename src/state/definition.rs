//! Form and quiz definitions as served by the fetch webhook
//!
//! Definitions usually originate from a spreadsheet row that a workflow
//! engine reshapes into JSON, so the parser is deliberately tolerant: field
//! names come in several spellings, numbers and booleans may arrive as
//! strings, and the definition itself may be wrapped in an envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Which webhook family a definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefinitionKind {
    #[default]
    Form,
    Quiz,
}

impl DefinitionKind {
    /// Key carrying the identifier in fetch requests and submissions
    pub fn id_key(&self) -> &'static str {
        match self {
            Self::Form => "form_id",
            Self::Quiz => "quizid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Form => "Form",
            Self::Quiz => "Quiz",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Form => Self::Quiz,
            Self::Quiz => Self::Form,
        }
    }
}

/// Requested presentation of the questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    SinglePage,
    Step,
    Section,
}

impl Layout {
    fn parse(value: &str) -> Option<Self> {
        match normalize_tag(value).as_str() {
            "single" | "single_page" | "page" | "full" | "full_page" | "all" => {
                Some(Self::SinglePage)
            }
            "step" | "steps" | "wizard" | "one_by_one" | "question" => Some(Self::Step),
            "section" | "sections" => Some(Self::Section),
            _ => None,
        }
    }
}

/// Display and branding options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayOptions {
    pub layout: Option<Layout>,
    pub submit_label: Option<String>,
    pub success_message: Option<String>,
    pub accent_color: Option<String>,
}

/// Routing hints forwarded verbatim to the submission webhook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingOptions {
    pub success_redirect: Option<String>,
    pub notify_emails: Vec<String>,
    pub slack_channel_id: Option<String>,
    pub log_sheet: Option<String>,
    pub storage_folder: Option<String>,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
}

/// Question type with its type-specific constraints
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    ShortText,
    Paragraph,
    Email,
    Phone,
    SingleChoice {
        options: Vec<String>,
    },
    MultiChoice {
        options: Vec<String>,
    },
    Dropdown {
        options: Vec<String>,
    },
    Rating {
        max: u32,
    },
    Date,
    File {
        accept: Vec<String>,
        max_size_mb: u64,
        multiple: bool,
    },
    Slider {
        min: f64,
        max: f64,
        step: f64,
    },
    Consent {
        text: Option<String>,
    },
    Image {
        url: String,
        caption: Option<String>,
    },
    LinearScale {
        min: i64,
        max: i64,
        min_label: Option<String>,
        max_label: Option<String>,
    },
    /// A type tag this client does not know; rendered as nothing
    Unknown(String),
}

pub const DEFAULT_RATING_MAX: u32 = 5;
/// Upper bound for star ratings
pub const MAX_RATING: u32 = 10;
/// Most points a linear scale may have
pub const MAX_SCALE_POINTS: i64 = 11;
pub const DEFAULT_MAX_FILE_MB: u64 = 10;

impl QuestionKind {
    /// Canonical type tag, used for logging
    pub fn tag(&self) -> &str {
        match self {
            Self::ShortText => "short_text",
            Self::Paragraph => "paragraph",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::SingleChoice { .. } => "single_choice",
            Self::MultiChoice { .. } => "multi_choice",
            Self::Dropdown { .. } => "dropdown",
            Self::Rating { .. } => "rating",
            Self::Date => "date",
            Self::File { .. } => "file",
            Self::Slider { .. } => "slider",
            Self::Consent { .. } => "consent",
            Self::Image { .. } => "image",
            Self::LinearScale { .. } => "linear_scale",
            Self::Unknown(tag) => tag,
        }
    }

    /// Choice options, empty for non-choice kinds
    pub fn options(&self) -> &[String] {
        match self {
            Self::SingleChoice { options }
            | Self::MultiChoice { options }
            | Self::Dropdown { options } => options,
            _ => &[],
        }
    }

    /// Kinds that collect no input
    pub fn is_display_only(&self) -> bool {
        matches!(self, Self::Image { .. } | Self::Unknown(_))
    }

    fn from_object(tag: &str, obj: &Map<String, Value>) -> Self {
        match normalize_tag(tag).as_str() {
            "short_text" | "text" | "short_answer" | "shorttext" | "input" => Self::ShortText,
            "paragraph" | "long_text" | "textarea" | "long_answer" => Self::Paragraph,
            "email" => Self::Email,
            "phone" | "tel" | "telephone" | "phone_number" => Self::Phone,
            "single_choice" | "radio" | "multiple_choice" | "choice" => Self::SingleChoice {
                options: options_field(obj),
            },
            "multi_choice" | "checkbox" | "checkboxes" | "multi_select" => Self::MultiChoice {
                options: options_field(obj),
            },
            "dropdown" | "select" => Self::Dropdown {
                options: options_field(obj),
            },
            "rating" | "star_rating" | "stars" | "star" => Self::Rating {
                max: num_field(obj, &["maxRating", "max_rating", "max"])
                    .filter(|m| *m >= 1.0)
                    .map(|m| (m as u32).min(MAX_RATING))
                    .unwrap_or(DEFAULT_RATING_MAX),
            },
            "date" => Self::Date,
            "file" | "file_upload" | "upload" | "attachment" => Self::File {
                accept: list_field(obj, &["accept", "accepted_types", "acceptedTypes", "fileTypes"])
                    .into_iter()
                    .map(|t| t.to_lowercase())
                    .collect(),
                max_size_mb: num_field(obj, &["maxSize", "max_size", "maxFileSize"])
                    .filter(|m| *m > 0.0)
                    .map(|m| m as u64)
                    .unwrap_or(DEFAULT_MAX_FILE_MB),
                multiple: bool_field(obj, &["multiple", "allowMultiple", "allow_multiple"])
                    .unwrap_or(false),
            },
            "slider" | "range" | "number_slider" | "numeric_slider" => {
                let min = num_field(obj, &["min"]).unwrap_or(0.0);
                let max = num_field(obj, &["max"]).unwrap_or(100.0).max(min);
                let step = num_field(obj, &["step"]).filter(|s| *s > 0.0).unwrap_or(1.0);
                Self::Slider { min, max, step }
            }
            "consent" | "agreement" | "checkbox_consent" | "terms" => Self::Consent {
                text: str_field(obj, &["consentText", "consent_text", "text"]),
            },
            "image" | "static_image" | "picture" => Self::Image {
                url: str_field(obj, &["imageUrl", "image_url", "url", "src"]).unwrap_or_default(),
                caption: str_field(obj, &["caption", "alt"]),
            },
            "linear_scale" | "scale" => {
                let min = num_field(obj, &["min"]).map(|m| m as i64).unwrap_or(1);
                let max = num_field(obj, &["max"])
                    .map(|m| m as i64)
                    .unwrap_or(5)
                    .clamp(min, min.saturating_add(MAX_SCALE_POINTS - 1));
                Self::LinearScale {
                    min,
                    max,
                    min_label: str_field(obj, &["minLabel", "min_label"]),
                    max_label: str_field(obj, &["maxLabel", "max_label"]),
                }
            }
            _ => Self::Unknown(tag.to_string()),
        }
    }
}

/// One schema entry
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub section: Option<String>,
    pub kind: QuestionKind,
    /// The question exactly as received
    pub raw: Value,
}

impl Question {
    fn from_value(position: usize, raw: Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let tag = str_field(obj, &["type", "question_type", "questionType", "kind"])
            .unwrap_or_else(|| "short_text".to_string());
        let kind = QuestionKind::from_object(&tag, obj);
        let id = str_field(obj, &["id", "question_id", "questionId", "key", "name"])
            .unwrap_or_else(|| format!("q{}", position + 1));
        let label = str_field(obj, &["label", "title", "question", "text"])
            .unwrap_or_else(|| id.clone());

        Some(Self {
            label,
            description: str_field(obj, &["description", "help", "helpText", "help_text"]),
            required: bool_field(obj, &["required", "isRequired", "is_required"]).unwrap_or(false),
            section: str_field(obj, &["section", "section_title", "sectionTitle", "page"]),
            kind,
            id,
            raw: raw.clone(),
        })
    }
}

/// A fetched form or quiz
#[derive(Debug, Clone, PartialEq)]
pub struct FormDefinition {
    pub id: String,
    pub kind: DefinitionKind,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub display: DisplayOptions,
    pub routing: RoutingOptions,
}

impl FormDefinition {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn has_sections(&self) -> bool {
        self.questions.iter().any(|q| q.section.is_some())
    }
}

/// Why a fetch response could not be used as a definition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),
    #[error("response does not contain a definition object")]
    NotAnObject,
    #[error("definition has no questions")]
    NoQuestions,
    #[error("questions field is malformed: {0}")]
    MalformedQuestions(String),
}

/// Keys under which the workflow engine may nest the definition
const ENVELOPE_KEYS: &[&str] = &["data", "form", "quiz", "items", "result", "json"];
const MAX_ENVELOPE_DEPTH: usize = 4;

/// Parse a fetch response into a definition
pub fn parse_definition(
    kind: DefinitionKind,
    id: &str,
    response: Value,
) -> Result<FormDefinition, DefinitionError> {
    let obj = unwrap_envelope(response, 0).ok_or(DefinitionError::NotAnObject)?;

    let raw_questions = match obj.get("questions") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(encoded)) if encoded.trim().is_empty() => Vec::new(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                return Err(DefinitionError::MalformedQuestions(
                    "expected a list".to_string(),
                ))
            }
            Err(e) => return Err(DefinitionError::MalformedQuestions(e.to_string())),
        },
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            return Err(DefinitionError::MalformedQuestions(
                "expected a list".to_string(),
            ))
        }
    };

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(raw_questions.len());
    for (position, raw) in raw_questions.into_iter().enumerate() {
        let Some(mut question) = Question::from_value(position, raw) else {
            tracing::warn!("Skipping non-object question at position {position}");
            continue;
        };
        if !seen.insert(question.id.clone()) {
            let mut n = 2;
            while seen.contains(&format!("{}_{n}", question.id)) {
                n += 1;
            }
            question.id = format!("{}_{n}", question.id);
            seen.insert(question.id.clone());
        }
        questions.push(question);
    }

    if questions.is_empty() {
        return Err(DefinitionError::NoQuestions);
    }

    let display = DisplayOptions {
        layout: lookup_str(&obj, &["layout", "mode", "display_mode", "displayMode"])
            .and_then(|l| Layout::parse(&l)),
        submit_label: lookup_str(&obj, &["submit_label", "submitLabel", "submitText"]),
        success_message: lookup_str(
            &obj,
            &["success_message", "successMessage", "thankYouMessage"],
        ),
        accent_color: lookup_str(&obj, &["accent_color", "theme_color", "primaryColor"]),
    };

    let routing = RoutingOptions {
        success_redirect: lookup_str(
            &obj,
            &["success_redirect", "redirect_url", "redirectUrl", "redirect"],
        ),
        notify_emails: lookup_list(
            &obj,
            &["notify_emails", "notification_emails", "notifyEmails", "emails"],
        ),
        slack_channel_id: lookup_str(
            &obj,
            &["slack_channel_id", "slackChannelId", "slack_channel"],
        ),
        log_sheet: lookup_str(&obj, &["log_sheet", "logSheet", "sheet_id", "sheetId"]),
        storage_folder: lookup_str(
            &obj,
            &["storage_folder", "drive_folder_id", "folder_id", "folderId"],
        ),
        sender_email: lookup_str(&obj, &["sender_email", "senderEmail"]),
        sender_name: lookup_str(&obj, &["sender_name", "senderName"]),
    };

    Ok(FormDefinition {
        id: id.to_string(),
        kind,
        title: str_field(&obj, &["title", "name", "form_title", "quiz_title"])
            .unwrap_or_else(|| id.to_string()),
        description: str_field(&obj, &["description", "subtitle"]),
        questions,
        display,
        routing,
    })
}

fn unwrap_envelope(value: Value, depth: usize) -> Option<Map<String, Value>> {
    if depth > MAX_ENVELOPE_DEPTH {
        return None;
    }
    match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .and_then(|first| unwrap_envelope(first, depth + 1)),
        Value::Object(mut map) => {
            if map.contains_key("questions") {
                return Some(map);
            }
            let nested = ENVELOPE_KEYS
                .iter()
                .find(|key| matches!(map.get(**key), Some(Value::Object(_) | Value::Array(_))));
            match nested.and_then(|key| map.remove(*key)) {
                Some(inner) => unwrap_envelope(inner, depth + 1),
                None => Some(map),
            }
        }
        Value::String(encoded) => serde_json::from_str(&encoded)
            .ok()
            .and_then(|inner| unwrap_envelope(inner, depth + 1)),
        _ => None,
    }
}

/// Lowercase, with `-` and spaces folded to `_`
fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn num_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn bool_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// A list given either as a JSON array or a comma/newline separated string
fn list_field(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let Some(value) = keys.iter().find_map(|key| obj.get(*key)) else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Object(o) => str_field(o, &["label", "value", "text"]),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => {
            let separator = if s.contains('\n') { '\n' } else { ',' };
            s.split(separator)
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        }
        _ => Vec::new(),
    }
}

fn options_field(obj: &Map<String, Value>) -> Vec<String> {
    list_field(obj, &["options", "choices"])
}

/// Top-level key first, then the same key inside a `settings` object
fn lookup_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    str_field(obj, keys).or_else(|| {
        obj.get("settings")
            .and_then(Value::as_object)
            .and_then(|settings| str_field(settings, keys))
    })
}

fn lookup_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let top = list_field(obj, keys);
    if !top.is_empty() {
        return top;
    }
    obj.get("settings")
        .and_then(Value::as_object)
        .map(|settings| list_field(settings, keys))
        .unwrap_or_default()
}

/// Build a definition from a question list, for tests
#[cfg(test)]
pub fn test_definition(kind: DefinitionKind, questions: Value) -> FormDefinition {
    parse_definition(
        kind,
        "test-form",
        serde_json::json!({ "title": "Test", "questions": questions }),
    )
    .expect("test definition should parse")
}
