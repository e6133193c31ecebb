//! Field-level validation rules
//!
//! `validate` runs the full rule chain (first failure wins) and is used on
//! advance and on submission. `validate_live` only checks formats so that a
//! field does not complain about being empty while it is being typed into.

use super::answer::{AnswerValue, FileAttachment};
use crate::state::{Question, QuestionKind};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[689]\d{8}$").expect("valid mobile regex"));
static LANDLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[2-7]\d{7}$").expect("valid landline regex"));

const PHONE_MAX_DIGITS: usize = 10;
const PHONE_MIN_DIGITS: usize = 9;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Full validation: required-ness, formats, files, ranges
pub fn validate(question: &Question, value: &AnswerValue) -> Option<String> {
    if question.required && value.is_empty_for(&question.kind) {
        return Some(required_message(&question.kind).to_string());
    }

    match &question.kind {
        QuestionKind::Email => check_email(value.as_text()),
        QuestionKind::Phone => check_phone(value.as_text(), true),
        QuestionKind::File { .. } => validate_files(question, value),
        QuestionKind::Date => check_date(value.as_text()),
        QuestionKind::Rating { max } => check_range(value.as_number(), 1.0, f64::from(*max)),
        QuestionKind::Slider { min, max, .. } => check_range(value.as_number(), *min, *max),
        QuestionKind::LinearScale { min, max, .. } => {
            check_range(value.as_number(), *min as f64, *max as f64)
        }
        QuestionKind::ShortText
        | QuestionKind::Paragraph
        | QuestionKind::SingleChoice { .. }
        | QuestionKind::MultiChoice { .. }
        | QuestionKind::Dropdown { .. }
        | QuestionKind::Consent { .. }
        | QuestionKind::Image { .. }
        | QuestionKind::Unknown(_) => None,
    }
}

/// Format-only validation used while the user is typing
pub fn validate_live(question: &Question, value: &AnswerValue) -> Option<String> {
    match &question.kind {
        QuestionKind::Email => check_email(value.as_text()),
        QuestionKind::Phone => check_phone(value.as_text(), false),
        _ => None,
    }
}

/// Per-file size and type checks
pub fn validate_files(question: &Question, value: &AnswerValue) -> Option<String> {
    let QuestionKind::File {
        accept,
        max_size_mb,
        ..
    } = &question.kind
    else {
        return None;
    };

    let limit = max_size_mb.saturating_mul(BYTES_PER_MB);
    value.files().iter().find_map(|file| {
        if file.size > limit {
            Some(format!(
                "{} is larger than {} MB",
                file.filename, max_size_mb
            ))
        } else if !accept.is_empty() && !accepts(accept, file) {
            Some(format!(
                "{} is not an accepted file type ({})",
                file.filename,
                accept.join(", ")
            ))
        } else {
            None
        }
    })
}

fn required_message(kind: &QuestionKind) -> &'static str {
    match kind {
        QuestionKind::Consent { .. } => "Please accept to continue",
        QuestionKind::File { .. } => "Please attach a file",
        QuestionKind::SingleChoice { .. }
        | QuestionKind::MultiChoice { .. }
        | QuestionKind::Dropdown { .. } => "Please choose an option",
        QuestionKind::Rating { .. } | QuestionKind::LinearScale { .. } => "Please pick a rating",
        _ => "This field is required",
    }
}

fn check_email(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() || EMAIL_RE.is_match(text) {
        None
    } else {
        Some("Enter a valid email address".to_string())
    }
}

/// Thai phone numbers: trunk prefix 0, mobile 06/08/09 (10 digits) or
/// landline 02-07 (9 digits)
fn check_phone(text: &str, complete: bool) -> Option<String> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if digits.len() > PHONE_MAX_DIGITS {
        return Some("Phone number has too many digits".to_string());
    }
    if !digits.starts_with('0') {
        return Some("Phone number must start with 0".to_string());
    }
    if digits.len() >= PHONE_MIN_DIGITS {
        if MOBILE_RE.is_match(&digits) || LANDLINE_RE.is_match(&digits) {
            return None;
        }
        return Some("Enter a valid mobile or landline number".to_string());
    }
    if complete {
        return Some("Phone number is incomplete".to_string());
    }
    None
}

fn check_date(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() {
        None
    } else {
        Some("Enter a date as YYYY-MM-DD".to_string())
    }
}

fn check_range(value: Option<f64>, min: f64, max: f64) -> Option<String> {
    match value {
        Some(v) if v < min || v > max => Some(format!("Value must be between {min} and {max}")),
        _ => None,
    }
}

/// Match a file against entries like `.pdf`, `pdf`, `image/*` or `application/pdf`
fn accepts(accept: &[String], file: &FileAttachment) -> bool {
    let filename = file.filename.to_lowercase();
    let mime = file.mime_type.to_lowercase();
    accept.iter().any(|entry| {
        if let Some(prefix) = entry.strip_suffix("/*") {
            mime.starts_with(&format!("{prefix}/"))
        } else if entry.contains('/') {
            mime == *entry
        } else {
            let ext = entry.trim_start_matches('.');
            filename.ends_with(&format!(".{ext}"))
        }
    })
}
