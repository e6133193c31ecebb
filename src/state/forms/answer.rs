//! Answer values and file attachments

use crate::state::QuestionKind;
use std::io;
use std::path::{Path, PathBuf};

/// A local file selected for upload
///
/// Content is only read when the submission payload is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub path: PathBuf,
}

impl FileAttachment {
    /// Inspect a file on disk
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }
        if metadata.len() == 0 {
            return Err(empty_file_error());
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            filename,
            mime_type,
            size: metadata.len(),
            path: path.to_path_buf(),
        })
    }

    /// Human readable size
    pub fn display_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * 1024;
        match self.size {
            s if s >= MB => format!("{:.1} MB", s as f64 / MB as f64),
            s if s >= KB => format!("{:.1} KB", s as f64 / KB as f64),
            s => format!("{s} B"),
        }
    }
}

/// The user-supplied value for one question
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
    Number(Option<f64>),
    Bool(bool),
    Files(Vec<FileAttachment>),
}

impl Default for AnswerValue {
    fn default() -> Self {
        AnswerValue::Text(String::new())
    }
}

impl AnswerValue {
    /// The empty value a freshly loaded question starts with
    pub fn default_for(kind: &QuestionKind) -> Self {
        match kind {
            QuestionKind::ShortText
            | QuestionKind::Paragraph
            | QuestionKind::Email
            | QuestionKind::Phone
            | QuestionKind::SingleChoice { .. }
            | QuestionKind::Dropdown { .. }
            | QuestionKind::Date
            | QuestionKind::Image { .. }
            | QuestionKind::Unknown(_) => AnswerValue::Text(String::new()),
            QuestionKind::MultiChoice { .. } => AnswerValue::Choices(Vec::new()),
            QuestionKind::Rating { .. } | QuestionKind::LinearScale { .. } => {
                AnswerValue::Number(None)
            }
            QuestionKind::Slider { min, .. } => AnswerValue::Number(Some(*min)),
            QuestionKind::Consent { .. } => AnswerValue::Bool(false),
            QuestionKind::File { .. } => AnswerValue::Files(Vec::new()),
        }
    }

    /// Whether this value fails the required-ness check for `kind`
    pub fn is_empty_for(&self, kind: &QuestionKind) -> bool {
        match kind {
            QuestionKind::Image { .. } | QuestionKind::Unknown(_) => false,
            QuestionKind::ShortText
            | QuestionKind::Paragraph
            | QuestionKind::Email
            | QuestionKind::Phone
            | QuestionKind::SingleChoice { .. }
            | QuestionKind::Dropdown { .. }
            | QuestionKind::Date => self.as_text().trim().is_empty(),
            QuestionKind::MultiChoice { .. } => self.as_choices().is_empty(),
            QuestionKind::Rating { .. } => !matches!(self.as_number(), Some(n) if n > 0.0),
            QuestionKind::LinearScale { .. } | QuestionKind::Slider { .. } => {
                self.as_number().is_none()
            }
            QuestionKind::Consent { .. } => !self.as_bool(),
            QuestionKind::File { .. } => self.files().is_empty(),
        }
    }

    /// Text value (empty for non-text values)
    pub fn as_text(&self) -> &str {
        match self {
            AnswerValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn as_choices(&self) -> &[String] {
        match self {
            AnswerValue::Choices(c) => c,
            _ => &[],
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => *n,
            _ => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, AnswerValue::Bool(true))
    }

    pub fn files(&self) -> &[FileAttachment] {
        match self {
            AnswerValue::Files(f) => f,
            _ => &[],
        }
    }

    /// Copy of a text value with `c` appended
    pub fn with_char(&self, c: char) -> Self {
        let mut text = self.as_text().to_string();
        text.push(c);
        AnswerValue::Text(text)
    }

    /// Copy of a text value with the last character removed
    pub fn without_last_char(&self) -> Self {
        let mut text = self.as_text().to_string();
        text.pop();
        AnswerValue::Text(text)
    }
}

/// Attachments must carry content
pub fn empty_file_error() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "file is empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file(size: u64) -> FileAttachment {
        FileAttachment {
            filename: "a.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size,
            path: PathBuf::from("a.pdf"),
        }
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_every_kind_starts_empty_unless_it_has_a_resting_value() {
            let kinds = [
                QuestionKind::ShortText,
                QuestionKind::Paragraph,
                QuestionKind::Email,
                QuestionKind::Phone,
                QuestionKind::SingleChoice { options: vec![] },
                QuestionKind::MultiChoice { options: vec![] },
                QuestionKind::Dropdown { options: vec![] },
                QuestionKind::Rating { max: 5 },
                QuestionKind::Date,
                QuestionKind::File {
                    accept: vec![],
                    max_size_mb: 1,
                    multiple: false,
                },
                QuestionKind::Consent { text: None },
                QuestionKind::LinearScale {
                    min: 1,
                    max: 5,
                    min_label: None,
                    max_label: None,
                },
            ];
            for kind in kinds {
                assert!(
                    AnswerValue::default_for(&kind).is_empty_for(&kind),
                    "{} should start empty",
                    kind.tag()
                );
            }
        }

        #[test]
        fn test_slider_rests_at_min() {
            let kind = QuestionKind::Slider {
                min: 10.0,
                max: 20.0,
                step: 1.0,
            };
            let value = AnswerValue::default_for(&kind);
            assert_eq!(value, AnswerValue::Number(Some(10.0)));
            assert!(!value.is_empty_for(&kind));
        }

        #[test]
        fn test_display_only_never_empty() {
            let kind = QuestionKind::Image {
                url: "x".to_string(),
                caption: None,
            };
            assert!(!AnswerValue::default_for(&kind).is_empty_for(&kind));
        }
    }

    mod emptiness {
        use super::*;

        #[test]
        fn test_whitespace_text_is_empty() {
            assert!(AnswerValue::Text("  ".to_string()).is_empty_for(&QuestionKind::ShortText));
            assert!(!AnswerValue::Text("a".to_string()).is_empty_for(&QuestionKind::ShortText));
        }

        #[test]
        fn test_zero_rating_is_empty() {
            let kind = QuestionKind::Rating { max: 5 };
            assert!(AnswerValue::Number(Some(0.0)).is_empty_for(&kind));
            assert!(!AnswerValue::Number(Some(3.0)).is_empty_for(&kind));
        }

        #[test]
        fn test_consent_must_be_true() {
            let kind = QuestionKind::Consent { text: None };
            assert!(AnswerValue::Bool(false).is_empty_for(&kind));
            assert!(!AnswerValue::Bool(true).is_empty_for(&kind));
        }

        #[test]
        fn test_files_and_choices() {
            let file_kind = QuestionKind::File {
                accept: vec![],
                max_size_mb: 1,
                multiple: true,
            };
            assert!(!AnswerValue::Files(vec![file(1)]).is_empty_for(&file_kind));
            let multi = QuestionKind::MultiChoice {
                options: vec!["a".to_string()],
            };
            assert!(!AnswerValue::Choices(vec!["a".to_string()]).is_empty_for(&multi));
        }

        #[test]
        fn test_mismatched_variant_is_empty() {
            assert!(AnswerValue::Bool(true).is_empty_for(&QuestionKind::Email));
        }
    }

    mod editing {
        use super::*;

        #[test]
        fn test_with_char_and_without_last_char() {
            let value = AnswerValue::Text("ab".to_string()).with_char('c');
            assert_eq!(value.as_text(), "abc");
            assert_eq!(value.without_last_char().as_text(), "ab");
            assert_eq!(AnswerValue::Text(String::new()).without_last_char().as_text(), "");
        }
    }

    mod attachments {
        use super::*;

        #[test]
        fn test_from_path_reads_metadata() {
            let mut tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
            tmp.write_all(&[1, 2, 3, 4]).unwrap();
            let attachment = FileAttachment::from_path(tmp.path()).unwrap();
            assert_eq!(attachment.size, 4);
            assert_eq!(attachment.mime_type, "image/png");
            assert!(attachment.filename.ends_with(".png"));
        }

        #[test]
        fn test_from_path_rejects_directories() {
            let dir = tempfile::tempdir().unwrap();
            assert!(FileAttachment::from_path(dir.path()).is_err());
        }

        #[test]
        fn test_from_path_rejects_empty_files() {
            let tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
            let err = FileAttachment::from_path(tmp.path()).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidData);
            assert_eq!(err.to_string(), "file is empty");
        }

        #[test]
        fn test_display_size() {
            assert_eq!(file(512).display_size(), "512 B");
            assert_eq!(file(2048).display_size(), "2.0 KB");
            assert_eq!(file(5 * 1024 * 1024).display_size(), "5.0 MB");
        }
    }
}
