//! Submission payload assembly
//!
//! Files are read and base64-encoded here, concurrently, right before the
//! payload is posted. Everything else is copied from the form context.

use crate::state::{
    empty_file_error, AnswerValue, DefinitionKind, FileAttachment, FormContext, QuestionKind,
};
use crate::webhook::SubmitError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::task::JoinSet;
use uuid::Uuid;

/// A file as the receiving workflow expects it
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EncodedFile {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    /// Standard base64 of the file content
    pub data: String,
}

/// One answer in the outgoing payload
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Value(Value),
    File(EncodedFile),
    Files(Vec<EncodedFile>),
}

/// Body posted to the submission webhook
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub submission_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quizid: Option<String>,
    pub title: String,
    pub answers: BTreeMap<String, SubmittedAnswer>,
    /// Questions exactly as fetched, for downstream type interpretation
    pub questions: Vec<Value>,
    pub notify_emails: Vec<String>,
    pub slack_channel_id: Option<String>,
    pub log_sheet: Option<String>,
    pub storage_folder: Option<String>,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

type FileKey = (String, usize);

/// Build the payload for the current answers
pub async fn build_payload(ctx: &FormContext) -> Result<SubmissionPayload, SubmitError> {
    let definition = ctx.definition();
    let mut encoded = encode_files(ctx).await?;

    let mut answers = BTreeMap::new();
    for question in &definition.questions {
        let Some(value) = ctx.answer(&question.id) else {
            continue;
        };
        let answer = match (&question.kind, value) {
            (QuestionKind::File { multiple, .. }, AnswerValue::Files(files)) => {
                let mut list: Vec<EncodedFile> = (0..files.len())
                    .filter_map(|index| encoded.remove(&(question.id.clone(), index)))
                    .collect();
                if *multiple {
                    SubmittedAnswer::Files(list)
                } else if list.is_empty() {
                    SubmittedAnswer::Value(Value::Null)
                } else {
                    SubmittedAnswer::File(list.remove(0))
                }
            }
            (_, value) => SubmittedAnswer::Value(answer_to_json(value)),
        };
        answers.insert(question.id.clone(), answer);
    }

    let (form_id, quizid) = match definition.kind {
        DefinitionKind::Form => (Some(definition.id.clone()), None),
        DefinitionKind::Quiz => (None, Some(definition.id.clone())),
    };
    let routing = &definition.routing;

    Ok(SubmissionPayload {
        submission_id: Uuid::new_v4(),
        form_id,
        quizid,
        title: definition.title.clone(),
        answers,
        questions: definition.questions.iter().map(|q| q.raw.clone()).collect(),
        notify_emails: routing.notify_emails.clone(),
        slack_channel_id: routing.slack_channel_id.clone(),
        log_sheet: routing.log_sheet.clone(),
        storage_folder: routing.storage_folder.clone(),
        sender_email: routing.sender_email.clone(),
        sender_name: routing.sender_name.clone(),
        submitted_at: Utc::now(),
    })
}

/// JSON form of a non-file answer
pub fn answer_to_json(value: &AnswerValue) -> Value {
    match value {
        AnswerValue::Text(text) => Value::String(text.clone()),
        AnswerValue::Choices(choices) => {
            Value::Array(choices.iter().cloned().map(Value::String).collect())
        }
        AnswerValue::Number(None) => Value::Null,
        AnswerValue::Number(Some(n)) => number_to_json(*n),
        AnswerValue::Bool(b) => Value::Bool(*b),
        AnswerValue::Files(files) => Value::Array(
            files
                .iter()
                .map(|f| Value::String(f.filename.clone()))
                .collect(),
        ),
    }
}

/// Whole numbers are sent as integers
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Read and encode every attached file as a batch of independent tasks
async fn encode_files(ctx: &FormContext) -> Result<HashMap<FileKey, EncodedFile>, SubmitError> {
    let mut tasks = JoinSet::new();
    for (question_id, value) in ctx.answers() {
        for (index, file) in value.files().iter().enumerate() {
            let key = (question_id.clone(), index);
            let file = file.clone();
            tasks.spawn(async move { encode_file(file).await.map(|encoded| (key, encoded)) });
        }
    }

    let mut encoded = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (key, file) = joined.map_err(|e| SubmitError::Task(e.to_string()))??;
        encoded.insert(key, file);
    }
    if !encoded.is_empty() {
        tracing::debug!("Encoded {} attachments", encoded.len());
    }
    Ok(encoded)
}

async fn encode_file(file: FileAttachment) -> Result<EncodedFile, SubmitError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| SubmitError::Encoding {
            filename: file.filename.clone(),
            source,
        })?;
    if bytes.is_empty() {
        return Err(SubmitError::Encoding {
            filename: file.filename,
            source: empty_file_error(),
        });
    }
    Ok(EncodedFile {
        size: bytes.len() as u64,
        data: STANDARD.encode(&bytes),
        filename: file.filename,
        mime_type: file.mime_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{test_definition, WidgetEvent};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> FileAttachment {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        FileAttachment::from_path(&path).unwrap()
    }

    fn context(kind: DefinitionKind) -> FormContext {
        FormContext::new(test_definition(
            kind,
            json!([
                { "id": "name", "type": "text" },
                { "id": "colors", "type": "checkbox", "options": ["Red", "Blue"] },
                { "id": "stars", "type": "rating" },
                { "id": "agree", "type": "consent" },
                { "id": "cv", "type": "file" },
                { "id": "pics", "type": "file", "multiple": true },
            ]),
        ))
    }

    mod files {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_single_file_is_encoded_object() {
            let dir = tempfile::tempdir().unwrap();
            let mut ctx = context(DefinitionKind::Form);
            ctx.apply(
                "cv",
                WidgetEvent::FileAdded(write_file(dir.path(), "cv.txt", b"hello")),
            );

            let payload = build_payload(&ctx).await.unwrap();
            let json = serde_json::to_value(&payload).unwrap();
            assert_eq!(
                json["answers"]["cv"],
                json!({
                    "filename": "cv.txt",
                    "mime_type": "text/plain",
                    "size": 5,
                    "data": "aGVsbG8=",
                })
            );
        }

        #[tokio::test]
        async fn test_multiple_files_keep_order() {
            let dir = tempfile::tempdir().unwrap();
            let mut ctx = context(DefinitionKind::Form);
            for name in ["a.txt", "b.txt", "c.txt"] {
                ctx.apply(
                    "pics",
                    WidgetEvent::FileAdded(write_file(dir.path(), name, name.as_bytes())),
                );
            }

            let payload = build_payload(&ctx).await.unwrap();
            let SubmittedAnswer::Files(files) = &payload.answers["pics"] else {
                panic!("expected a file list");
            };
            let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
            assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
            assert!(files.iter().all(|f| !f.data.is_empty() && f.size > 0));
        }

        #[tokio::test]
        async fn test_no_file_attached() {
            let payload = build_payload(&context(DefinitionKind::Form)).await.unwrap();
            assert_eq!(payload.answers["cv"], SubmittedAnswer::Value(Value::Null));
            assert_eq!(payload.answers["pics"], SubmittedAnswer::Files(Vec::new()));
        }

        #[tokio::test]
        async fn test_vanished_file_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let mut ctx = context(DefinitionKind::Form);
            let file = write_file(dir.path(), "gone.txt", b"x");
            std::fs::remove_file(&file.path).unwrap();
            ctx.apply("cv", WidgetEvent::FileAdded(file));

            let err = build_payload(&ctx).await.unwrap_err();
            assert!(matches!(err, SubmitError::Encoding { ref filename, .. } if filename == "gone.txt"));
        }

        #[tokio::test]
        async fn test_file_emptied_after_selection_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let mut ctx = context(DefinitionKind::Form);
            let file = write_file(dir.path(), "notes.txt", b"draft");
            std::fs::write(&file.path, b"").unwrap();
            ctx.apply("cv", WidgetEvent::FileAdded(file));

            let err = build_payload(&ctx).await.unwrap_err();
            assert_eq!(err.to_string(), "could not read notes.txt: file is empty");
        }
    }

    mod payload {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_plain_answers_pass_through() {
            let mut ctx = context(DefinitionKind::Form);
            ctx.set_answer("name", AnswerValue::Text("Ann".to_string()));
            ctx.set_answer("colors", AnswerValue::Choices(vec!["Blue".to_string()]));
            ctx.set_answer("stars", AnswerValue::Number(Some(4.0)));
            ctx.set_answer("agree", AnswerValue::Bool(true));

            let json = serde_json::to_value(build_payload(&ctx).await.unwrap()).unwrap();
            assert_eq!(json["answers"]["name"], json!("Ann"));
            assert_eq!(json["answers"]["colors"], json!(["Blue"]));
            assert_eq!(json["answers"]["stars"], json!(4));
            assert_eq!(json["answers"]["agree"], json!(true));
        }

        #[tokio::test]
        async fn test_every_question_is_answered() {
            let ctx = context(DefinitionKind::Form);
            let payload = build_payload(&ctx).await.unwrap();
            assert_eq!(payload.answers.len(), ctx.definition().questions.len());
            assert_eq!(payload.questions.len(), ctx.definition().questions.len());
        }

        #[tokio::test]
        async fn test_identifier_key_follows_kind() {
            let form = serde_json::to_value(
                build_payload(&context(DefinitionKind::Form)).await.unwrap(),
            )
            .unwrap();
            assert_eq!(form["form_id"], json!("test-form"));
            assert!(form.get("quizid").is_none());

            let quiz = serde_json::to_value(
                build_payload(&context(DefinitionKind::Quiz)).await.unwrap(),
            )
            .unwrap();
            assert_eq!(quiz["quizid"], json!("test-form"));
            assert!(quiz.get("form_id").is_none());
        }

        #[tokio::test]
        async fn test_routing_is_copied() {
            let mut definition = test_definition(DefinitionKind::Form, json!([{ "id": "a" }]));
            definition.routing.notify_emails = vec!["ops@x.io".to_string()];
            definition.routing.slack_channel_id = Some("C123".to_string());
            definition.routing.sender_name = Some("Forms".to_string());
            let payload = build_payload(&FormContext::new(definition)).await.unwrap();

            assert_eq!(payload.notify_emails, vec!["ops@x.io".to_string()]);
            assert_eq!(payload.slack_channel_id.as_deref(), Some("C123"));
            assert_eq!(payload.sender_name.as_deref(), Some("Forms"));
            assert!(payload.log_sheet.is_none());
        }

        #[test]
        fn test_numbers() {
            assert_eq!(answer_to_json(&AnswerValue::Number(Some(2.5))), json!(2.5));
            assert_eq!(answer_to_json(&AnswerValue::Number(Some(-3.0))), json!(-3));
            assert_eq!(answer_to_json(&AnswerValue::Number(None)), Value::Null);
            assert_eq!(answer_to_json(&AnswerValue::Number(Some(f64::NAN))), Value::Null);
        }
    }
}
