//! The explicit context object for one loaded form

use super::answer::AnswerValue;
use super::event::WidgetEvent;
use super::navigation::Navigator;
use super::validation::{validate, validate_files, validate_live};
use crate::config::Profile;
use crate::state::{FormDefinition, QuestionKind};
use std::collections::BTreeMap;

/// Question id to message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn set(&mut self, question_id: &str, message: String) {
        self.0.insert(question_id.to_string(), message);
    }

    pub fn clear(&mut self, question_id: &str) {
        self.0.remove(question_id);
    }

    /// Store `result` for a question, clearing it when `None`
    pub fn record(&mut self, question_id: &str, result: Option<String>) {
        match result {
            Some(message) => self.set(question_id, message),
            None => self.clear(question_id),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Answers, errors and position for the loaded definition
///
/// Answer keys are always exactly the definition's question ids.
#[derive(Debug, Clone)]
pub struct FormContext {
    definition: FormDefinition,
    answers: BTreeMap<String, AnswerValue>,
    errors: ValidationErrors,
    pub navigator: Navigator,
}

impl FormContext {
    /// Fresh context: default answers, no errors, first step
    pub fn new(definition: FormDefinition) -> Self {
        let answers = definition
            .questions
            .iter()
            .map(|q| (q.id.clone(), AnswerValue::default_for(&q.kind)))
            .collect();
        let navigator = Navigator::for_definition(&definition);
        Self {
            definition,
            answers,
            errors: ValidationErrors::default(),
            navigator,
        }
    }

    /// Start over with the same definition
    pub fn reset(&mut self) {
        *self = Self::new(self.definition.clone());
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Replace an answer; unknown ids are rejected
    pub fn set_answer(&mut self, question_id: &str, value: AnswerValue) -> bool {
        match self.answers.get_mut(question_id) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Apply a widget event and refresh the field's error
    pub fn apply(&mut self, question_id: &str, event: WidgetEvent) -> bool {
        let Some(question) = self.definition.question(question_id) else {
            tracing::warn!("Event for unknown question {question_id}");
            return false;
        };
        let Some(slot) = self.answers.get_mut(question_id) else {
            return false;
        };

        match event {
            WidgetEvent::ValueChanged(value) => {
                *slot = value;
                self.errors
                    .record(question_id, validate_live(question, slot));
            }
            WidgetEvent::FileAdded(file) => {
                let multiple = matches!(question.kind, QuestionKind::File { multiple: true, .. });
                let mut files = slot.files().to_vec();
                if !multiple {
                    files.clear();
                }
                files.push(file);
                *slot = AnswerValue::Files(files);
                self.errors
                    .record(question_id, validate_files(question, slot));
            }
            WidgetEvent::FileRemoved(index) => {
                let mut files = slot.files().to_vec();
                if index < files.len() {
                    files.remove(index);
                }
                *slot = AnswerValue::Files(files);
                self.errors
                    .record(question_id, validate_files(question, slot));
            }
        }
        true
    }

    /// Run full validation on the given questions; returns the failing ids
    pub fn validate_questions(&mut self, question_ids: &[String]) -> Vec<String> {
        let mut failed = Vec::new();
        for id in question_ids {
            let (Some(question), Some(value)) = (self.definition.question(id), self.answers.get(id))
            else {
                continue;
            };
            let result = validate(question, value);
            if result.is_some() {
                failed.push(id.clone());
            }
            self.errors.record(id, result);
        }
        failed
    }

    /// Run full validation on every question, in definition order
    pub fn validate_all(&mut self) -> Vec<String> {
        let ids: Vec<String> = self.definition.questions.iter().map(|q| q.id.clone()).collect();
        self.validate_questions(&ids)
    }

    /// Fill empty name/email questions from a remembered profile
    pub fn prefill(&mut self, profile: &Profile) {
        if let Some(email) = profile.email.as_deref().filter(|e| !e.is_empty()) {
            if let Some(id) = self.email_question_id() {
                self.fill_if_empty(&id, email);
            }
        }
        if let Some(name) = profile.name.as_deref().filter(|n| !n.is_empty()) {
            if let Some(id) = self.name_question_id() {
                self.fill_if_empty(&id, name);
            }
        }
    }

    /// Name and email worth remembering from the current answers
    pub fn profile_from_answers(&self) -> Profile {
        let text_of = |id: Option<String>| {
            id.and_then(|id| self.answers.get(&id))
                .map(|v| v.as_text().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Profile {
            name: text_of(self.name_question_id()),
            email: text_of(self.email_question_id()),
        }
    }

    fn email_question_id(&self) -> Option<String> {
        self.definition
            .questions
            .iter()
            .find(|q| q.kind == QuestionKind::Email)
            .map(|q| q.id.clone())
    }

    fn name_question_id(&self) -> Option<String> {
        self.definition
            .questions
            .iter()
            .find(|q| {
                q.kind == QuestionKind::ShortText
                    && [q.id.to_lowercase(), q.label.to_lowercase()]
                        .iter()
                        .any(|s| s.contains("name") || s.contains("ชื่อ"))
            })
            .map(|q| q.id.clone())
    }

    fn fill_if_empty(&mut self, question_id: &str, text: &str) {
        if let Some(slot) = self.answers.get_mut(question_id) {
            if slot.as_text().is_empty() {
                *slot = AnswerValue::Text(text.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{test_definition, DefinitionKind, FileAttachment};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;

    fn context() -> FormContext {
        FormContext::new(test_definition(
            DefinitionKind::Form,
            json!([
                { "id": "name", "type": "text", "label": "Your name" },
                { "id": "mail", "type": "email", "label": "Email", "required": true },
                { "id": "cv", "type": "file", "maxSize": 1 },
                { "id": "pics", "type": "file", "multiple": true },
                { "id": "banner", "type": "image", "url": "https://x/y.png" },
            ]),
        ))
    }

    fn attachment(name: &str, size: u64) -> FileAttachment {
        FileAttachment {
            filename: name.to_string(),
            mime_type: "application/pdf".to_string(),
            size,
            path: PathBuf::from(name),
        }
    }

    mod answers {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_keys_match_question_ids() {
            let ctx = context();
            let keys: Vec<_> = ctx.answers().keys().cloned().collect();
            let mut ids: Vec<_> = ctx
                .definition()
                .questions
                .iter()
                .map(|q| q.id.clone())
                .collect();
            ids.sort();
            assert_eq!(keys, ids);
        }

        #[test]
        fn test_unknown_id_is_rejected() {
            let mut ctx = context();
            assert!(!ctx.set_answer("nope", AnswerValue::Text("x".to_string())));
            assert!(!ctx.apply("nope", WidgetEvent::FileRemoved(0)));
            assert!(ctx.answer("nope").is_none());
            assert_eq!(ctx.answers().len(), 5);
        }

        #[test]
        fn test_reset_restores_defaults() {
            let mut ctx = context();
            ctx.set_answer("name", AnswerValue::Text("Ann".to_string()));
            ctx.validate_all();
            ctx.reset();
            assert_eq!(ctx.answer("name"), Some(&AnswerValue::Text(String::new())));
            assert!(ctx.errors().is_empty());
        }
    }

    mod events {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_live_error_set_and_cleared() {
            let mut ctx = context();
            ctx.apply(
                "mail",
                WidgetEvent::ValueChanged(AnswerValue::Text("a@b".to_string())),
            );
            assert!(ctx.errors().get("mail").is_some());
            ctx.apply(
                "mail",
                WidgetEvent::ValueChanged(AnswerValue::Text("a@b.co".to_string())),
            );
            assert!(ctx.errors().get("mail").is_none());
        }

        #[test]
        fn test_editing_clears_required_error() {
            let mut ctx = context();
            ctx.validate_all();
            assert_eq!(ctx.errors().get("mail"), Some("This field is required"));
            ctx.apply(
                "mail",
                WidgetEvent::ValueChanged(AnswerValue::Text("a".to_string())),
            );
            assert_ne!(ctx.errors().get("mail"), Some("This field is required"));
            ctx.apply(
                "mail",
                WidgetEvent::ValueChanged(AnswerValue::Text("a@b.co".to_string())),
            );
            assert!(ctx.errors().get("mail").is_none());
        }

        #[test]
        fn test_single_file_is_replaced() {
            let mut ctx = context();
            ctx.apply("cv", WidgetEvent::FileAdded(attachment("a.pdf", 1)));
            ctx.apply("cv", WidgetEvent::FileAdded(attachment("b.pdf", 1)));
            let files = ctx.answer("cv").unwrap().files();
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].filename, "b.pdf");
        }

        #[test]
        fn test_multiple_files_accumulate_and_remove() {
            let mut ctx = context();
            ctx.apply("pics", WidgetEvent::FileAdded(attachment("a.pdf", 1)));
            ctx.apply("pics", WidgetEvent::FileAdded(attachment("b.pdf", 1)));
            ctx.apply("pics", WidgetEvent::FileRemoved(0));
            ctx.apply("pics", WidgetEvent::FileRemoved(9));
            let files = ctx.answer("pics").unwrap().files();
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].filename, "b.pdf");
        }

        #[test]
        fn test_oversize_file_flagged_on_add() {
            let mut ctx = context();
            ctx.apply(
                "cv",
                WidgetEvent::FileAdded(attachment("big.pdf", 2 * 1024 * 1024)),
            );
            assert!(ctx.errors().get("cv").is_some());
            ctx.apply("cv", WidgetEvent::FileRemoved(0));
            assert!(ctx.errors().get("cv").is_none());
        }
    }

    mod profile {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_prefill_fills_empty_fields_only() {
            let mut ctx = context();
            ctx.set_answer("mail", AnswerValue::Text("typed@x.io".to_string()));
            ctx.prefill(&Profile {
                name: Some("Ann".to_string()),
                email: Some("saved@x.io".to_string()),
            });
            assert_eq!(ctx.answer("name").unwrap().as_text(), "Ann");
            assert_eq!(ctx.answer("mail").unwrap().as_text(), "typed@x.io");
        }

        #[test]
        fn test_profile_from_answers() {
            let mut ctx = context();
            ctx.set_answer("name", AnswerValue::Text(" Ann ".to_string()));
            let profile = ctx.profile_from_answers();
            assert_eq!(profile.name.as_deref(), Some("Ann"));
            assert!(profile.email.is_none());
        }
    }
}
