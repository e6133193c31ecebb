//! Application state and core logic

use crate::config::{Profile, ProfileStore};
use crate::input::{paste_text, question_input};
use crate::platform::PASTE_MODIFIER;
use crate::state::navigation::{self, NavOutcome};
use crate::state::{
    AnswerValue, AppState, DefinitionKind, FormContext, Navigator, PendingRequest, Question,
    ToastKind, View, WidgetEvent,
};
use crate::submission::build_payload;
use crate::webhook::{FetchError, WebhookClient, WebhookClientTrait};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Main application struct
pub struct App<C: WebhookClientTrait = WebhookClient> {
    /// Current application state
    pub state: AppState,
    /// Client for the fetch and submit webhooks
    client: C,
    /// Remembered name/email, `None` when disabled
    profile_store: Option<ProfileStore>,
    /// Whether the app should quit
    quit: bool,
    /// Printed after the terminal is restored
    exit_message: Option<String>,
}

impl<C: WebhookClientTrait> App<C> {
    /// Create the app, queueing a fetch when an identifier was given
    pub fn new(
        client: C,
        profile_store: Option<ProfileStore>,
        target: Option<(DefinitionKind, String)>,
    ) -> Self {
        let mut app = Self {
            state: AppState::default(),
            client,
            profile_store,
            quit: false,
            exit_message: None,
        };
        if let Some((kind, id)) = target {
            app.state.kind = kind;
            app.state.identifier = id;
            app.request_fetch();
        }
        app
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn exit_message(&self) -> Option<&str> {
        self.exit_message.as_deref()
    }

    /// Whether a request waits for `run_pending`
    pub fn has_pending(&self) -> bool {
        self.state.pending.is_some()
    }

    /// Periodic housekeeping between events
    pub fn tick(&mut self) {
        self.state.expire_toast();
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.state.current_view.is_busy() {
            return;
        }

        match self.state.current_view {
            View::IdentifierPrompt => self.handle_prompt_key(key),
            View::LoadFailed => self.handle_load_failed_key(key),
            View::Form => self.handle_form_key(key),
            View::Submitted => self.handle_submitted_key(key),
            View::Loading | View::Submitting => {}
        }
    }

    /// Insert pasted text into the focused question or the identifier
    pub fn handle_paste(&mut self, text: &str) {
        match self.state.current_view {
            View::IdentifierPrompt => {
                let line = text.lines().next().unwrap_or_default().trim();
                self.state.identifier.push_str(line);
            }
            View::Form => self.paste_into_focused(text),
            _ => {}
        }
    }

    /// Run the queued fetch or submit request
    pub async fn run_pending(&mut self) {
        let Some(request) = self.state.pending.take() else {
            return;
        };
        match request {
            PendingRequest::Fetch { kind, id } => self.load(kind, &id).await,
            PendingRequest::Submit => self.submit().await,
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(PASTE_MODIFIER) && key.code == KeyCode::Char('v') {
            match read_clipboard() {
                Ok(text) => self.handle_paste(&text),
                Err(e) => self.clipboard_failed(&e),
            }
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.state.kind = self.state.kind.toggle(),
            KeyCode::Enter => self.request_fetch(),
            KeyCode::Backspace => {
                self.state.identifier.pop();
            }
            KeyCode::Esc => self.quit = true,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.identifier.push(c);
            }
            _ => {}
        }
    }

    fn handle_load_failed_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => self.request_fetch(),
            KeyCode::Char('e') | KeyCode::Esc => {
                self.state.load_error = None;
                self.state.current_view = View::IdentifierPrompt;
            }
            KeyCode::Char('q') => self.quit = true,
            _ => {}
        }
    }

    fn handle_submitted_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') => self.start_new_response(),
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('n') => return self.advance(),
                KeyCode::Char('p') => return self.go_back(),
                KeyCode::Char('f') => return self.resume(),
                KeyCode::Char('s') => return self.submit_or_advance(),
                _ => {}
            }
        }
        if key.modifiers.contains(PASTE_MODIFIER) && key.code == KeyCode::Char('v') {
            match read_clipboard() {
                Ok(text) => self.paste_into_focused(&text),
                Err(e) => self.clipboard_failed(&e),
            }
            return;
        }

        match key.code {
            KeyCode::Tab => self.state.focus_next(),
            KeyCode::BackTab => self.state.focus_prev(),
            _ => self.send_to_focused(key),
        }
    }

    /// Route a key to the focused question's widget
    fn send_to_focused(&mut self, key: KeyEvent) {
        let Some((id, question, value)) = self.focused_question() else {
            return;
        };
        let mut interaction = self.state.interaction(&id);
        let result = question_input(&question, &value, key, &mut interaction);
        *self.state.interaction_mut(&id) = interaction;

        match result {
            Ok(Some(event)) => self.apply_event(&id, event),
            Ok(None) => {}
            Err(message) => self.state.show_toast(message, ToastKind::Error),
        }
    }

    fn paste_into_focused(&mut self, text: &str) {
        let Some((id, question, value)) = self.focused_question() else {
            return;
        };
        let mut interaction = self.state.interaction(&id);
        let event = paste_text(&question, &value, text, &mut interaction);
        *self.state.interaction_mut(&id) = interaction;

        if let Some(event) = event {
            self.apply_event(&id, event);
        }
    }

    /// The focused question and a copy of its answer
    fn focused_question(&self) -> Option<(String, Question, AnswerValue)> {
        let id = self.state.focused_question_id()?;
        let form = self.state.form.as_ref()?;
        let question = form.definition().question(&id)?.clone();
        let value = form.answer(&id).cloned().unwrap_or_default();
        Some((id, question, value))
    }

    fn apply_event(&mut self, question_id: &str, event: WidgetEvent) {
        if let Some(form) = self.state.form.as_mut() {
            form.apply(question_id, event);
        }
    }

    fn clipboard_failed(&mut self, err: &anyhow::Error) {
        tracing::warn!("Clipboard read failed: {err}");
        self.state
            .show_toast("Clipboard is not available", ToastKind::Error);
    }

    fn advance(&mut self) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        let outcome = navigation::next(form);
        self.after_navigation(outcome);
    }

    fn go_back(&mut self) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        let outcome = navigation::previous(form);
        self.after_navigation(outcome);
    }

    /// Jump forward to the furthest step reached
    fn resume(&mut self) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        let Some(furthest) = form.navigator.furthest() else {
            return;
        };
        let outcome = navigation::jump_to(form, furthest);
        self.after_navigation(outcome);
    }

    fn submit_or_advance(&mut self) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        let outcome = match form.navigator {
            Navigator::LinearSinglePage => navigation::submit_check(form),
            _ => navigation::next(form),
        };
        self.after_navigation(outcome);
    }

    fn after_navigation(&mut self, outcome: NavOutcome) {
        match outcome {
            NavOutcome::Moved(_) => self.state.focus = 0,
            NavOutcome::Stayed => {}
            NavOutcome::Blocked(failed) => {
                self.state.focus = 0;
                if let Some(first) = failed.first() {
                    self.state.focus_question(first);
                }
                let message = match failed.len() {
                    1 => "1 question needs attention".to_string(),
                    n => format!("{n} questions need attention"),
                };
                self.state.show_toast(message, ToastKind::Error);
            }
            NavOutcome::Submit => {
                self.state.pending = Some(PendingRequest::Submit);
                self.state.current_view = View::Submitting;
            }
        }
    }

    /// Queue a fetch for the current identifier
    fn request_fetch(&mut self) {
        let id = self.state.identifier.trim().to_string();
        if id.is_empty() {
            self.state.current_view = View::IdentifierPrompt;
            self.state.show_toast(
                format!("Enter a {} id", self.state.kind.label().to_lowercase()),
                ToastKind::Error,
            );
            return;
        }
        self.state.pending = Some(PendingRequest::Fetch {
            kind: self.state.kind,
            id,
        });
        self.state.current_view = View::Loading;
    }

    async fn load(&mut self, kind: DefinitionKind, id: &str) {
        match self.client.fetch_definition(kind, id).await {
            Ok(definition) => {
                let mut form = FormContext::new(definition);
                if let Some(profile) = self.load_profile() {
                    form.prefill(&profile);
                }
                self.state.load_form(form);
            }
            Err(FetchError::MissingIdentifier) => {
                self.state.current_view = View::IdentifierPrompt;
                self.state
                    .show_toast(FetchError::MissingIdentifier.to_string(), ToastKind::Error);
            }
            Err(err) => {
                tracing::warn!("Loading {} {id} failed: {err}", kind.label());
                let mut message = err.to_string();
                if err.is_transient() {
                    message.push_str(". This is often temporary.");
                }
                self.state.form = None;
                self.state.load_error = Some(message);
                self.state.current_view = View::LoadFailed;
            }
        }
    }

    async fn submit(&mut self) {
        let Some(form) = self.state.form.as_ref() else {
            self.state.current_view = View::IdentifierPrompt;
            return;
        };
        let kind = form.definition().kind;
        let result = match build_payload(form).await {
            Ok(payload) => self.client.submit(kind, &payload).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                let redirect = form.definition().routing.success_redirect.clone();
                let profile = form.profile_from_answers();
                self.remember_profile(&profile);
                self.state.current_view = View::Submitted;
                self.state.show_toast("Response submitted", ToastKind::Success);
                if let Some(url) = redirect {
                    tracing::info!("Redirecting to {url}");
                    self.exit_message = Some(format!("Submitted. Continue at {url}"));
                    self.quit = true;
                }
            }
            Err(err) => {
                tracing::warn!("Submission failed: {err}");
                self.state.current_view = View::Form;
                self.state
                    .show_toast(format!("Submission failed: {err}"), ToastKind::Error);
            }
        }
    }

    /// Clear the answers of the loaded form for another response
    fn start_new_response(&mut self) {
        let profile = self.load_profile();
        let Some(form) = self.state.form.as_mut() else {
            self.state.current_view = View::IdentifierPrompt;
            return;
        };
        form.reset();
        if let Some(profile) = profile {
            form.prefill(&profile);
        }
        self.state.reset_interaction();
        self.state.current_view = View::Form;
        self.state.show_toast("Started a new response", ToastKind::Info);
    }

    fn load_profile(&self) -> Option<Profile> {
        let store = self.profile_store.as_ref()?;
        match store.load() {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("Could not read profile {}: {e:#}", store.path().display());
                None
            }
        }
    }

    fn remember_profile(&self, profile: &Profile) {
        let Some(store) = &self.profile_store else {
            return;
        };
        if profile.is_empty() {
            return;
        }
        if let Err(e) = store.save(profile) {
            tracing::warn!("Could not save profile {}: {e:#}", store.path().display());
        }
    }
}

fn read_clipboard() -> Result<String> {
    let mut clipboard = arboard::Clipboard::new()?;
    Ok(clipboard.get_text()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_definition;
    use crate::webhook::{MockWebhookClientTrait, SubmitError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn answer_of<C: WebhookClientTrait>(app: &App<C>, id: &str) -> AnswerValue {
        app.state
            .form
            .as_ref()
            .and_then(|form| form.answer(id).cloned())
            .unwrap_or_default()
    }

    fn type_text<C: WebhookClientTrait>(app: &mut App<C>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn serving(questions: serde_json::Value) -> MockWebhookClientTrait {
        let mut client = MockWebhookClientTrait::new();
        client
            .expect_fetch_definition()
            .returning(move |kind, _| Ok(test_definition(kind, questions.clone())));
        client
    }

    async fn loaded(client: MockWebhookClientTrait) -> App<MockWebhookClientTrait> {
        let mut app = App::new(client, None, Some((DefinitionKind::Form, "f1".to_string())));
        app.run_pending().await;
        assert_eq!(app.state.current_view, View::Form);
        app
    }

    mod prompt {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_starts_on_prompt_without_target() {
            let app = App::new(MockWebhookClientTrait::new(), None, None);
            assert_eq!(app.state.current_view, View::IdentifierPrompt);
            assert!(!app.has_pending());
        }

        #[test]
        fn test_target_queues_fetch() {
            let app = App::new(
                MockWebhookClientTrait::new(),
                None,
                Some((DefinitionKind::Quiz, "q7".to_string())),
            );
            assert_eq!(app.state.current_view, View::Loading);
            assert_eq!(
                app.state.pending,
                Some(PendingRequest::Fetch {
                    kind: DefinitionKind::Quiz,
                    id: "q7".to_string(),
                })
            );
        }

        #[test]
        fn test_typing_and_kind_toggle() {
            let mut app = App::new(MockWebhookClientTrait::new(), None, None);
            type_text(&mut app, "abcd");
            app.handle_key(key(KeyCode::Backspace));
            app.handle_key(key(KeyCode::Tab));
            app.handle_key(key(KeyCode::Enter));

            assert_eq!(
                app.state.pending,
                Some(PendingRequest::Fetch {
                    kind: DefinitionKind::Quiz,
                    id: "abc".to_string(),
                })
            );
        }

        #[test]
        fn test_blank_identifier_stays_on_prompt() {
            let mut app = App::new(MockWebhookClientTrait::new(), None, None);
            type_text(&mut app, "   ");
            app.handle_key(key(KeyCode::Enter));

            assert_eq!(app.state.current_view, View::IdentifierPrompt);
            assert!(!app.has_pending());
            assert!(app.state.toast.is_some());
        }

        #[test]
        fn test_paste_takes_first_line() {
            let mut app = App::new(MockWebhookClientTrait::new(), None, None);
            app.handle_paste(" form-9 \nignored");
            assert_eq!(app.state.identifier, "form-9");
        }
    }

    mod loading {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_fetch_success_shows_form() {
            let app = loaded(serving(json!([{ "id": "a" }]))).await;
            assert!(!app.has_pending());
            assert_eq!(app.state.form.as_ref().unwrap().definition().id, "test-form");
        }

        #[tokio::test]
        async fn test_fetch_failure_offers_retry() {
            let mut client = MockWebhookClientTrait::new();
            client.expect_fetch_definition().times(1).returning(|_, _| {
                Err(FetchError::Status {
                    status: 404,
                    body: String::new(),
                })
            });
            let mut app = App::new(client, None, Some((DefinitionKind::Form, "x".to_string())));
            app.run_pending().await;

            assert_eq!(app.state.current_view, View::LoadFailed);
            assert_eq!(
                app.state.load_error.as_deref(),
                Some("form server answered 404")
            );

            app.handle_key(key(KeyCode::Char('r')));
            assert_eq!(app.state.current_view, View::Loading);
            assert!(app.has_pending());
        }

        #[tokio::test]
        async fn test_transient_failure_is_flagged() {
            let mut client = MockWebhookClientTrait::new();
            client
                .expect_fetch_definition()
                .returning(|_, _| Err(FetchError::Network("connection failed".to_string())));
            let mut app = App::new(client, None, Some((DefinitionKind::Form, "x".to_string())));
            app.run_pending().await;

            let message = app.state.load_error.clone().unwrap();
            assert!(message.contains("connection failed"));
            assert!(message.contains("temporary"));
        }

        #[tokio::test]
        async fn test_change_identifier_after_failure() {
            let mut client = MockWebhookClientTrait::new();
            client
                .expect_fetch_definition()
                .returning(|_, _| Err(FetchError::Network("timeout".to_string())));
            let mut app = App::new(client, None, Some((DefinitionKind::Form, "x".to_string())));
            app.run_pending().await;

            app.handle_key(key(KeyCode::Char('e')));
            assert_eq!(app.state.current_view, View::IdentifierPrompt);
            assert!(app.state.load_error.is_none());
        }

        #[test]
        fn test_input_ignored_while_loading() {
            let mut app = App::new(
                MockWebhookClientTrait::new(),
                None,
                Some((DefinitionKind::Form, "f".to_string())),
            );
            app.handle_key(key(KeyCode::Char('z')));
            assert_eq!(app.state.identifier, "f");
        }
    }

    mod form_keys {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_typing_fills_focused_question() {
            let mut app = loaded(serving(json!([{ "id": "a" }, { "id": "b" }]))).await;
            type_text(&mut app, "hi");
            app.handle_key(key(KeyCode::Tab));
            type_text(&mut app, "yo");

            assert_eq!(answer_of(&app, "a"), AnswerValue::Text("hi".to_string()));
            assert_eq!(answer_of(&app, "b"), AnswerValue::Text("yo".to_string()));
        }

        #[tokio::test]
        async fn test_paste_into_text_question() {
            let mut app = loaded(serving(json!([{ "id": "a" }]))).await;
            app.handle_paste("pasted");
            assert_eq!(answer_of(&app, "a"), AnswerValue::Text("pasted".to_string()));
        }

        #[tokio::test]
        async fn test_blocked_submit_focuses_first_failure() {
            let mut app = loaded(serving(json!([
                { "id": "a" },
                { "id": "b", "required": true },
            ])))
            .await;
            app.handle_key(ctrl('s'));

            assert_eq!(app.state.current_view, View::Form);
            assert!(!app.has_pending());
            assert_eq!(app.state.focused_question_id().as_deref(), Some("b"));
            assert!(app.state.toast.is_some());
        }

        #[tokio::test]
        async fn test_step_navigation() {
            let mut client = MockWebhookClientTrait::new();
            client.expect_fetch_definition().returning(|_, _| {
                Ok(test_definition(
                    DefinitionKind::Quiz,
                    json!([{ "id": "a" }, { "id": "b" }, { "id": "c" }]),
                ))
            });
            let mut app = loaded(client).await;

            app.handle_key(ctrl('n'));
            app.handle_key(ctrl('n'));
            assert_eq!(app.state.focused_question_id().as_deref(), Some("c"));

            app.handle_key(ctrl('p'));
            app.handle_key(ctrl('p'));
            assert_eq!(app.state.focused_question_id().as_deref(), Some("a"));

            app.handle_key(ctrl('f'));
            assert_eq!(app.state.focused_question_id().as_deref(), Some("c"));

            app.handle_key(ctrl('n'));
            assert_eq!(app.state.current_view, View::Submitting);
            assert_eq!(app.state.pending, Some(PendingRequest::Submit));
        }
    }

    mod submitting {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_successful_submission() {
            let mut client = serving(json!([{ "id": "a", "required": true }]));
            client
                .expect_submit()
                .times(1)
                .withf(|kind, payload| {
                    *kind == DefinitionKind::Form
                        && payload.form_id.as_deref() == Some("test-form")
                })
                .returning(|_, _| Ok(()));
            let mut app = loaded(client).await;

            type_text(&mut app, "answer");
            app.handle_key(ctrl('s'));
            app.run_pending().await;

            assert_eq!(app.state.current_view, View::Submitted);
            assert!(!app.should_quit());
            let toast = app.state.toast.as_ref().unwrap();
            assert_eq!(toast.kind, ToastKind::Success);
            assert_eq!(toast.message, "Response submitted");
        }

        #[tokio::test]
        async fn test_failed_submission_keeps_answers() {
            let mut client = serving(json!([{ "id": "a" }]));
            client.expect_submit().returning(|_, _| {
                Err(SubmitError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            });
            let mut app = loaded(client).await;

            type_text(&mut app, "keep me");
            app.handle_key(ctrl('s'));
            app.run_pending().await;

            assert_eq!(app.state.current_view, View::Form);
            assert_eq!(answer_of(&app, "a"), AnswerValue::Text("keep me".to_string()));
            let toast = app.state.toast.as_ref().unwrap();
            assert_eq!(toast.kind, ToastKind::Error);
            assert!(toast.message.contains("500"));
        }

        #[tokio::test]
        async fn test_redirect_quits_with_message() {
            let mut client = MockWebhookClientTrait::new();
            client.expect_fetch_definition().returning(|kind, _| {
                let mut definition = test_definition(kind, json!([{ "id": "a" }]));
                definition.routing.success_redirect = Some("https://example.com/thanks".to_string());
                Ok(definition)
            });
            client.expect_submit().returning(|_, _| Ok(()));
            let mut app = loaded(client).await;

            app.handle_key(ctrl('s'));
            app.run_pending().await;

            assert!(app.should_quit());
            assert_eq!(
                app.exit_message(),
                Some("Submitted. Continue at https://example.com/thanks")
            );
        }

        #[tokio::test]
        async fn test_new_response_clears_answers() {
            let mut client = serving(json!([{ "id": "a" }]));
            client.expect_submit().returning(|_, _| Ok(()));
            let mut app = loaded(client).await;

            type_text(&mut app, "first");
            app.handle_key(ctrl('s'));
            app.run_pending().await;
            app.handle_key(key(KeyCode::Char('n')));

            assert_eq!(app.state.current_view, View::Form);
            assert_eq!(answer_of(&app, "a"), AnswerValue::Text(String::new()));
            assert_eq!(app.state.toast.as_ref().unwrap().kind, ToastKind::Info);
        }
    }

    mod profile {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_profile_saved_and_prefilled() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("profile.json");
            let questions = json!([{ "id": "email", "type": "email" }]);

            let mut client = serving(questions.clone());
            client.expect_submit().returning(|_, _| Ok(()));
            let mut app = App::new(
                client,
                Some(ProfileStore::at(&path)),
                Some((DefinitionKind::Form, "f1".to_string())),
            );
            app.run_pending().await;
            type_text(&mut app, "ann@example.com");
            app.handle_key(ctrl('s'));
            app.run_pending().await;
            assert_eq!(app.state.current_view, View::Submitted);

            let saved = ProfileStore::at(&path).load().unwrap();
            assert_eq!(saved.email.as_deref(), Some("ann@example.com"));

            let mut second = App::new(
                serving(questions),
                Some(ProfileStore::at(&path)),
                Some((DefinitionKind::Form, "f1".to_string())),
            );
            second.run_pending().await;
            assert_eq!(
                answer_of(&second, "email"),
                AnswerValue::Text("ann@example.com".to_string())
            );
        }

        #[tokio::test]
        async fn test_disabled_profile_leaves_form_empty() {
            let app = loaded(serving(json!([{ "id": "email", "type": "email" }]))).await;
            assert_eq!(answer_of(&app, "email"), AnswerValue::Text(String::new()));
        }
    }
}
