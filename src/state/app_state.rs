//! Application state definitions

use super::{DefinitionKind, FormContext, QuestionKind};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Current view in the application
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// No identifier yet; ask for one
    #[default]
    IdentifierPrompt,
    Loading,
    /// Fetch failed or returned an unusable definition
    LoadFailed,
    Form,
    Submitting,
    Submitted,
}

impl View {
    /// Views that block input while a request is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, View::Loading | View::Submitting)
    }
}

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// Short-lived message in the status bar
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: Instant,
}

impl Toast {
    const TTL: Duration = Duration::from_secs(3);

    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= Self::TTL
    }
}

/// Request the event loop runs after drawing the busy screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequest {
    Fetch { kind: DefinitionKind, id: String },
    Submit,
}

/// Widget-local input state that is not part of the answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interaction {
    /// Highlighted option for choice questions
    pub cursor: usize,
    /// Path being typed for file questions
    pub path_input: String,
}

/// Main application state
#[derive(Default)]
pub struct AppState {
    // Navigation
    pub current_view: View,

    // Identifier
    pub kind: DefinitionKind,
    pub identifier: String,

    // Loaded form
    pub form: Option<FormContext>,
    pub load_error: Option<String>,

    // Requests
    pub pending: Option<PendingRequest>,

    // UI state
    pub focus: usize,
    pub interactions: HashMap<String, Interaction>,
    pub toast: Option<Toast>,
}

impl AppState {
    /// Show a toast, replacing any current one
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some(Toast::new(message, kind));
    }

    /// Drop the toast once it has been visible long enough
    pub fn expire_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    /// Ids of the questions on screen; unknown types are not drawn
    pub fn visible_question_ids(&self) -> Vec<String> {
        let Some(form) = &self.form else {
            return Vec::new();
        };
        let definition = form.definition();
        form.navigator
            .visible_question_ids(definition)
            .into_iter()
            .filter(|id| {
                definition
                    .question(id)
                    .is_some_and(|q| !matches!(q.kind, QuestionKind::Unknown(_)))
            })
            .collect()
    }

    /// Id of the focused question
    pub fn focused_question_id(&self) -> Option<String> {
        let visible = self.visible_question_ids();
        visible
            .get(self.focus.min(visible.len().saturating_sub(1)))
            .cloned()
    }

    /// Move focus to the next visible question (wraps around)
    pub fn focus_next(&mut self) {
        let count = self.visible_question_ids().len();
        if count > 0 {
            self.focus = (self.focus + 1) % count;
        }
    }

    /// Move focus to the previous visible question (wraps around)
    pub fn focus_prev(&mut self) {
        let count = self.visible_question_ids().len();
        if count == 0 {
            return;
        }
        if self.focus == 0 {
            self.focus = count - 1;
        } else {
            self.focus -= 1;
        }
    }

    /// Focus a question if it is on screen
    pub fn focus_question(&mut self, question_id: &str) {
        if let Some(position) = self
            .visible_question_ids()
            .iter()
            .position(|id| id == question_id)
        {
            self.focus = position;
        }
    }

    pub fn interaction(&self, question_id: &str) -> Interaction {
        self.interactions
            .get(question_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn interaction_mut(&mut self, question_id: &str) -> &mut Interaction {
        self.interactions
            .entry(question_id.to_string())
            .or_default()
    }

    /// Install a freshly fetched form
    pub fn load_form(&mut self, form: FormContext) {
        self.form = Some(form);
        self.load_error = None;
        self.reset_interaction();
        self.current_view = View::Form;
    }

    /// Forget focus and widget-local input
    pub fn reset_interaction(&mut self) {
        self.focus = 0;
        self.interactions.clear();
    }
}
