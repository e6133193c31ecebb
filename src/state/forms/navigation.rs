//! Wizard navigation over a loaded form
//!
//! The navigator only tracks position. Every transition is a free function
//! over the whole [`FormContext`] because moving forward needs the answers
//! and records validation errors.

use super::form_state::FormContext;
use crate::state::{DefinitionKind, FormDefinition, Layout, QuestionKind};

/// A named group of questions shown together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub question_ids: Vec<String>,
}

/// Navigation mode and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigator {
    /// Every question on one page
    LinearSinglePage,
    /// One question at a time
    StepWizard {
        index: usize,
        furthest: usize,
        question_ids: Vec<String>,
    },
    /// One section at a time
    SectionWizard {
        index: usize,
        furthest: usize,
        sections: Vec<Section>,
    },
}

/// Result of a navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// Now showing the step or section at this index
    Moved(usize),
    /// Nothing to do (already at the boundary, or target not reached yet)
    Stayed,
    /// Validation failed for these questions
    Blocked(Vec<String>),
    /// Everything is valid, submission should run
    Submit,
}

impl Navigator {
    /// Pick the mode for a freshly loaded definition
    pub fn for_definition(definition: &FormDefinition) -> Self {
        let layout = definition.display.layout.unwrap_or_else(|| {
            if definition.has_sections() {
                Layout::Section
            } else if definition.kind == DefinitionKind::Quiz {
                Layout::Step
            } else {
                Layout::SinglePage
            }
        });

        match layout {
            Layout::SinglePage => Self::LinearSinglePage,
            Layout::Step => Self::StepWizard {
                index: 0,
                furthest: 0,
                question_ids: definition
                    .questions
                    .iter()
                    .filter(|q| is_drawn(&q.kind))
                    .map(|q| q.id.clone())
                    .collect(),
            },
            Layout::Section => Self::SectionWizard {
                index: 0,
                furthest: 0,
                sections: build_sections(definition),
            },
        }
    }

    /// Current step or section index; `None` on a single page
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::LinearSinglePage => None,
            Self::StepWizard { index, .. } | Self::SectionWizard { index, .. } => Some(*index),
        }
    }

    /// Furthest step or section reached so far
    pub fn furthest(&self) -> Option<usize> {
        match self {
            Self::LinearSinglePage => None,
            Self::StepWizard { furthest, .. } | Self::SectionWizard { furthest, .. } => {
                Some(*furthest)
            }
        }
    }

    /// Number of steps or sections (1 for a single page)
    pub fn step_count(&self) -> usize {
        match self {
            Self::LinearSinglePage => 1,
            Self::StepWizard { question_ids, .. } => question_ids.len(),
            Self::SectionWizard { sections, .. } => sections.len(),
        }
    }

    pub fn is_last(&self) -> bool {
        self.index().map_or(true, |i| i + 1 >= self.step_count())
    }

    /// Whether `target` can be shown without validating anything
    pub fn can_jump_to(&self, target: usize) -> bool {
        self.furthest().is_some_and(|furthest| target <= furthest)
    }

    pub fn current_section(&self) -> Option<&Section> {
        match self {
            Self::SectionWizard {
                index, sections, ..
            } => sections.get(*index),
            _ => None,
        }
    }

    /// Questions shown at the current position, in definition order
    pub fn visible_question_ids(&self, definition: &FormDefinition) -> Vec<String> {
        match self {
            Self::LinearSinglePage => definition.questions.iter().map(|q| q.id.clone()).collect(),
            Self::StepWizard {
                index,
                question_ids,
                ..
            } => question_ids.get(*index).cloned().into_iter().collect(),
            Self::SectionWizard {
                index, sections, ..
            } => sections
                .get(*index)
                .map(|s| s.question_ids.clone())
                .unwrap_or_default(),
        }
    }

    /// Step or section index that shows `question_id`
    pub fn position_of(&self, question_id: &str) -> Option<usize> {
        match self {
            Self::LinearSinglePage => None,
            Self::StepWizard { question_ids, .. } => {
                question_ids.iter().position(|id| id == question_id)
            }
            Self::SectionWizard { sections, .. } => sections
                .iter()
                .position(|s| s.question_ids.iter().any(|id| id == question_id)),
        }
    }

    /// (1-based current position, total)
    pub fn progress(&self) -> (usize, usize) {
        (self.index().map_or(1, |i| i + 1), self.step_count())
    }

    fn set_index(&mut self, target: usize) {
        if let Self::StepWizard {
            index, furthest, ..
        }
        | Self::SectionWizard {
            index, furthest, ..
        } = self
        {
            *index = target;
            *furthest = (*furthest).max(target);
        }
    }
}

/// Group questions by section label in order of first appearance
///
/// Questions before the first labeled one form an untitled leading section;
/// later unlabeled questions stay with the section before them.
pub fn build_sections(definition: &FormDefinition) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for question in definition.questions.iter().filter(|q| is_drawn(&q.kind)) {
        let target = match &question.section {
            Some(title) => match sections
                .iter()
                .position(|s| s.title.as_deref() == Some(title.as_str()))
            {
                Some(existing) => existing,
                None => {
                    sections.push(Section {
                        title: Some(title.clone()),
                        question_ids: Vec::new(),
                    });
                    sections.len() - 1
                }
            },
            None if sections.is_empty() => {
                sections.push(Section {
                    title: None,
                    question_ids: Vec::new(),
                });
                0
            }
            None => sections.len() - 1,
        };
        sections[target].question_ids.push(question.id.clone());
    }
    sections
}

/// Unknown question types never get a step or a section slot
fn is_drawn(kind: &QuestionKind) -> bool {
    !matches!(kind, QuestionKind::Unknown(_))
}

/// Validate the current step or section and move forward
///
/// On the last step the whole form is re-checked, since earlier steps may
/// have been edited after going back; the first failing step is shown.
pub fn next(ctx: &mut FormContext) -> NavOutcome {
    let Some(index) = ctx.navigator.index() else {
        return submit_check(ctx);
    };

    let current = ctx.navigator.visible_question_ids(ctx.definition());
    let failed = ctx.validate_questions(&current);
    if !failed.is_empty() {
        tracing::debug!("Step {index} blocked by {failed:?}");
        return NavOutcome::Blocked(failed);
    }

    if ctx.navigator.is_last() {
        return submit_check(ctx);
    }

    let target = index + 1;
    ctx.navigator.set_index(target);
    NavOutcome::Moved(target)
}

/// Move back one step or section without validating
pub fn previous(ctx: &mut FormContext) -> NavOutcome {
    match ctx.navigator.index() {
        Some(index) if index > 0 => {
            ctx.navigator.set_index(index - 1);
            NavOutcome::Moved(index - 1)
        }
        _ => NavOutcome::Stayed,
    }
}

/// Show a step or section already reached, without validating
pub fn jump_to(ctx: &mut FormContext, target: usize) -> NavOutcome {
    if ctx.navigator.index() == Some(target) || !ctx.navigator.can_jump_to(target) {
        return NavOutcome::Stayed;
    }
    ctx.navigator.set_index(target);
    NavOutcome::Moved(target)
}

/// Validate every question before submitting
pub fn submit_check(ctx: &mut FormContext) -> NavOutcome {
    let failed = ctx.validate_all();
    if failed.is_empty() {
        return NavOutcome::Submit;
    }

    let first_position = failed
        .first()
        .and_then(|id| ctx.navigator.position_of(id));
    if let Some(position) = first_position {
        ctx.navigator.set_index(position);
    }
    NavOutcome::Blocked(failed)
}
