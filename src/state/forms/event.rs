//! Events a rendered question can raise

use super::answer::{AnswerValue, FileAttachment};

/// A change requested by a question widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    ValueChanged(AnswerValue),
    FileAdded(FileAttachment),
    FileRemoved(usize),
}

/// Event names, as advertised by a widget description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEventKind {
    ValueChanged,
    FileAdded,
    FileRemoved,
}

impl WidgetEvent {
    pub fn kind(&self) -> WidgetEventKind {
        match self {
            WidgetEvent::ValueChanged(_) => WidgetEventKind::ValueChanged,
            WidgetEvent::FileAdded(_) => WidgetEventKind::FileAdded,
            WidgetEvent::FileRemoved(_) => WidgetEventKind::FileRemoved,
        }
    }
}
