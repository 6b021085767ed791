//! Insertion engine
//!
//! Finds an editable surface in the page and inserts text at its cursor. Text
//! controls are spliced directly and get a synthetic `input` event; content-editable
//! regions use the page's insert-text command.

pub mod locator;

use std::sync::Arc;

use crate::shared::error::{AppError, AppResult};
use crate::system::page::{EditCommand, ElementId, ElementKind, PageDocument};

pub use locator::{default_probes, FocusedProbe, SelectorProbe, TargetLocator, TargetProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMethod {
    Splice,
    InsertCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionOutcome {
    pub target: ElementId,
    pub method: InsertionMethod,
}

#[derive(Clone)]
pub struct InsertionEngine {
    page: Arc<dyn PageDocument>,
    probes: Vec<TargetProbe>,
}

impl InsertionEngine {
    pub fn new(page: Arc<dyn PageDocument>) -> Self {
        Self::with_probes(page, default_probes())
    }

    pub fn with_probes(page: Arc<dyn PageDocument>, probes: Vec<TargetProbe>) -> Self {
        Self { page, probes }
    }

    /// First probe that yields an editable element
    pub fn resolve_target(&self) -> Option<(ElementId, ElementKind)> {
        self.probes.iter().find_map(|probe| {
            let id = probe.locate(self.page.as_ref())?;
            let kind = self.page.element_kind(id)?;
            tracing::debug!("[Insertion] Target {} found via {}", id, probe.describe());
            Some((id, kind))
        })
    }

    pub async fn insert(&self, text: &str) -> AppResult<InsertionOutcome> {
        let Some((target, kind)) = self.resolve_target() else {
            tracing::warn!("[Insertion] No editable target on {}", self.page.url());
            return Err(AppError::NoEditableTarget);
        };

        if kind.is_text_control() {
            let current = self.page.value(target).unwrap_or_default();
            let (start, end) = self.page.selection_range(target).unwrap_or((0, 0));
            let (next, caret) = splice_chars(&current, start, end, text);

            self.page.set_value(target, &next);
            self.page.set_selection_range(target, caret, caret);
            self.page.dispatch_input_event(target);

            return Ok(InsertionOutcome {
                target,
                method: InsertionMethod::Splice,
            });
        }

        // Content-editable: the insert command acts on the focused element
        if self.page.active_element() != Some(target) {
            self.page.focus(target);
        }
        if self.page.exec_command(EditCommand::InsertText(text.to_string())) {
            Ok(InsertionOutcome {
                target,
                method: InsertionMethod::InsertCommand,
            })
        } else {
            tracing::warn!("[Insertion] insertText rejected by {}", target);
            Err(AppError::NoEditableTarget)
        }
    }
}

/// Replace chars `start..end` of `value` with `text`; returns the new value and the
/// caret position just after the inserted text. Offsets are clamped to the value.
pub fn splice_chars(value: &str, start: usize, end: usize, text: &str) -> (String, usize) {
    let len = value.chars().count();
    let start = start.min(len);
    let end = end.clamp(start, len);

    let mut next: String = value.chars().take(start).collect();
    next.push_str(text);
    next.extend(value.chars().skip(end));
    (next, start + text.chars().count())
}
