//! Page document abstraction
//!
//! The content context never touches a real DOM directly; it goes through
//! `PageDocument`, which exposes just the operations the clipboard fallbacks and the
//! insertion engine need.

pub mod selector;
pub mod simulated;

use std::fmt;
use tokio::sync::oneshot;

use crate::shared::emit::NotificationSurface;

pub use selector::Selector;
pub use simulated::SimulatedPage;

/// Handle to an element of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    TextArea,
    Input,
    ContentEditable,
    Other,
}

impl ElementKind {
    /// Plain text controls with a value and selection offsets
    pub fn is_text_control(&self) -> bool {
        matches!(self, ElementKind::TextArea | ElementKind::Input)
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self, ElementKind::Other)
    }
}

/// Editing commands executed against the focused element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Copy,
    Paste,
    InsertText(String),
}

/// The DOM operations available to the content context.
///
/// Offsets are in characters. Commands return `false` when the page refuses them,
/// mirroring the platform's boolean result.
pub trait PageDocument: NotificationSurface {
    fn url(&self) -> String;

    /// Text of the user's current page selection (empty if none)
    fn selection_text(&self) -> String;

    fn active_element(&self) -> Option<ElementId>;

    fn element_kind(&self, id: ElementId) -> Option<ElementKind>;

    /// First element matching `selector` in document order
    fn query_selector(&self, selector: &str) -> Option<ElementId>;

    fn value(&self, id: ElementId) -> Option<String>;

    fn set_value(&self, id: ElementId, value: &str);

    fn selection_range(&self, id: ElementId) -> Option<(usize, usize)>;

    fn set_selection_range(&self, id: ElementId, start: usize, end: usize);

    fn focus(&self, id: ElementId);

    /// Append an off-screen textarea holding `value`
    fn create_text_surface(&self, value: &str) -> ElementId;

    fn remove_element(&self, id: ElementId);

    fn select_all(&self, id: ElementId);

    fn exec_command(&self, command: EditCommand) -> bool;

    /// Fire a bubbling `input` event on `id`
    fn dispatch_input_event(&self, id: ElementId);

    /// Receive the text of the next paste event
    fn listen_for_paste(&self) -> oneshot::Receiver<String>;
}
