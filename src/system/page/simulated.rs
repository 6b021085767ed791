//! In-memory page used by the CLI driver and tests.
//!
//! Models the small slice of DOM behaviour the extension relies on: focus, text
//! control values and selection offsets, content-editable regions, `execCommand`
//! copy/paste/insertText backed by a shared `MemoryClipboard`, and the single
//! notification overlay.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;

use super::selector::Selector;
use super::{EditCommand, ElementId, ElementKind, PageDocument};
use crate::shared::emit::NotificationSurface;
use crate::shared::events::Notification;
use crate::system::clipboard::MemoryClipboard;

#[derive(Debug, Clone)]
struct SimElement {
    id: ElementId,
    tag: String,
    attrs: HashMap<String, String>,
    value: String,
    selection: (usize, usize),
}

impl SimElement {
    fn kind(&self) -> ElementKind {
        match self.tag.as_str() {
            "textarea" => ElementKind::TextArea,
            "input" => ElementKind::Input,
            _ if self.attrs.get("contenteditable").map(String::as_str) == Some("true") => {
                ElementKind::ContentEditable
            }
            _ => ElementKind::Other,
        }
    }

    fn selected_text(&self) -> String {
        let (start, end) = self.selection;
        self.value.chars().skip(start).take(end.saturating_sub(start)).collect()
    }

    fn replace_selection(&mut self, text: &str) {
        let len = self.value.chars().count();
        let start = self.selection.0.min(len);
        let end = self.selection.1.clamp(start, len);
        let mut next: String = self.value.chars().take(start).collect();
        next.push_str(text);
        next.extend(self.value.chars().skip(end));
        self.value = next;
        let caret = start + text.chars().count();
        self.selection = (caret, caret);
    }
}

struct PageState {
    url: String,
    elements: Vec<SimElement>,
    focused: Option<ElementId>,
    page_selection: String,
    next_id: u64,
    copy_allowed: bool,
    paste_allowed: bool,
    paste_listeners: Vec<oneshot::Sender<String>>,
    input_events: Vec<ElementId>,
    notifications: Vec<Notification>,
    active_notification: Option<Notification>,
}

impl PageState {
    fn element(&self, id: ElementId) -> Option<&SimElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut SimElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    fn focused_mut(&mut self) -> Option<&mut SimElement> {
        let id = self.focused?;
        self.element_mut(id)
    }
}

pub struct SimulatedPage {
    state: Mutex<PageState>,
    clipboard: MemoryClipboard,
}

impl SimulatedPage {
    pub fn new(url: impl Into<String>, clipboard: MemoryClipboard) -> Self {
        Self {
            state: Mutex::new(PageState {
                url: url.into(),
                elements: Vec::new(),
                focused: None,
                page_selection: String::new(),
                next_id: 1,
                copy_allowed: true,
                paste_allowed: true,
                paste_listeners: Vec::new(),
                input_events: Vec::new(),
                notifications: Vec::new(),
                active_notification: None,
            }),
            clipboard,
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an element with the given tag and attributes
    pub fn add_element(&self, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
        let mut state = self.state();
        let id = ElementId(state.next_id);
        state.next_id += 1;
        state.elements.push(SimElement {
            id,
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            value: String::new(),
            selection: (0, 0),
        });
        id
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state().url = url.into();
    }

    pub fn set_page_selection(&self, text: impl Into<String>) {
        self.state().page_selection = text.into();
    }

    /// Let or stop `execCommand('copy')` from succeeding
    pub fn set_copy_allowed(&self, allowed: bool) {
        self.state().copy_allowed = allowed;
    }

    /// Let or stop `execCommand('paste')` from succeeding
    pub fn set_paste_allowed(&self, allowed: bool) {
        self.state().paste_allowed = allowed;
    }

    pub fn blur(&self) {
        self.state().focused = None;
    }

    pub fn clipboard(&self) -> &MemoryClipboard {
        &self.clipboard
    }

    pub fn element_count(&self) -> usize {
        self.state().elements.len()
    }

    pub fn input_events(&self) -> Vec<ElementId> {
        self.state().input_events.clone()
    }

    /// Every notification ever shown, oldest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    /// The overlay currently on screen, if it has not dismissed itself yet
    pub fn active_notification(&self) -> Option<Notification> {
        let state = self.state();
        state.active_notification.clone().filter(|n| {
            let expires = n.timestamp + Duration::milliseconds(n.dismiss_after_ms as i64);
            Utc::now() < expires
        })
    }
}

impl NotificationSurface for SimulatedPage {
    fn show_notification(&self, notification: &Notification) {
        let mut state = self.state();
        // Only one overlay at a time; a new one replaces the old
        state.active_notification = Some(notification.clone());
        state.notifications.push(notification.clone());
    }
}

impl PageDocument for SimulatedPage {
    fn url(&self) -> String {
        self.state().url.clone()
    }

    fn selection_text(&self) -> String {
        self.state().page_selection.clone()
    }

    fn active_element(&self) -> Option<ElementId> {
        self.state().focused
    }

    fn element_kind(&self, id: ElementId) -> Option<ElementKind> {
        self.state().element(id).map(SimElement::kind)
    }

    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("[Page] {}", e);
                return None;
            }
        };
        self.state()
            .elements
            .iter()
            .find(|e| selector.matches(&e.tag, &e.attrs))
            .map(|e| e.id)
    }

    fn value(&self, id: ElementId) -> Option<String> {
        self.state().element(id).map(|e| e.value.clone())
    }

    fn set_value(&self, id: ElementId, value: &str) {
        if let Some(element) = self.state().element_mut(id) {
            element.value = value.to_string();
            let end = element.value.chars().count();
            element.selection = (end, end);
        }
    }

    fn selection_range(&self, id: ElementId) -> Option<(usize, usize)> {
        self.state().element(id).map(|e| e.selection)
    }

    fn set_selection_range(&self, id: ElementId, start: usize, end: usize) {
        if let Some(element) = self.state().element_mut(id) {
            let len = element.value.chars().count();
            let start = start.min(len);
            element.selection = (start, end.clamp(start, len));
        }
    }

    fn focus(&self, id: ElementId) {
        let mut state = self.state();
        if state.element(id).is_some() {
            state.focused = Some(id);
        }
    }

    fn create_text_surface(&self, value: &str) -> ElementId {
        let id = self.add_element("textarea", &[("style", "position:fixed;left:-9999px")]);
        self.set_value(id, value);
        id
    }

    fn remove_element(&self, id: ElementId) {
        let mut state = self.state();
        state.elements.retain(|e| e.id != id);
        if state.focused == Some(id) {
            state.focused = None;
        }
    }

    fn select_all(&self, id: ElementId) {
        let mut state = self.state();
        if let Some(element) = state.element_mut(id) {
            element.selection = (0, element.value.chars().count());
        }
        state.focused = Some(id);
    }

    fn exec_command(&self, command: EditCommand) -> bool {
        let mut state = self.state();
        match command {
            EditCommand::Copy => {
                if !state.copy_allowed {
                    return false;
                }
                let Some(text) = state.focused_mut().map(|e| e.selected_text()) else {
                    return false;
                };
                self.clipboard.set(text);
                true
            }
            EditCommand::Paste => {
                if !state.paste_allowed {
                    return false;
                }
                let text = self.clipboard.get();
                for listener in state.paste_listeners.drain(..) {
                    let _ = listener.send(text.clone());
                }
                if let Some(element) = state.focused_mut().filter(|e| e.kind().is_editable()) {
                    element.replace_selection(&text);
                }
                true
            }
            EditCommand::InsertText(text) => {
                match state.focused_mut().filter(|e| e.kind().is_editable()) {
                    Some(element) => {
                        element.replace_selection(&text);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn dispatch_input_event(&self, id: ElementId) {
        self.state().input_events.push(id);
    }

    fn listen_for_paste(&self) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state();
        state.paste_listeners.retain(|listener| !listener.is_closed());
        state.paste_listeners.push(tx);
        rx
    }
}
