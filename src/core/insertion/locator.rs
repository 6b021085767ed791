use enum_dispatch::enum_dispatch;

use crate::system::page::{ElementId, PageDocument};

/// Chat input selectors, most specific first
pub const CHAT_INPUT_SELECTORS: [&str; 4] = [
    // Claude
    r#"div[contenteditable="true"]"#,
    // ChatGPT
    "textarea[data-id]",
    // Gemini
    r#"textarea[aria-label*="chat"]"#,
    "textarea",
];

/// One way of finding the element text should go into
#[enum_dispatch]
pub trait TargetLocator {
    fn locate(&self, page: &dyn PageDocument) -> Option<ElementId>;

    fn describe(&self) -> String;
}

/// The focused element, if it is editable
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusedProbe;

impl TargetLocator for FocusedProbe {
    fn locate(&self, page: &dyn PageDocument) -> Option<ElementId> {
        page.active_element()
            .filter(|id| page.element_kind(*id).is_some_and(|k| k.is_editable()))
    }

    fn describe(&self) -> String {
        "focused element".to_string()
    }
}

/// First editable element matching a selector
#[derive(Debug, Clone)]
pub struct SelectorProbe {
    selector: String,
}

impl SelectorProbe {
    pub fn new(selector: impl Into<String>) -> Self {
        Self { selector: selector.into() }
    }
}

impl TargetLocator for SelectorProbe {
    fn locate(&self, page: &dyn PageDocument) -> Option<ElementId> {
        page.query_selector(&self.selector)
            .filter(|id| page.element_kind(*id).is_some_and(|k| k.is_editable()))
    }

    fn describe(&self) -> String {
        format!("selector {}", self.selector)
    }
}

#[enum_dispatch(TargetLocator)]
#[derive(Debug, Clone)]
pub enum TargetProbe {
    Focused(FocusedProbe),
    Selector(SelectorProbe),
}

/// Focused element first, then the chat input selectors in order
pub fn default_probes() -> Vec<TargetProbe> {
    let mut probes = vec![TargetProbe::from(FocusedProbe)];
    probes.extend(
        CHAT_INPUT_SELECTORS
            .iter()
            .map(|s| TargetProbe::from(SelectorProbe::new(*s))),
    );
    probes
}
