//! The three execution contexts
//!
//! Background owns the service client and settings, content owns the page, popup
//! is a short-lived originator with its own document. They only talk through the
//! router.

pub mod background;
pub mod content;
pub mod popup;

use std::sync::Arc;

use crate::shared::types::PlatformId;
use crate::system::page::PageDocument;

pub use background::BackgroundContext;
pub use content::ContentContext;
pub use popup::PopupContext;

/// Outside view of the tab the user is looking at; only its URL is visible
#[derive(Clone)]
pub struct ActiveTab {
    page: Arc<dyn PageDocument>,
}

impl ActiveTab {
    pub fn new(page: Arc<dyn PageDocument>) -> Self {
        Self { page }
    }

    pub fn url(&self) -> String {
        self.page.url()
    }

    pub fn platform(&self) -> PlatformId {
        crate::core::context::detect_platform(&self.url())
    }
}
