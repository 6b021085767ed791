//! Clipboard broker
//!
//! Reads and writes go through an ordered chain of strategies; the first one that
//! succeeds wins and the broker only fails when every strategy has failed.

pub mod strategy;

use std::sync::Arc;

use crate::shared::error::{AppError, AppResult};
use crate::system::clipboard::ClipboardCapability;
use crate::system::page::PageDocument;

pub use strategy::{
    CopyCommandFallback, PasteEventFallback, PrivilegedClipboard, ReadStrategy, StrategyInfo,
    WriteStrategy, PASTE_TIMEOUT,
};

#[derive(Clone)]
pub struct ClipboardBroker {
    writers: Vec<WriteStrategy>,
    readers: Vec<ReadStrategy>,
}

impl ClipboardBroker {
    pub fn new(writers: Vec<WriteStrategy>, readers: Vec<ReadStrategy>) -> Self {
        Self { writers, readers }
    }

    /// Privileged capability first, page commands as fallback
    pub fn standard(capability: Arc<dyn ClipboardCapability>, page: Arc<dyn PageDocument>) -> Self {
        let privileged = PrivilegedClipboard::new(capability);
        Self::new(
            vec![
                privileged.clone().into(),
                CopyCommandFallback::new(page.clone()).into(),
            ],
            vec![
                privileged.into(),
                PasteEventFallback::new(page).into(),
            ],
        )
    }

    /// Write `text`, returning the name of the strategy that succeeded
    pub async fn write(&self, text: &str) -> AppResult<&'static str> {
        let mut failures = Vec::new();

        for strategy in &self.writers {
            if !strategy.is_available() {
                failures.push(format!("{}: unavailable", strategy.name()));
                continue;
            }
            match strategy.write(text).await {
                Ok(()) => {
                    tracing::debug!("[Clipboard] Wrote {} chars via {}", text.chars().count(), strategy.name());
                    return Ok(strategy.name());
                }
                Err(e) => {
                    tracing::warn!("[Clipboard] {} write failed: {}", strategy.name(), e);
                    failures.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        Err(AppError::Clipboard(format!("All write strategies failed ({})", failures.join("; "))))
    }

    /// Read the clipboard. An empty string is a valid result.
    pub async fn read(&self) -> AppResult<String> {
        let mut failures = Vec::new();

        for strategy in &self.readers {
            if !strategy.is_available() {
                failures.push(format!("{}: unavailable", strategy.name()));
                continue;
            }
            match strategy.read().await {
                Ok(text) => {
                    tracing::debug!("[Clipboard] Read {} chars via {}", text.chars().count(), strategy.name());
                    return Ok(text);
                }
                Err(e) => {
                    tracing::warn!("[Clipboard] {} read failed: {}", strategy.name(), e);
                    failures.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        Err(AppError::Clipboard(format!("All read strategies failed ({})", failures.join("; "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::clipboard::MemoryClipboard;
    use crate::system::page::SimulatedPage;
    use std::time::{Duration, Instant};

    fn setup(os: &MemoryClipboard) -> (Arc<SimulatedPage>, ClipboardBroker) {
        let page = Arc::new(SimulatedPage::new("https://claude.ai/chat", os.clone()));
        // Privileged capability and page commands share the same OS buffer
        let capability: Arc<dyn ClipboardCapability> = Arc::new(os.clone());
        let broker = ClipboardBroker::standard(capability, page.clone());
        (page, broker)
    }

    #[tokio::test]
    async fn test_write_prefers_privileged() {
        let os = MemoryClipboard::new();
        let (page, broker) = setup(&os);
        assert_eq!(broker.write("hello").await.unwrap(), "privileged");
        assert_eq!(os.get(), "hello");
        assert_eq!(page.element_count(), 0);
    }

    #[tokio::test]
    async fn test_write_falls_back_to_copy_command() {
        let os = MemoryClipboard::new();
        os.set_write_allowed(false);
        let (page, broker) = setup(&os);
        let focused = page.add_element("textarea", &[]);
        page.focus(focused);

        assert_eq!(broker.write("fallback").await.unwrap(), "copy-command");
        assert_eq!(os.get(), "fallback");
        // Surface cleaned up and focus restored
        assert_eq!(page.element_count(), 1);
        assert_eq!(page.active_element(), Some(focused));
    }

    #[tokio::test]
    async fn test_write_fails_when_all_strategies_fail() {
        let os = MemoryClipboard::new();
        os.set_available(false);
        let (page, broker) = setup(&os);
        page.set_copy_allowed(false);

        let err = broker.write("x").await.unwrap_err();
        assert!(matches!(err, AppError::Clipboard(_)));
        assert!(err.to_string().contains("privileged: unavailable"));
    }

    #[tokio::test]
    async fn test_read_falls_back_to_paste_event() {
        let os = MemoryClipboard::with_text("[GAP:START]x[GAP:END]");
        os.set_read_allowed(false);
        let (page, broker) = setup(&os);

        assert_eq!(broker.read().await.unwrap(), "[GAP:START]x[GAP:END]");
        assert_eq!(page.element_count(), 0);
    }

    #[tokio::test]
    async fn test_read_exhausted_resolves_empty_within_bound() {
        let os = MemoryClipboard::with_text("hidden");
        os.set_read_allowed(false);
        let (page, broker) = setup(&os);
        page.set_paste_allowed(false);

        let started = Instant::now();
        assert_eq!(broker.read().await.unwrap(), "");
        assert!(started.elapsed() < PASTE_TIMEOUT + Duration::from_millis(400));
        assert_eq!(page.element_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_is_an_error() {
        let broker = ClipboardBroker::new(Vec::new(), Vec::new());
        assert!(matches!(broker.read().await, Err(AppError::Clipboard(_))));
    }
}
