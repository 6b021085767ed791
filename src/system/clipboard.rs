//! Privileged clipboard access
//!
//! `SystemClipboard` talks to the OS clipboard; `MemoryClipboard` is a process-local
//! stand-in whose permissions can be toggled, used by the simulated page and tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::shared::error::{AppError, AppResult};

/// Direct clipboard read/write capability (the privileged strategy's backend)
#[async_trait]
pub trait ClipboardCapability: Send + Sync {
    /// Whether the capability exists at all in this context
    fn is_available(&self) -> bool {
        true
    }

    async fn read_text(&self) -> AppResult<String>;

    async fn write_text(&self, text: &str) -> AppResult<()>;
}

/// OS clipboard through `cli-clipboard`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait]
impl ClipboardCapability for SystemClipboard {
    async fn read_text(&self) -> AppResult<String> {
        use cli_clipboard::{ClipboardContext, ClipboardProvider};

        tokio::task::spawn_blocking(|| {
            ClipboardContext::new()
                .and_then(|mut ctx| ctx.get_contents())
                .map_err(|e| AppError::Clipboard(e.to_string()))
        })
        .await
        .map_err(|e| AppError::Clipboard(format!("Clipboard task failed: {}", e)))?
    }

    async fn write_text(&self, text: &str) -> AppResult<()> {
        use cli_clipboard::{ClipboardContext, ClipboardProvider};

        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            ClipboardContext::new()
                .and_then(|mut ctx| ctx.set_contents(text))
                .map_err(|e| AppError::Clipboard(e.to_string()))
        })
        .await
        .map_err(|e| AppError::Clipboard(format!("Clipboard task failed: {}", e)))?
    }
}

/// In-memory clipboard with switchable permissions.
///
/// Clones share the same buffer, so a page and a privileged capability built from
/// the same `MemoryClipboard` see each other's writes.
#[derive(Debug, Clone)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<String>>,
    available: Arc<AtomicBool>,
    read_allowed: Arc<AtomicBool>,
    write_allowed: Arc<AtomicBool>,
}

impl Default for MemoryClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self {
            contents: Arc::new(Mutex::new(String::new())),
            available: Arc::new(AtomicBool::new(true)),
            read_allowed: Arc::new(AtomicBool::new(true)),
            write_allowed: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.set(text);
        clipboard
    }

    /// Current buffer, bypassing permissions
    pub fn get(&self) -> String {
        self.contents.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Replace the buffer, bypassing permissions
    pub fn set(&self, text: impl Into<String>) {
        if let Ok(mut contents) = self.contents.lock() {
            *contents = text.into();
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_read_allowed(&self, allowed: bool) {
        self.read_allowed.store(allowed, Ordering::SeqCst);
    }

    pub fn set_write_allowed(&self, allowed: bool) {
        self.write_allowed.store(allowed, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClipboardCapability for MemoryClipboard {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn read_text(&self) -> AppResult<String> {
        if !self.read_allowed.load(Ordering::SeqCst) {
            return Err(AppError::Clipboard("Read permission denied".to_string()));
        }
        Ok(self.get())
    }

    async fn write_text(&self, text: &str) -> AppResult<()> {
        if !self.write_allowed.load(Ordering::SeqCst) {
            return Err(AppError::Clipboard("Write permission denied".to_string()));
        }
        self.set(text);
        Ok(())
    }
}
