use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use std::sync::Arc;
use std::time::Duration;

use crate::shared::error::{AppError, AppResult};
use crate::system::clipboard::ClipboardCapability;
use crate::system::page::{EditCommand, PageDocument};

/// Upper bound on waiting for a paste event
pub const PASTE_TIMEOUT: Duration = Duration::from_millis(100);

/// Sync strategy metadata, statically dispatched
#[enum_dispatch]
pub trait StrategyInfo: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;
}

#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write(&self, text: &str) -> AppResult<()>;
}

#[async_trait]
pub trait ClipboardReader: Send + Sync {
    async fn read(&self) -> AppResult<String>;
}

/// Direct clipboard API of the hosting context
#[derive(Clone)]
pub struct PrivilegedClipboard {
    capability: Arc<dyn ClipboardCapability>,
}

impl PrivilegedClipboard {
    pub fn new(capability: Arc<dyn ClipboardCapability>) -> Self {
        Self { capability }
    }
}

impl StrategyInfo for PrivilegedClipboard {
    fn name(&self) -> &'static str {
        "privileged"
    }

    fn is_available(&self) -> bool {
        self.capability.is_available()
    }
}

#[async_trait]
impl ClipboardWriter for PrivilegedClipboard {
    async fn write(&self, text: &str) -> AppResult<()> {
        self.capability.write_text(text).await
    }
}

#[async_trait]
impl ClipboardReader for PrivilegedClipboard {
    async fn read(&self) -> AppResult<String> {
        self.capability.read_text().await
    }
}

/// Hidden textarea holding the text, selected, then the page's copy command
#[derive(Clone)]
pub struct CopyCommandFallback {
    page: Arc<dyn PageDocument>,
}

impl CopyCommandFallback {
    pub fn new(page: Arc<dyn PageDocument>) -> Self {
        Self { page }
    }
}

impl StrategyInfo for CopyCommandFallback {
    fn name(&self) -> &'static str {
        "copy-command"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
impl ClipboardWriter for CopyCommandFallback {
    async fn write(&self, text: &str) -> AppResult<()> {
        let previous_focus = self.page.active_element();
        let surface = self.page.create_text_surface(text);
        self.page.select_all(surface);

        let copied = self.page.exec_command(EditCommand::Copy);

        self.page.remove_element(surface);
        if let Some(id) = previous_focus {
            self.page.focus(id);
        }

        if copied {
            Ok(())
        } else {
            Err(AppError::Clipboard("Copy command was rejected".to_string()))
        }
    }
}

/// Focused hidden textarea, the page's paste command, and a paste-event listener
/// bounded by `PASTE_TIMEOUT`. No paste event within the bound reads as empty.
#[derive(Clone)]
pub struct PasteEventFallback {
    page: Arc<dyn PageDocument>,
    timeout: Duration,
}

impl PasteEventFallback {
    pub fn new(page: Arc<dyn PageDocument>) -> Self {
        Self {
            page,
            timeout: PASTE_TIMEOUT,
        }
    }
}

impl StrategyInfo for PasteEventFallback {
    fn name(&self) -> &'static str {
        "paste-event"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
impl ClipboardReader for PasteEventFallback {
    async fn read(&self) -> AppResult<String> {
        let previous_focus = self.page.active_element();
        let surface = self.page.create_text_surface("");
        self.page.focus(surface);

        let pasted = self.page.listen_for_paste();
        if !self.page.exec_command(EditCommand::Paste) {
            tracing::debug!("[Clipboard] Paste command rejected, waiting for event anyway");
        }

        let outcome = tokio::time::timeout(self.timeout, pasted).await;

        self.page.remove_element(surface);
        if let Some(id) = previous_focus {
            self.page.focus(id);
        }

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(_)) => Err(AppError::Clipboard("Paste listener closed".to_string())),
            Err(_) => {
                tracing::debug!("[Clipboard] No paste event within {:?}", self.timeout);
                Ok(String::new())
            }
        }
    }
}

/// Write chain entries
#[enum_dispatch(StrategyInfo)]
#[derive(Clone)]
pub enum WriteStrategy {
    Privileged(PrivilegedClipboard),
    CopyCommand(CopyCommandFallback),
}

impl WriteStrategy {
    pub async fn write(&self, text: &str) -> AppResult<()> {
        // Manual dispatch for async methods (enum_dispatch doesn't support async)
        match self {
            WriteStrategy::Privileged(s) => s.write(text).await,
            WriteStrategy::CopyCommand(s) => s.write(text).await,
        }
    }
}

/// Read chain entries
#[enum_dispatch(StrategyInfo)]
#[derive(Clone)]
pub enum ReadStrategy {
    Privileged(PrivilegedClipboard),
    PasteEvent(PasteEventFallback),
}

impl ReadStrategy {
    pub async fn read(&self) -> AppResult<String> {
        match self {
            ReadStrategy::Privileged(s) => s.read().await,
            ReadStrategy::PasteEvent(s) => s.read().await,
        }
    }
}
