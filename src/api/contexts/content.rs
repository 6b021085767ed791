use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::router::{ContextHandler, MessageRouter};
use crate::core::clipboard::ClipboardBroker;
use crate::core::context::detect_platform;
use crate::core::gap::{extract_entities, is_gap_content, ChatId, ChatOrigin};
use crate::core::insertion::InsertionEngine;
use crate::shared::emit::Notifier;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{
    ActionKind, ActionRequest, ClipboardResult, ContextKind, SelectionResult, SuccessResult, TextPayload,
    TransformPayload, WrapPayload,
};
use crate::system::page::PageDocument;

/// Pseudo platform the service uses to report entities instead of formatting
const ANALYSIS_PLATFORM: &str = "analysis";

/// Per-page context: owns the document, its clipboard fallbacks and insertion
#[derive(Clone)]
pub struct ContentContext {
    page: Arc<dyn PageDocument>,
    broker: ClipboardBroker,
    engine: InsertionEngine,
    notifier: Notifier,
    router: MessageRouter,
}

impl ContentContext {
    pub fn new(
        page: Arc<dyn PageDocument>,
        broker: ClipboardBroker,
        notifier: Notifier,
        router: MessageRouter,
    ) -> Self {
        let engine = InsertionEngine::new(page.clone());
        Self {
            page,
            broker,
            engine,
            notifier,
            router,
        }
    }

    async fn read_clipboard(&self) -> AppResult<String> {
        self.broker.read().await.map_err(|e| {
            tracing::warn!("[Content] {}", e);
            AppError::Clipboard("Cannot read clipboard".to_string())
        })
    }

    async fn copy(&self, text: &str) -> AppResult<()> {
        match self.broker.write(text).await {
            Ok(_) => {
                self.notifier.success("Copied to clipboard!");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to copy");
                Err(e)
            }
        }
    }

    async fn insert(&self, text: &str) -> AppResult<()> {
        match self.engine.insert(text).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.notifier.report(&e);
                Err(e)
            }
        }
    }

    /// Wrap the page selection and put the envelope on the clipboard
    pub async fn wrap_current_selection(&self) -> AppResult<Option<String>> {
        let selection = self.page.selection_text();
        if selection.is_empty() {
            self.notifier.warning("Please select some text first");
            return Ok(None);
        }

        let mut payload = WrapPayload::new(selection);
        payload.platform = Some(detect_platform(&self.page.url()).to_string());
        payload.chat_id = Some(ChatId::generate(ChatOrigin::Content).into());

        let wrapped = match self.request_text(ActionKind::WrapContent, &payload).await {
            Ok(text) => text,
            Err(e) => {
                self.notifier.error(format!("Error: {}", e));
                return Err(e);
            }
        };

        if let Err(e) = self.broker.write(&wrapped).await {
            self.notifier.error("Failed to copy");
            return Err(e);
        }
        self.notifier.success("Selection wrapped and copied!");
        Ok(Some(wrapped))
    }

    /// Transform the envelope on the clipboard for this page and insert it at the cursor
    pub async fn transform_from_clipboard(&self) -> AppResult<Option<String>> {
        let text = match self.read_clipboard().await {
            Ok(text) => text,
            Err(e) => {
                self.notifier.report(&e);
                return Err(e);
            }
        };
        if !is_gap_content(&text) {
            self.notifier.warning("No GAP content in clipboard");
            return Ok(None);
        }

        let mut payload = TransformPayload::new(text);
        payload.target_platform = Some(detect_platform(&self.page.url()).to_string());

        let transformed = match self.request_text(ActionKind::TransformContent, &payload).await {
            Ok(text) => text,
            Err(e) => {
                self.notifier.error(format!("Error: {}", e));
                return Err(e);
            }
        };

        self.insert(&transformed).await?;
        self.notifier.success("Content transformed and inserted!");
        Ok(Some(transformed))
    }

    /// Ask the service which entities in the selection are ambiguous
    pub async fn detect_entities_in_selection(&self) -> AppResult<Vec<String>> {
        let selection = self.page.selection_text();
        if selection.is_empty() {
            self.notifier.warning("Please select some text first");
            return Ok(Vec::new());
        }

        let mut payload = WrapPayload::new(selection);
        payload.platform = Some(ANALYSIS_PLATFORM.to_string());
        payload.chat_id = Some(ChatId::generate(ChatOrigin::Detect).into());

        let envelope = match self.request_text(ActionKind::WrapContent, &payload).await {
            Ok(text) => text,
            Err(e) => {
                self.notifier.error(format!("Error: {}", e));
                return Err(e);
            }
        };

        let entities = extract_entities(&envelope);
        if entities.is_empty() {
            self.notifier.info("No ambiguous entities detected");
        } else {
            self.notifier.info(format!("Found entities: {}", entities.join(", ")));
        }
        Ok(entities)
    }

    async fn request_text<T: serde::Serialize>(&self, kind: ActionKind, payload: &T) -> AppResult<String> {
        let request = ActionRequest::with_payload(kind, payload)?;
        self.router.send(request).await?.result_as::<String>()
    }
}

#[async_trait]
impl ContextHandler for ContentContext {
    fn context(&self) -> ContextKind {
        ContextKind::Content
    }

    async fn handle(&self, kind: ActionKind, request: ActionRequest) -> AppResult<Value> {
        match kind {
            ActionKind::GetSelection => Ok(json!(SelectionResult {
                selection: self.page.selection_text(),
            })),
            ActionKind::GetClipboard => {
                let clipboard = self.read_clipboard().await?;
                Ok(json!(ClipboardResult { clipboard }))
            }
            ActionKind::CopyToClipboard => {
                let payload: TextPayload = request.payload_as()?;
                self.copy(&payload.text).await?;
                Ok(json!(SuccessResult { success: true }))
            }
            ActionKind::InsertText => {
                let payload: TextPayload = request.payload_as()?;
                self.insert(&payload.text).await?;
                Ok(json!(SuccessResult { success: true }))
            }
            other => Err(AppError::Context(format!("{} is not handled by the content context", other))),
        }
    }
}
