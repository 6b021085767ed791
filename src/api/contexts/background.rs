use async_trait::async_trait;
use serde_json::{json, Value};

use super::ActiveTab;
use crate::api::commands::{CommandOutcome, KeyboardCommand};
use crate::api::router::{ContextHandler, MessageRouter};
use crate::core::gap::{is_gap_content, ChatId, ChatOrigin, GapEnvelope};
use crate::core::service::{GapServiceClient, TransformRequest, WrapRequest, DEFAULT_ROLE};
use crate::shared::emit::Notifier;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{
    ActionKind, ActionRequest, ClipboardResult, ContextKind, PlatformId, SelectionResult, TextPayload,
    TransformPayload, WrapPayload,
};

/// Privileged context: talks to the GAP service and runs keyboard commands
#[derive(Clone)]
pub struct BackgroundContext {
    service: GapServiceClient,
    router: MessageRouter,
    tab: ActiveTab,
    notifier: Notifier,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl BackgroundContext {
    pub fn new(service: GapServiceClient, router: MessageRouter, tab: ActiveTab, notifier: Notifier) -> Self {
        Self { service, router, tab, notifier }
    }

    /// Fill in the defaults of a wrap request and call the service
    pub async fn wrap(&self, payload: WrapPayload) -> AppResult<GapEnvelope> {
        payload.validate()?;
        let request = WrapRequest {
            content: payload.content,
            platform: non_empty(payload.platform).unwrap_or_else(|| PlatformId::Generic.to_string()),
            chat_id: non_empty(payload.chat_id)
                .unwrap_or_else(|| ChatId::generate(ChatOrigin::Extension).into()),
            thread_id: non_empty(payload.thread_id),
            role: non_empty(payload.role).unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        };
        self.service.wrap(&request).await
    }

    pub async fn transform(&self, payload: TransformPayload) -> AppResult<String> {
        payload.validate()?;
        let request = TransformRequest {
            gap_markdown: payload.gap_markdown,
            target_platform: non_empty(payload.target_platform)
                .unwrap_or_else(|| PlatformId::Generic.to_string()),
            context_additions: payload.context_additions,
        };
        self.service.transform(&request).await
    }

    /// Run a keyboard command against the active tab.
    ///
    /// A failed command is reported on the tab before the error is returned.
    pub async fn run_command(&self, command: KeyboardCommand) -> AppResult<CommandOutcome> {
        tracing::info!("[Background] Command {}", command);
        let outcome = match command {
            KeyboardCommand::WrapSelection => self.wrap_selection_command().await,
            KeyboardCommand::QuickTransform => self.quick_transform_command().await,
        };
        if let Err(e) = &outcome {
            self.notifier.error(format!("Error: {}", e));
        }
        outcome
    }

    async fn wrap_selection_command(&self) -> AppResult<CommandOutcome> {
        let selection: SelectionResult = self
            .router
            .send(ActionRequest::new(ActionKind::GetSelection))
            .await?
            .result_as()?;
        if selection.selection.is_empty() {
            return Ok(CommandOutcome::skipped("no selection"));
        }

        let mut payload = WrapPayload::new(selection.selection);
        payload.platform = Some(self.tab.platform().to_string());
        payload.chat_id = Some(ChatId::generate(ChatOrigin::Command).into());
        let wrapped = self.wrap(payload).await?.into_inner();

        self.copy_in_page(&wrapped).await?;
        Ok(CommandOutcome::Completed { text: wrapped })
    }

    async fn quick_transform_command(&self) -> AppResult<CommandOutcome> {
        let platform = self.tab.platform();

        let response = self.router.send(ActionRequest::new(ActionKind::GetClipboard)).await?;
        let clipboard = match response.result_as::<ClipboardResult>() {
            Ok(result) => result.clipboard,
            Err(e) => {
                tracing::debug!("[Background] Clipboard unavailable: {}", e);
                return Ok(CommandOutcome::skipped("clipboard unavailable"));
            }
        };
        if !is_gap_content(&clipboard) {
            return Ok(CommandOutcome::skipped("clipboard does not hold a GAP envelope"));
        }

        let mut payload = TransformPayload::new(clipboard);
        payload.target_platform = Some(platform.to_string());
        let transformed = self.transform(payload).await?;

        self.copy_in_page(&transformed).await?;
        Ok(CommandOutcome::Completed { text: transformed })
    }

    async fn copy_in_page(&self, text: &str) -> AppResult<()> {
        let request = ActionRequest::with_payload(
            ActionKind::CopyToClipboard,
            &TextPayload { text: text.to_string() },
        )?;
        self.router.request(request).await.map(|_| ())
    }
}

#[async_trait]
impl ContextHandler for BackgroundContext {
    fn context(&self) -> ContextKind {
        ContextKind::Background
    }

    async fn handle(&self, kind: ActionKind, request: ActionRequest) -> AppResult<Value> {
        match kind {
            ActionKind::WrapContent => {
                let envelope = self.wrap(request.payload_as()?).await?;
                Ok(Value::String(envelope.into_inner()))
            }
            ActionKind::TransformContent => {
                let content = self.transform(request.payload_as()?).await?;
                Ok(Value::String(content))
            }
            ActionKind::CheckService => {
                let health = self.service.check_health().await?;
                Ok(json!(health))
            }
            other => Err(AppError::Context(format!("{} is not handled by the background context", other))),
        }
    }
}
