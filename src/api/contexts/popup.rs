use super::ActiveTab;
use crate::api::commands::ServiceStatus;
use crate::api::router::MessageRouter;
use crate::core::clipboard::ClipboardBroker;
use crate::core::context::resolve_target_platform;
use crate::core::gap::{is_gap_content, ChatId, ChatOrigin};
use crate::core::service::HealthStatus;
use crate::shared::emit::Notifier;
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::{PersistentSettings, SettingsPatch, SettingsStore};
use crate::shared::types::{
    ActionKind, ActionRequest, ActionResponse, PlatformId, SelectionResult, TextPayload, TransformPayload,
    WrapPayload,
};

/// Transient popup: originates requests, owns its own document for clipboard
/// fallbacks, and edits settings
#[derive(Clone)]
pub struct PopupContext {
    router: MessageRouter,
    broker: ClipboardBroker,
    notifier: Notifier,
    settings: SettingsStore,
    tab: ActiveTab,
}

impl PopupContext {
    pub fn new(
        router: MessageRouter,
        broker: ClipboardBroker,
        notifier: Notifier,
        settings: SettingsStore,
        tab: ActiveTab,
    ) -> Self {
        Self {
            router,
            broker,
            notifier,
            settings,
            tab,
        }
    }

    /// Wrap the tab's selection and copy the envelope from the popup
    pub async fn wrap_selection(&self) -> AppResult<Option<String>> {
        match self.try_wrap_selection().await {
            Err(e @ AppError::Context(_)) => {
                tracing::error!("[Popup] Error wrapping selection: {}", e);
                self.notifier.error("Error wrapping selection");
                Err(e)
            }
            other => other,
        }
    }

    async fn try_wrap_selection(&self) -> AppResult<Option<String>> {
        let selection: SelectionResult = self
            .router
            .send(ActionRequest::new(ActionKind::GetSelection))
            .await?
            .result_as()?;
        if selection.selection.is_empty() {
            self.notifier.warning("Please select some text on the page first");
            return Ok(None);
        }

        let settings = self.settings.get().await;
        let mut payload = WrapPayload::new(selection.selection);
        payload.platform = Some(self.tab.platform().to_string());
        payload.chat_id = Some(ChatId::generate(ChatOrigin::Popup).into());
        payload.thread_id = settings.last_thread_id.filter(|t| !t.is_empty());

        let request = ActionRequest::with_payload(ActionKind::WrapContent, &payload)?;
        let wrapped = match self.router.send(request).await? {
            ActionResponse::Result(value) => value.as_str().map(str::to_string).unwrap_or_default(),
            ActionResponse::Error(message) => {
                self.notifier.error(message.clone());
                return Err(AppError::Remote(message));
            }
        };

        if let Err(e) = self.broker.write(&wrapped).await {
            self.notifier.report(&e);
            return Err(e);
        }
        self.notifier.success("Selection wrapped and copied!");
        Ok(Some(wrapped))
    }

    /// Transform the clipboard envelope, copy the result, and offer it to the page
    pub async fn transform_clipboard(&self) -> AppResult<Option<String>> {
        match self.try_transform_clipboard().await {
            Err(e @ AppError::Context(_)) => {
                tracing::error!("[Popup] Error transforming clipboard: {}", e);
                self.notifier.error("Error transforming content");
                Err(e)
            }
            other => other,
        }
    }

    async fn try_transform_clipboard(&self) -> AppResult<Option<String>> {
        let clipboard = self.broker.read().await.unwrap_or_default();
        if clipboard.is_empty() {
            self.notifier.error("Could not read clipboard");
            return Ok(None);
        }
        if !is_gap_content(&clipboard) {
            self.notifier.warning("Clipboard does not contain GAP content");
            return Ok(None);
        }

        let platform = self.target_platform().await;
        let mut payload = TransformPayload::new(clipboard);
        payload.target_platform = Some(platform.to_string());

        let request = ActionRequest::with_payload(ActionKind::TransformContent, &payload)?;
        let transformed = match self.router.send(request).await? {
            ActionResponse::Result(value) => value.as_str().map(str::to_string).unwrap_or_default(),
            ActionResponse::Error(message) => {
                self.notifier.error(message.clone());
                return Err(AppError::Remote(message));
            }
        };

        if let Err(e) = self.broker.write(&transformed).await {
            self.notifier.report(&e);
            return Err(e);
        }

        // Best effort: the page reports its own failure
        let insert = ActionRequest::with_payload(
            ActionKind::InsertText,
            &TextPayload { text: transformed.clone() },
        )?;
        match self.router.send(insert).await {
            Ok(ActionResponse::Error(message)) => tracing::debug!("[Popup] Insert skipped: {}", message),
            Err(e) => tracing::debug!("[Popup] Insert not delivered: {}", e),
            Ok(_) => {}
        }

        self.notifier.success("Content transformed and copied!");
        Ok(Some(transformed))
    }

    /// Platform to transform for, honouring `autoDetectPlatform`
    pub async fn target_platform(&self) -> PlatformId {
        let settings = self.settings.get().await;
        resolve_target_platform(&settings, &self.tab.url())
    }

    pub async fn check_service_status(&self) -> ServiceStatus {
        let status = self.query_service().await;
        tracing::info!("[Popup] {}", status.title());
        status
    }

    async fn query_service(&self) -> ServiceStatus {
        match self.router.send(ActionRequest::new(ActionKind::CheckService)).await {
            Ok(ActionResponse::Result(value)) => {
                let version = serde_json::from_value::<HealthStatus>(value)
                    .map(|h| h.version)
                    .unwrap_or_default();
                self.notifier.success("Service connected");
                ServiceStatus::Online { version }
            }
            Ok(ActionResponse::Error(message)) => {
                tracing::debug!("[Popup] Service check failed: {}", message);
                self.notifier.warning("GAP service is not running");
                ServiceStatus::Offline
            }
            Err(e) => {
                tracing::error!("[Popup] Service check not delivered: {}", e);
                self.notifier.error("Cannot connect to service");
                ServiceStatus::Offline
            }
        }
    }

    pub async fn settings(&self) -> PersistentSettings {
        self.settings.get().await
    }

    pub async fn set_service_url(&self, url: impl Into<String>) -> AppResult<PersistentSettings> {
        self.settings
            .update(SettingsPatch {
                service_url: Some(url.into()),
                ..Default::default()
            })
            .await
    }

    pub async fn set_default_platform(&self, platform: PlatformId) -> AppResult<PersistentSettings> {
        self.settings
            .update(SettingsPatch {
                default_platform: Some(platform),
                ..Default::default()
            })
            .await
    }

    pub async fn set_thread_id(&self, thread_id: impl Into<String>) -> AppResult<PersistentSettings> {
        self.settings
            .update(SettingsPatch {
                last_thread_id: Some(thread_id.into()),
                ..Default::default()
            })
            .await
    }
}
