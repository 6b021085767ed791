//! Runtime wiring
//!
//! Builds the router, spawns the background and content actors, and hands out the
//! popup. Every component receives the same `SettingsStore` and `EventBus`.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api::commands::{CommandOutcome, KeyboardCommand};
use crate::api::contexts::{ActiveTab, BackgroundContext, ContentContext, PopupContext};
use crate::api::router::{spawn_context, MessageRouter, UnknownActionPolicy};
use crate::core::clipboard::ClipboardBroker;
use crate::core::service::GapServiceClient;
use crate::shared::emit::{EventBus, NotificationSurface, Notifier};
use crate::shared::error::AppResult;
use crate::shared::events::AppEvent;
use crate::shared::settings::SettingsStore;
use crate::shared::types::{ActionRequest, ActionResponse, ContextKind};
use crate::system::clipboard::{ClipboardCapability, SystemClipboard};
use crate::system::page::PageDocument;

pub struct RuntimeBuilder {
    settings: SettingsStore,
    events: EventBus,
    policy: UnknownActionPolicy,
    clipboard: Arc<dyn ClipboardCapability>,
}

impl RuntimeBuilder {
    pub fn unknown_actions(mut self, policy: UnknownActionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Privileged clipboard used by both the content and popup brokers
    pub fn clipboard(mut self, clipboard: Arc<dyn ClipboardCapability>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Start the contexts for `page` (the active tab) and `popup_page` (the popup's
    /// own document). Must be called from within a tokio runtime.
    pub fn start<P, Q>(self, page: Arc<P>, popup_page: Arc<Q>) -> AppResult<ExtensionRuntime>
    where
        P: PageDocument + 'static,
        Q: PageDocument + 'static,
    {
        let settings = self.settings.with_event_bus(self.events.clone());
        let service = GapServiceClient::new(settings.clone())?;

        let page_surface: Arc<dyn NotificationSurface> = page.clone();
        let popup_surface: Arc<dyn NotificationSurface> = popup_page.clone();
        let page: Arc<dyn PageDocument> = page;
        let popup_page: Arc<dyn PageDocument> = popup_page;
        let tab = ActiveTab::new(page.clone());

        let mut router = MessageRouter::new(self.policy);
        let background_mailbox = router.open_mailbox(ContextKind::Background);
        let content_mailbox = router.open_mailbox(ContextKind::Content);

        let background = BackgroundContext::new(
            service,
            router.clone(),
            tab.clone(),
            Notifier::new(ContextKind::Background, self.events.clone()).with_surface(page_surface.clone()),
        );
        let content = ContentContext::new(
            page.clone(),
            ClipboardBroker::standard(self.clipboard.clone(), page.clone()),
            Notifier::new(ContextKind::Content, self.events.clone()).with_surface(page_surface),
            router.clone(),
        );
        let popup = PopupContext::new(
            router.clone(),
            ClipboardBroker::standard(self.clipboard, popup_page),
            Notifier::new(ContextKind::Popup, self.events.clone()).with_surface(popup_surface),
            settings.clone(),
            tab,
        );

        let tasks = vec![
            spawn_context(Arc::new(background.clone()), background_mailbox),
            spawn_context(Arc::new(content.clone()), content_mailbox),
        ];
        tracing::info!("[Runtime] Started on {}", page.url());

        Ok(ExtensionRuntime {
            router,
            background,
            content,
            popup,
            settings,
            events: self.events,
            tasks,
        })
    }
}

pub struct ExtensionRuntime {
    router: MessageRouter,
    background: BackgroundContext,
    content: ContentContext,
    popup: PopupContext,
    settings: SettingsStore,
    events: EventBus,
    tasks: Vec<JoinHandle<()>>,
}

impl ExtensionRuntime {
    pub fn builder(settings: SettingsStore) -> RuntimeBuilder {
        RuntimeBuilder {
            settings,
            events: EventBus::new(),
            policy: UnknownActionPolicy::default(),
            clipboard: Arc::new(SystemClipboard),
        }
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn background(&self) -> &BackgroundContext {
        &self.background
    }

    pub fn content(&self) -> &ContentContext {
        &self.content
    }

    pub fn popup(&self) -> &PopupContext {
        &self.popup
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    pub async fn send(&self, request: ActionRequest) -> AppResult<ActionResponse> {
        self.router.send(request).await
    }

    pub async fn run_command(&self, command: KeyboardCommand) -> AppResult<CommandOutcome> {
        self.background.run_command(command).await
    }

    /// Stop the context actors
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!("[Runtime] Stopped");
    }
}
