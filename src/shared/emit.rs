use std::sync::Arc;
use tokio::sync::broadcast;

use super::error::AppError;
use super::events::{AppEvent, Notification, NotificationLevel};
use super::types::ContextKind;

const EVENT_BUS_CAPACITY: usize = 64;

/// Process-wide event channel shared by all contexts
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit an application event to every subscriber
pub fn emit_event(bus: &EventBus, event: AppEvent) {
    let name = event.name();
    // Nobody listening is fine; the event is simply dropped
    if bus.tx.send(event).is_err() {
        tracing::trace!("[Events] {} emitted with no subscribers", name);
    }
}

/// Something that can render a notification for the user (page overlay, popup status line)
pub trait NotificationSurface: Send + Sync {
    fn show_notification(&self, notification: &Notification);
}

/// Per-context notification helper.
///
/// Stamps the owning context, renders on the attached surface (if any) and
/// publishes the notification on the event bus.
#[derive(Clone)]
pub struct Notifier {
    context: ContextKind,
    bus: EventBus,
    surface: Option<Arc<dyn NotificationSurface>>,
}

impl Notifier {
    pub fn new(context: ContextKind, bus: EventBus) -> Self {
        Self {
            context,
            bus,
            surface: None,
        }
    }

    pub fn with_surface(mut self, surface: Arc<dyn NotificationSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn context(&self) -> ContextKind {
        self.context
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> Notification {
        let notification = Notification::new(self.context, level, message);
        match level {
            NotificationLevel::Error => {
                tracing::error!("[Notify:{}] {}", self.context, notification.message)
            }
            NotificationLevel::Warning => {
                tracing::warn!("[Notify:{}] {}", self.context, notification.message)
            }
            _ => tracing::info!("[Notify:{}] {}", self.context, notification.message),
        }

        if let Some(surface) = &self.surface {
            surface.show_notification(&notification);
        }
        emit_event(&self.bus, AppEvent::Notification(notification.clone()));
        notification
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Success, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Error, message)
    }

    /// Surface an error with the severity it maps to
    pub fn report(&self, err: &AppError) -> Notification {
        self.notify(err.level(), err.to_string())
    }
}
