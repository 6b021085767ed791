use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::settings::PersistentSettings;
use super::types::ContextKind;

/// How long a notification stays visible before it dismisses itself
pub const NOTIFICATION_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export_to = "protocol/")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient, auto-dismissing message shown in the context the user is looking at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export_to = "protocol/")]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub context: ContextKind,
    pub dismiss_after_ms: u64,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(context: ContextKind, level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            context,
            dismiss_after_ms: NOTIFICATION_TIMEOUT_MS,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")] // Tagged enum for easier frontend parsing
pub enum AppEvent {
    #[serde(rename = "notification://show")]
    Notification(Notification),

    #[serde(rename = "settings://updated")]
    SettingsUpdated(PersistentSettings),
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::Notification(_) => "notification://show",
            AppEvent::SettingsUpdated(_) => "settings://updated",
        }
    }
}
