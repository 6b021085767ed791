use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use ts_rs::TS;

use super::emit::{emit_event, EventBus};
use super::error::{AppError, AppResult};
use super::events::AppEvent;
use super::types::PlatformId;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_true() -> bool {
    true
}

/// Extension settings, persisted as JSON and shared across contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export_to = "protocol/")]
pub struct PersistentSettings {
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default)]
    pub default_platform: PlatformId,
    #[serde(default = "default_true")]
    pub auto_detect_platform: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_thread_id: Option<String>,
}

impl Default for PersistentSettings {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            default_platform: PlatformId::Generic,
            auto_detect_platform: true,
            last_thread_id: None,
        }
    }
}

/// Partial update; only the fields that are set get merged
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export_to = "protocol/")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub default_platform: Option<PlatformId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub auto_detect_platform: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_thread_id: Option<String>,
}

impl PersistentSettings {
    fn merge(&mut self, patch: SettingsPatch) {
        if let Some(url) = patch.service_url {
            self.service_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(platform) = patch.default_platform {
            self.default_platform = platform;
        }
        if let Some(auto) = patch.auto_detect_platform {
            self.auto_detect_platform = auto;
        }
        if let Some(thread) = patch.last_thread_id {
            self.last_thread_id = Some(thread).filter(|t| !t.is_empty());
        }
    }

    /// Base URL for the GAP service; blank values fall back to the default
    pub fn effective_service_url(&self) -> &str {
        let url = self.service_url.trim();
        if url.is_empty() {
            DEFAULT_SERVICE_URL
        } else {
            url
        }
    }
}

/// Shared handle over the persisted settings
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<RwLock<PersistentSettings>>,
    path: Option<PathBuf>,
    bus: Option<EventBus>,
}

impl SettingsStore {
    pub fn default_path() -> AppResult<PathBuf> {
        ProjectDirs::from("org", "gap-protocol", "gap-extension")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::Unknown("Failed to determine config directory".to_string()))
    }

    /// Settings that live only for the lifetime of the process
    pub fn in_memory(settings: PersistentSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
            path: None,
            bus: None,
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            serde_json::from_str(&content)
                .map_err(|e| AppError::Validation(format!("Failed to parse settings: {}", e)))?
        } else {
            tracing::info!("[Settings] No settings at {}, using defaults", path.display());
            PersistentSettings::default()
        };

        Ok(Self {
            inner: Arc::new(RwLock::new(settings)),
            path: Some(path),
            bus: None,
        })
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub async fn get(&self) -> PersistentSettings {
        self.inner.read().await.clone()
    }

    pub async fn service_url(&self) -> String {
        self.inner.read().await.effective_service_url().to_string()
    }

    /// Merge `patch`, persist and notify subscribers
    pub async fn update(&self, patch: SettingsPatch) -> AppResult<PersistentSettings> {
        let updated = {
            let mut guard = self.inner.write().await;
            guard.merge(patch);
            guard.clone()
        };

        self.save_to_disk(&updated).await?;

        if let Some(bus) = &self.bus {
            emit_event(bus, AppEvent::SettingsUpdated(updated.clone()));
        }
        tracing::debug!("[Settings] Updated: {:?}", updated);
        Ok(updated)
    }

    async fn save_to_disk(&self, settings: &PersistentSettings) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content).await?;
        Ok(())
    }
}
