//! Wire types shared by every execution context.
//!
//! `ActionRequest` / `ActionResponse` form the cross-context protocol; the payload
//! structs are the action-specific shapes validated before dispatch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use super::error::{AppError, AppResult};

/// AI-chat platform the active page belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export_to = "protocol/")]
pub enum PlatformId {
    #[serde(rename = "claude.ai")]
    ClaudeAi,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "copilot")]
    Copilot,
    #[serde(rename = "perplexity")]
    Perplexity,
    #[serde(rename = "poe")]
    Poe,
    #[default]
    #[serde(rename = "generic")]
    Generic,
}

impl PlatformId {
    pub const ALL: [PlatformId; 7] = [
        PlatformId::ClaudeAi,
        PlatformId::ChatGpt,
        PlatformId::Gemini,
        PlatformId::Copilot,
        PlatformId::Perplexity,
        PlatformId::Poe,
        PlatformId::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::ClaudeAi => "claude.ai",
            PlatformId::ChatGpt => "chatgpt",
            PlatformId::Gemini => "gemini",
            PlatformId::Copilot => "copilot",
            PlatformId::Perplexity => "perplexity",
            PlatformId::Poe => "poe",
            PlatformId::Generic => "generic",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformId::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown platform: {}", s)))
    }
}

/// The three isolated execution contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export_to = "protocol/")]
pub enum ContextKind {
    Background,
    Content,
    Popup,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextKind::Background => "background",
            ContextKind::Content => "content",
            ContextKind::Popup => "popup",
        };
        f.write_str(name)
    }
}

/// Closed set of actions understood by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export_to = "protocol/")]
pub enum ActionKind {
    WrapContent,
    TransformContent,
    CheckService,
    GetSelection,
    GetClipboard,
    CopyToClipboard,
    InsertText,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::WrapContent,
        ActionKind::TransformContent,
        ActionKind::CheckService,
        ActionKind::GetSelection,
        ActionKind::GetClipboard,
        ActionKind::CopyToClipboard,
        ActionKind::InsertText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::WrapContent => "wrapContent",
            ActionKind::TransformContent => "transformContent",
            ActionKind::CheckService => "checkService",
            ActionKind::GetSelection => "getSelection",
            ActionKind::GetClipboard => "getClipboard",
            ActionKind::CopyToClipboard => "copyToClipboard",
            ActionKind::InsertText => "insertText",
        }
    }

    /// Context that owns the handler for this action.
    ///
    /// Network and settings work lives in the background context; anything that
    /// touches the page lives in the content context.
    pub fn target(&self) -> ContextKind {
        match self {
            ActionKind::WrapContent | ActionKind::TransformContent | ActionKind::CheckService => {
                ContextKind::Background
            }
            ActionKind::GetSelection
            | ActionKind::GetClipboard
            | ActionKind::CopyToClipboard
            | ActionKind::InsertText => ContextKind::Content,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::UnknownAction(s.to_string()))
    }
}

/// A request crossing a context boundary.
///
/// `action` stays a raw string on the wire so that unknown kinds can be observed
/// (and answered or dropped) by the router instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            action: kind.as_str().to_string(),
            payload: Map::new(),
        }
    }

    pub fn with_payload<T: Serialize>(kind: ActionKind, payload: &T) -> AppResult<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(map) => Ok(Self {
                action: kind.as_str().to_string(),
                payload: map,
            }),
            other => Err(AppError::Validation(format!(
                "Payload for {} must be an object, got {}",
                kind, other
            ))),
        }
    }

    pub fn kind(&self) -> AppResult<ActionKind> {
        self.action.parse()
    }

    /// Deserialize the payload into its action-specific shape
    pub fn payload_as<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(Value::Object(self.payload.clone()))
            .map_err(|e| AppError::Validation(format!("Invalid {} payload: {}", self.action, e)))
    }
}

/// Exactly one of `{ "result": .. }` or `{ "error": ".." }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionResponse {
    Result(Value),
    Error(String),
}

impl ActionResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, ActionResponse::Error(_))
    }

    pub fn into_result(self) -> AppResult<Value> {
        match self {
            ActionResponse::Result(value) => Ok(value),
            ActionResponse::Error(message) => Err(AppError::Remote(message)),
        }
    }

    /// Decode a successful result into a typed value
    pub fn result_as<T: DeserializeOwned>(self) -> AppResult<T> {
        let value = self.into_result()?;
        serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("Unexpected result shape: {}", e)))
    }
}

impl From<AppResult<Value>> for ActionResponse {
    fn from(result: AppResult<Value>) -> Self {
        match result {
            Ok(value) => ActionResponse::Result(value),
            Err(e) => ActionResponse::Error(e.to_string()),
        }
    }
}

// ===== Payloads =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export_to = "protocol/")]
pub struct WrapPayload {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl WrapPayload {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            platform: None,
            chat_id: None,
            thread_id: None,
            role: None,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.content.is_empty() {
            return Err(AppError::Validation("Nothing to wrap: content is empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export_to = "protocol/")]
pub struct TransformPayload {
    pub gap_markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_additions: Option<HashMap<String, String>>,
}

impl TransformPayload {
    pub fn new(gap_markdown: impl Into<String>) -> Self {
        Self {
            gap_markdown: gap_markdown.into(),
            target_platform: None,
            context_additions: None,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !crate::core::gap::is_gap_content(&self.gap_markdown) {
            return Err(AppError::Validation(
                "Content is not a GAP envelope".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload of `copyToClipboard` and `insertText`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export_to = "protocol/")]
pub struct TextPayload {
    pub text: String,
}

// ===== Results =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export_to = "protocol/")]
pub struct SelectionResult {
    pub selection: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export_to = "protocol/")]
pub struct ClipboardResult {
    pub clipboard: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export_to = "protocol/")]
pub struct SuccessResult {
    pub success: bool,
}
