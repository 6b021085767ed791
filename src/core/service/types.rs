//! Wire bodies of the GAP service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const DEFAULT_ROLE: &str = "assistant";
pub const DEFAULT_ENTITY_TYPE: &str = "user_defined";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrapRequest {
    pub content: String,
    pub platform: String,
    pub chat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WrapResponse {
    pub gap_markdown: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformRequest {
    pub gap_markdown: String,
    pub target_platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_additions: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformResponse {
    pub transformed_content: String,
}

/// `GET /health`; anything beyond `version` is kept as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsResponse {
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadContext {
    pub thread_id: String,
    pub message_count: u64,
    #[serde(default)]
    pub context: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityUpdateRequest {
    pub gap_markdown: String,
    pub entity_key: String,
    pub entity_value: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityUpdateResponse {
    pub updated_markdown: String,
}
