//! GAP envelope helpers
//!
//! A GAP envelope is free text delimited by `[GAP:START]` and `[GAP:END]`. The
//! service owns the format between the markers; the extension only checks for the
//! markers and reads the `Entities:` summary line.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::shared::error::{AppError, AppResult};

pub const GAP_START: &str = "[GAP:START]";
pub const GAP_END: &str = "[GAP:END]";

/// True iff `text` carries both envelope markers
pub fn is_gap_content(text: &str) -> bool {
    text.contains(GAP_START) && text.contains(GAP_END)
}

/// Text known to be a well-formed GAP envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GapEnvelope(String);

impl GapEnvelope {
    pub fn parse(text: impl Into<String>) -> AppResult<Self> {
        let text = text.into();
        if is_gap_content(&text) {
            Ok(Self(text))
        } else {
            Err(AppError::Validation("Content is not a GAP envelope".to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for GapEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read the `Entities: a, b` line of an envelope. `None` and a missing line both mean
/// no entities.
pub fn extract_entities(text: &str) -> Vec<String> {
    static ENTITIES_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = ENTITIES_REGEX
        .get_or_init(|| Regex::new(r"Entities: ([^\n]+)").expect("valid entities regex"));

    let Some(line) = re.captures(text).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };
    let line = line.as_str().trim();
    if line == "None" {
        return Vec::new();
    }

    line.split(',')
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Origin tags used when generating chat ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOrigin {
    Extension,
    Popup,
    Content,
    Command,
    Detect,
}

impl ChatOrigin {
    pub fn prefix(&self) -> &'static str {
        match self {
            ChatOrigin::Extension => "ext",
            ChatOrigin::Popup => "popup",
            ChatOrigin::Content => "content",
            ChatOrigin::Command => "cmd",
            ChatOrigin::Detect => "detect",
        }
    }
}

/// Unique conversation token handed to the service on wrap
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn generate(origin: ChatOrigin) -> Self {
        Self(format!("{}_{}", origin.prefix(), Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ChatId> for String {
    fn from(id: ChatId) -> Self {
        id.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gap_content_needs_both_markers() {
        assert!(is_gap_content("[GAP:START]\nbody\n[GAP:END]"));
        assert!(!is_gap_content("[GAP:START] only"));
        assert!(!is_gap_content("only [GAP:END]"));
        assert!(!is_gap_content(""));
    }

    #[test]
    fn test_envelope_parse() {
        assert!(GapEnvelope::parse("[GAP:START]x[GAP:END]").is_ok());
        assert!(matches!(
            GapEnvelope::parse("plain"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_extract_entities() {
        let env = "[GAP:START]\nEntities: Paris, Mercury\nBody\n[GAP:END]";
        assert_eq!(extract_entities(env), vec!["Paris", "Mercury"]);
        assert!(extract_entities("[GAP:START]\nEntities: None\n[GAP:END]").is_empty());
        assert!(extract_entities("[GAP:START]\n[GAP:END]").is_empty());
    }

    #[test]
    fn test_chat_ids_are_unique_and_tagged() {
        let a = ChatId::generate(ChatOrigin::Popup);
        let b = ChatId::generate(ChatOrigin::Popup);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("popup_"));
        assert!(ChatId::generate(ChatOrigin::Command).as_str().starts_with("cmd_"));
    }
}
