//! Outcomes of the user-triggered flows
//!
//! Keyboard commands run in the background context, the popup flows in the popup
//! context and the page flows in the content context; they share these result types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::AppError;

/// Keyboard shortcuts registered by the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyboardCommand {
    WrapSelection,
    QuickTransform,
}

impl KeyboardCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyboardCommand::WrapSelection => "wrap-selection",
            KeyboardCommand::QuickTransform => "quick-transform",
        }
    }
}

impl fmt::Display for KeyboardCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyboardCommand {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wrap-selection" => Ok(KeyboardCommand::WrapSelection),
            "quick-transform" => Ok(KeyboardCommand::QuickTransform),
            other => Err(AppError::Validation(format!("Unknown command: {}", other))),
        }
    }
}

/// Result of a flow that may legitimately do nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CommandOutcome {
    /// The flow ran; `text` is what ended up on the clipboard or in the page
    Completed { text: String },
    /// Nothing to act on
    Skipped { reason: String },
}

impl CommandOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        CommandOutcome::Skipped { reason: reason.into() }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CommandOutcome::Completed { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            CommandOutcome::Completed { text } => Some(text),
            CommandOutcome::Skipped { .. } => None,
        }
    }
}

/// Service indicator shown in the popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceStatus {
    Online { version: String },
    Offline,
}

impl ServiceStatus {
    /// Tooltip text for the status indicator
    pub fn title(&self) -> String {
        match self {
            ServiceStatus::Online { version } => format!("Service online (v{})", version),
            ServiceStatus::Offline => "Service offline".to_string(),
        }
    }
}
