//! Cross-context protocol
//!
//! - `router`: request routing, one response per request
//! - `contexts`: the background, content and popup actors
//! - `commands`: outcomes of the keyboard, popup and page flows

pub mod commands;
pub mod contexts;
pub mod router;

#[cfg(test)]
mod flows_test;
