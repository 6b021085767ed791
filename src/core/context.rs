//! Page context detection
//!
//! Maps the active page to the AI-chat platform it belongs to.

pub mod detection;

pub use detection::{detect_platform, detect_platform_from_host, resolve_target_platform};
