use url::Url;

use crate::shared::settings::PersistentSettings;
use crate::shared::types::PlatformId;

/// Known hostname fragments, checked in order; first match wins
const KNOWN_PLATFORMS: &[(&str, PlatformId)] = &[
    ("claude.ai", PlatformId::ClaudeAi),
    ("chat.openai.com", PlatformId::ChatGpt),
    ("chatgpt.com", PlatformId::ChatGpt),
    ("gemini.google.com", PlatformId::Gemini),
    ("copilot.microsoft.com", PlatformId::Copilot),
    ("perplexity.ai", PlatformId::Perplexity),
    ("poe.com", PlatformId::Poe),
];

/// Detect the AI-chat platform a page belongs to.
///
/// Malformed URLs and URLs without a host resolve to `Generic`.
pub fn detect_platform(url: &str) -> PlatformId {
    match Url::parse(url.trim()) {
        Ok(parsed) => parsed
            .host_str()
            .map(detect_platform_from_host)
            .unwrap_or_default(),
        Err(e) => {
            tracing::debug!("[Detect] Unparseable URL {:?}: {}", url, e);
            PlatformId::Generic
        }
    }
}

/// Substring match of a bare hostname against the known platform list
pub fn detect_platform_from_host(host: &str) -> PlatformId {
    let host = host.to_ascii_lowercase();
    KNOWN_PLATFORMS
        .iter()
        .find(|(fragment, _)| host.contains(fragment))
        .map(|(_, platform)| *platform)
        .unwrap_or_default()
}

/// Platform to transform for: the page's platform when auto-detect is on, the configured
/// default otherwise
pub fn resolve_target_platform(settings: &PersistentSettings, url: &str) -> PlatformId {
    if settings.auto_detect_platform {
        detect_platform(url)
    } else {
        settings.default_platform
    }
}
