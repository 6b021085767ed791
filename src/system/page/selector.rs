use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::shared::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    Present,
    Equals(String),
    Contains(String),
}

/// Minimal CSS selector: `tag`, `tag[attr]`, `tag[attr="v"]`, `tag[attr*="v"]`, with
/// the tag optional when an attribute test is given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    attr: Option<(String, AttrMatch)>,
}

impl Selector {
    pub fn parse(input: &str) -> AppResult<Self> {
        static SELECTOR_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = SELECTOR_REGEX.get_or_init(|| {
            Regex::new(r#"^([A-Za-z][A-Za-z0-9-]*)?(?:\[([A-Za-z][A-Za-z0-9_-]*)(?:(\*?=)"([^"]*)")?\])?$"#)
                .expect("valid selector regex")
        });

        let input = input.trim();
        let caps = re
            .captures(input)
            .filter(|_| !input.is_empty())
            .ok_or_else(|| AppError::Validation(format!("Unsupported selector: {}", input)))?;

        let tag = caps.get(1).map(|m| m.as_str().to_ascii_lowercase());
        let attr = caps.get(2).map(|name| {
            let name = name.as_str().to_ascii_lowercase();
            let value = caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default();
            let test = match caps.get(3).map(|m| m.as_str()) {
                Some("*=") => AttrMatch::Contains(value),
                Some(_) => AttrMatch::Equals(value),
                None => AttrMatch::Present,
            };
            (name, test)
        });

        Ok(Self { tag, attr })
    }

    pub fn matches(&self, tag: &str, attrs: &HashMap<String, String>) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        match &self.attr {
            None => true,
            Some((name, test)) => match (attrs.get(name), test) {
                (None, _) => false,
                (Some(_), AttrMatch::Present) => true,
                (Some(v), AttrMatch::Equals(expected)) => v == expected,
                (Some(v), AttrMatch::Contains(needle)) => v.contains(needle.as_str()),
            },
        }
    }
}
