//! `key:value` metadata filters

use crate::store::SearchFilter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a filter expression could not be used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedFilter {
    pub raw: String,
    pub reason: String,
}

impl fmt::Display for MalformedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring filter '{}': {}", self.raw, self.reason)
    }
}

/// Exact-match constraint on one payload field, e.g. `subject:Elon Musk`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub key: String,
    pub value: String,
}

impl MetadataFilter {
    /// Parse `key:value`, splitting on the first colon only
    ///
    /// The value keeps any further colons and its surrounding whitespace is
    /// trimmed; matching is case-sensitive.
    pub fn parse(raw: &str) -> std::result::Result<Self, MalformedFilter> {
        let malformed = |reason: &str| MalformedFilter {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };

        let (key, value) = raw
            .split_once(':')
            .ok_or_else(|| malformed("expected key:value"))?;
        let key = key.trim();

        if key.is_empty() {
            return Err(malformed("empty key"));
        }
        if !is_field_name(key) {
            return Err(malformed("key must be a metadata field name"));
        }

        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl From<&MetadataFilter> for SearchFilter {
    fn from(filter: &MetadataFilter) -> Self {
        SearchFilter {
            key: filter.key.clone(),
            value: filter.value.clone(),
        }
    }
}

impl fmt::Display for MetadataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// ASCII identifier: a letter or underscore, then letters, digits, underscores
fn is_field_name(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
