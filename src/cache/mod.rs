//! Two-tier cache for resolved cover URLs.
//!
//! The session tier is an in-memory map rebuilt empty on every run. The
//! durable tier is a JSON document on disk that survives restarts and is
//! always the source of truth; the session tier only ever caches it.
//! Values are URLs plus a little metadata, never pixel data.

pub mod persist;
mod store;

pub use store::CacheStore;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::{encode_component, Source};

/// Identity of a cached resolution: which provider, for which game.
///
/// When a scoped reference is present its own triple is authoritative,
/// regardless of any separately requested preferred source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: Source,
    pub title: String,
    pub platform: Option<String>,
}

impl CacheKey {
    pub fn new(source: Source, title: impl Into<String>, platform: Option<String>) -> Self {
        Self {
            source,
            title: title.into(),
            platform,
        }
    }

    /// Deterministic serialized form, `source:urlencoded-title[:platform]`.
    /// This is the durable-tier key layout; do not change it without a
    /// migration for existing cache files.
    pub fn serialize(&self) -> String {
        match &self.platform {
            Some(platform) => format!(
                "{}:{}:{}",
                self.source.as_str(),
                encode_component(&self.title),
                platform
            ),
            None => format!("{}:{}", self.source.as_str(), encode_component(&self.title)),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// A single cached resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

/// Counters surfaced for diagnostics and the CLI.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub session_entries: usize,
    pub durable_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_serialization_is_deterministic() {
        let a = CacheKey::new(Source::Wikimedia, "Chrono Trigger", Some("snes".to_string()));
        let b = CacheKey::new(Source::Wikimedia, "Chrono Trigger", Some("snes".to_string()));
        assert_eq!(a.serialize(), b.serialize());
        assert_eq!(a.serialize(), "wikimedia:Chrono%20Trigger:snes");
    }

    #[test]
    fn key_differs_by_title_platform_and_source() {
        let base = CacheKey::new(Source::Wikimedia, "Chrono Trigger", Some("snes".to_string()));
        let other_title =
            CacheKey::new(Source::Wikimedia, "Chrono Cross", Some("snes".to_string()));
        let other_platform =
            CacheKey::new(Source::Wikimedia, "Chrono Trigger", Some("psx".to_string()));
        let other_source =
            CacheKey::new(Source::Tgdb, "Chrono Trigger", Some("snes".to_string()));
        assert_ne!(base.serialize(), other_title.serialize());
        assert_ne!(base.serialize(), other_platform.serialize());
        assert_ne!(base.serialize(), other_source.serialize());
    }

    #[test]
    fn key_without_platform_omits_segment() {
        let key = CacheKey::new(Source::Tgdb, "Metroid", None);
        assert_eq!(key.serialize(), "tgdb:Metroid");
    }

    #[test]
    fn entry_round_trips_as_json() {
        let entry = CacheEntry {
            url: "https://img.example/a.jpg".to_string(),
            timestamp: Utc::now(),
            title: Some("Metroid".to_string()),
            source: Some(Source::Wikimedia),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"wikimedia\""));
        let back: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn entry_optional_metadata_may_be_absent() {
        let entry: CacheEntry = serde_json::from_str(
            r#"{"url":"https://img.example/a.jpg","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(entry.title.is_none());
        assert!(entry.source.is_none());
    }
}
