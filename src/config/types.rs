use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::reference::Source;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub wikimedia: WikimediaConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Durable-tier cache file. Unset means session-only caching.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Entries older than this many days are treated as absent. Unset
    /// disables expiry; entries then live until overwritten or cleared.
    #[serde(default)]
    pub ttl_days: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WikimediaConfig {
    /// MediaWiki API endpoint to scrape.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Requested width for the thumbnail fallback lookup.
    #[serde(default = "default_thumb_size")]
    pub thumb_size: u32,

    /// Extra console page titles to skip during candidate filtering,
    /// appended to the built-in list.
    #[serde(default)]
    pub skip_titles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Provider used when neither a scoped reference nor a preferred
    /// source names one.
    #[serde(default = "default_source")]
    pub default_source: Source,
}

fn default_endpoint() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_thumb_size() -> u32 {
    500
}

fn default_source() -> Source {
    Source::Wikimedia
}

impl Default for WikimediaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            thumb_size: default_thumb_size(),
            skip_titles: Vec::new(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_source: default_source(),
        }
    }
}
