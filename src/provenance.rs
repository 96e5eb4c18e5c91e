//! Provenance classification for UI badges.
//!
//! Maps a stored reference string (or its absence) to a display category
//! so the catalog UI can label where a cover came from. Classification is
//! pure prefix and scheme inspection on top of the reference grammar; it
//! never consults the cache or the network, so a badge may say
//! "wikimedia" even when the entry has not actually been fetched yet.

use std::fmt;

use serde::Serialize;

use crate::reference::{ImageReference, Source};

/// Display category for a cover image's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Wikimedia,
    Tgdb,
    Screenscraper,
    /// Bundled or on-disk asset.
    Local,
    /// Inline `data:` URI.
    Embedded,
    /// Externally hosted direct URL.
    External,
    /// Scheme-shaped reference the grammar does not recognise.
    Custom,
    /// No reference stored at all.
    Default,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Wikimedia => "wikimedia",
            Provenance::Tgdb => "tgdb",
            Provenance::Screenscraper => "screenscraper",
            Provenance::Local => "local",
            Provenance::Embedded => "embedded",
            Provenance::External => "external",
            Provenance::Custom => "custom",
            Provenance::Default => "default",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a reference string into its badge category.
pub fn classify(reference: Option<&str>) -> Provenance {
    let raw = match reference {
        Some(r) if !r.trim().is_empty() => r.trim(),
        _ => return Provenance::Default,
    };

    match ImageReference::parse(raw) {
        ImageReference::Direct(_) => Provenance::External,
        ImageReference::Embedded(_) => Provenance::Embedded,
        ImageReference::Scoped { source, .. } => match source {
            Source::Wikimedia => Provenance::Wikimedia,
            Source::Tgdb => Provenance::Tgdb,
            Source::Screenscraper => Provenance::Screenscraper,
            Source::Auto | Source::Cache => Provenance::Custom,
        },
        ImageReference::LocalAsset(_) => {
            if raw.starts_with("file://") || raw.starts_with("asset://") {
                Provenance::Local
            } else if looks_scheme_like(raw) {
                Provenance::Custom
            } else {
                Provenance::Local
            }
        }
    }
}

/// Whether a reference is the kind of value cache badges apply to.
///
/// True exactly for direct URLs and scoped references with a known source
/// token. Local assets, embedded data and unknown schemes are never
/// network-sourced. This is the single cached-ness predicate; badge and
/// cover rendering must both go through it.
pub fn looks_network_sourced(reference: Option<&str>) -> bool {
    let Some(raw) = reference else {
        return false;
    };
    matches!(
        ImageReference::parse(raw),
        ImageReference::Direct(_) | ImageReference::Scoped { .. }
    )
}

fn looks_scheme_like(raw: &str) -> bool {
    match raw.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
        }
        None => false,
    }
}
