//! Reference grammar for cover-image identity strings.
//!
//! A game record may carry an opaque string describing where its cover
//! image comes from. That string is classified exactly once, here, into
//! an [`ImageReference`]; everything downstream matches on the enum and
//! never re-inspects the raw text.
//!
//! Classification is total and pure. Every input maps to exactly one
//! variant by prefix inspection alone, with no network access and no
//! failure path; anything unrecognised is treated as a bare local path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Provider source tokens usable on the left side of a scoped reference.
///
/// `Auto` and `Cache` appear in stored references in the wild; at
/// provider-selection time both resolve to the default adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Wikimedia,
    Tgdb,
    Screenscraper,
    Auto,
    Cache,
}

impl Source {
    /// Short lowercase identifier, matching the scoped-reference grammar.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Wikimedia => "wikimedia",
            Source::Tgdb => "tgdb",
            Source::Screenscraper => "screenscraper",
            Source::Auto => "auto",
            Source::Cache => "cache",
        }
    }

    /// Parse a source token, returning `None` for anything unknown.
    pub fn from_token(token: &str) -> Option<Source> {
        match token {
            "wikimedia" => Some(Source::Wikimedia),
            "tgdb" => Some(Source::Tgdb),
            "screenscraper" => Some(Source::Screenscraper),
            "auto" => Some(Source::Auto),
            "cache" => Some(Source::Cache),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::from_token(s).ok_or_else(|| {
            format!("unknown source '{s}' (expected wikimedia, tgdb, screenscraper, auto or cache)")
        })
    }
}

/// A classified cover-image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// Externally hosted `http(s)` URL, rendered as-is and never cached.
    Direct(String),
    /// Bundled or on-disk asset: `file://`, `asset://`, or a bare path.
    LocalAsset(String),
    /// Inline `data:` URI, rendered as-is and never cached.
    Embedded(String),
    /// Provider-scoped lookup request, `source:title[:platform]` with a
    /// percent-encoded title.
    Scoped {
        source: Source,
        title: String,
        platform: Option<String>,
    },
}

impl ImageReference {
    /// Classify a raw reference string.
    ///
    /// Recognition order: embedded data, `file://`, app-local `asset://`,
    /// direct `http(s)` URL, scoped reference with a known source token,
    /// then the bare-local-path fallback.
    pub fn parse(raw: &str) -> ImageReference {
        let trimmed = raw.trim();
        if trimmed.starts_with("data:") {
            return ImageReference::Embedded(trimmed.to_string());
        }
        if trimmed.starts_with("file://") || trimmed.starts_with("asset://") {
            return ImageReference::LocalAsset(trimmed.to_string());
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return ImageReference::Direct(trimmed.to_string());
        }
        if let Some(scoped) = parse_scoped(trimmed) {
            return scoped;
        }
        ImageReference::LocalAsset(trimmed.to_string())
    }
}

fn parse_scoped(raw: &str) -> Option<ImageReference> {
    let (token, rest) = raw.split_once(':')?;
    let source = Source::from_token(token)?;
    if rest.is_empty() {
        return None;
    }
    let (title_part, platform) = match rest.split_once(':') {
        Some((t, p)) if !p.is_empty() => (t, Some(p.to_string())),
        Some((t, _)) => (t, None),
        None => (rest, None),
    };
    if title_part.is_empty() {
        return None;
    }
    Some(ImageReference::Scoped {
        source,
        title: decode_component(title_part),
        platform,
    })
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Minimal percent-encoding for reference and cache-key components.
pub(crate) fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

/// Decode a percent-encoded component. Malformed escapes pass through
/// literally; `+` decodes to a space to tolerate older key shapes.
pub(crate) fn decode_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        if bytes[i] == b'+' {
            out.push(b' ');
        } else {
            out.push(bytes[i]);
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn classifies_embedded_data_uri() {
        let r = ImageReference::parse("data:image/png;base64,iVBORw0KGgo=");
        assert_matches!(r, ImageReference::Embedded(_));
    }

    #[test]
    fn classifies_file_and_asset_schemes_as_local() {
        assert_matches!(
            ImageReference::parse("file:///covers/mario.png"),
            ImageReference::LocalAsset(_)
        );
        assert_matches!(
            ImageReference::parse("asset://covers/mario.png"),
            ImageReference::LocalAsset(_)
        );
    }

    #[test]
    fn classifies_direct_urls() {
        assert_eq!(
            ImageReference::parse("https://img.example/a.jpg"),
            ImageReference::Direct("https://img.example/a.jpg".to_string())
        );
        assert_matches!(
            ImageReference::parse("http://img.example/a.jpg"),
            ImageReference::Direct(_)
        );
    }

    #[test]
    fn classifies_scoped_reference_with_platform() {
        let r = ImageReference::parse("screenscraper:Chrono%20Trigger:snes");
        assert_eq!(
            r,
            ImageReference::Scoped {
                source: Source::Screenscraper,
                title: "Chrono Trigger".to_string(),
                platform: Some("snes".to_string()),
            }
        );
    }

    #[test]
    fn classifies_scoped_reference_without_platform() {
        let r = ImageReference::parse("wikimedia:Metroid");
        assert_eq!(
            r,
            ImageReference::Scoped {
                source: Source::Wikimedia,
                title: "Metroid".to_string(),
                platform: None,
            }
        );
    }

    #[test]
    fn unknown_scheme_falls_back_to_local_path() {
        assert_matches!(
            ImageReference::parse("gopher:something"),
            ImageReference::LocalAsset(_)
        );
    }

    #[test]
    fn source_token_with_empty_remainder_is_not_scoped() {
        assert_matches!(
            ImageReference::parse("wikimedia:"),
            ImageReference::LocalAsset(_)
        );
    }

    #[test]
    fn bare_paths_are_local() {
        assert_eq!(
            ImageReference::parse("covers/mario.png"),
            ImageReference::LocalAsset("covers/mario.png".to_string())
        );
        assert_matches!(ImageReference::parse(""), ImageReference::LocalAsset(_));
    }

    #[test]
    fn data_prefix_wins_over_everything() {
        // A data URI containing "https://" later in the payload must stay embedded.
        assert_matches!(
            ImageReference::parse("data:text/plain,https://example.org"),
            ImageReference::Embedded(_)
        );
    }

    #[test]
    fn parse_never_panics_on_junk() {
        for raw in ["::::", "%%%", "\u{0}", "CACHE:Foo", "  ", "a:b:c:d:e"] {
            let _ = ImageReference::parse(raw);
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let title = "Street Fighter II: The World Warrior";
        assert_eq!(decode_component(&encode_component(title)), title);
        assert_eq!(encode_component("Chrono Trigger"), "Chrono%20Trigger");
    }

    #[test]
    fn decode_tolerates_plus_and_malformed_escapes() {
        assert_eq!(decode_component("Chrono+Trigger"), "Chrono Trigger");
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz"), "%zz");
    }

    #[test]
    fn source_round_trips_through_str() {
        for source in [
            Source::Wikimedia,
            Source::Tgdb,
            Source::Screenscraper,
            Source::Auto,
            Source::Cache,
        ] {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert!("flickr".parse::<Source>().is_err());
    }
}
