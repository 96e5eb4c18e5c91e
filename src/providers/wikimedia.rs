//! Content-scrape cover provider backed by a MediaWiki encyclopedia.
//!
//! The encyclopedia has no cover-art API, so this adapter works from
//! three public, unauthenticated GET endpoints: full-text search to find
//! the game's page, the rendered page content from which the infobox
//! image is extracted, and a `pageimages` thumbnail lookup used as a
//! fallback when the infobox yields nothing. All responses are treated
//! as untrusted text and parsed defensively.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::debug;

use super::{CoverProvider, ProviderError};

const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_LIMIT: usize = 3;
const DEFAULT_THUMB_SIZE: u32 = 500;

/// Infobox selectors tried in order, most specific match class first.
/// The first table matching any of these supplies the image.
const INFOBOX_SELECTORS: &[&str] = &[
    "table.infobox.ib-video-game",
    "table.infobox.hproduct",
    "table.infobox.vg",
    "table.infobox",
];

/// Console page titles that full-text search likes to rank above the
/// game itself. A candidate whose title equals one of these
/// (case-insensitively) is skipped so we never resolve to the console's
/// own page.
const PLATFORM_PAGE_TITLES: &[&str] = &[
    "Nintendo Entertainment System",
    "Super Nintendo Entertainment System",
    "Nintendo 64",
    "GameCube",
    "Game Boy",
    "Game Boy Color",
    "Game Boy Advance",
    "Sega Genesis",
    "Mega Drive",
    "Master System",
    "Sega Saturn",
    "Dreamcast",
    "Game Gear",
    "PlayStation",
    "PlayStation 2",
    "Atari 2600",
    "Atari 7800",
    "TurboGrafx-16",
    "PC Engine",
    "Neo Geo",
];

// ---------------------------------------------------------------------------
// MediaWiki API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsePayload>,
}

#[derive(Debug, Deserialize)]
struct ParsePayload {
    text: ParseText,
}

#[derive(Debug, Deserialize)]
struct ParseText {
    #[serde(rename = "*")]
    html: String,
}

#[derive(Debug, Deserialize)]
struct PageImagesResponse {
    query: Option<PageImagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PageImagesQuery {
    #[serde(default)]
    pages: HashMap<String, PageImagesPage>,
}

#[derive(Debug, Deserialize)]
struct PageImagesPage {
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: String,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// Cover provider that scrapes the encyclopedia's game pages.
pub struct WikimediaProvider {
    client: reqwest::Client,
    endpoint: String,
    thumb_size: u32,
    skip_titles: Vec<String>,
}

impl WikimediaProvider {
    /// Create a provider against the default public endpoint.
    pub fn new() -> Self {
        Self::with_options(DEFAULT_ENDPOINT, REQUEST_TIMEOUT, DEFAULT_THUMB_SIZE, &[])
    }

    /// Create a provider with explicit endpoint, timeout, thumbnail size
    /// and extra console page titles to skip during filtering.
    pub fn with_options(
        endpoint: impl Into<String>,
        timeout: Duration,
        thumb_size: u32,
        extra_skip_titles: &[String],
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("boxart/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build reqwest client");

        let mut skip_titles: Vec<String> = PLATFORM_PAGE_TITLES
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        skip_titles.extend(extra_skip_titles.iter().map(|t| t.to_lowercase()));

        Self {
            client,
            endpoint: endpoint.into(),
            thumb_size,
            skip_titles,
        }
    }

    /// Full-text search, returning the top candidate page titles.
    async fn search_candidates(&self, query: &str) -> Result<Vec<String>, ProviderError> {
        debug!(query, "Searching encyclopedia");
        let limit = SEARCH_LIMIT.to_string();
        let body: SearchResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srlimit", limit.as_str()),
                ("srsearch", query),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .query
            .map(|q| {
                q.search
                    .into_iter()
                    .take(SEARCH_LIMIT)
                    .map(|hit| hit.title)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Drop index/listing pages and console pages from the candidates.
    fn filter_candidates(&self, candidates: Vec<String>) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|title| {
                let lower = title.to_lowercase();
                !lower.starts_with("list of") && !self.skip_titles.contains(&lower)
            })
            .collect()
    }

    /// Fetch a page's rendered HTML.
    async fn fetch_page_html(&self, page_title: &str) -> Result<String, ProviderError> {
        debug!(page = page_title, "Fetching rendered page");
        let body: ParseResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "parse"),
                ("prop", "text"),
                ("format", "json"),
                ("page", page_title),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        body.parse
            .map(|p| p.text.html)
            .ok_or_else(|| ProviderError::Parse("missing parse payload".to_string()))
    }

    /// Secondary lookup for a page's representative thumbnail.
    async fn page_thumbnail(&self, page_title: &str) -> Result<Option<String>, ProviderError> {
        debug!(page = page_title, "Falling back to page thumbnail lookup");
        let size = self.thumb_size.to_string();
        let body: PageImagesResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "pageimages"),
                ("piprop", "thumbnail"),
                ("format", "json"),
                ("pithumbsize", size.as_str()),
                ("titles", page_title),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|page| page.thumbnail)
            .map(|t| t.source))
    }
}

impl Default for WikimediaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoverProvider for WikimediaProvider {
    fn name(&self) -> &'static str {
        "wikimedia"
    }

    fn is_available(&self) -> bool {
        // Unauthenticated public endpoints, nothing to configure.
        true
    }

    async fn resolve_cover(
        &self,
        title: &str,
        platform: &str,
    ) -> Result<String, ProviderError> {
        let query = build_query(title, platform);
        let candidates = self.search_candidates(&query).await?;
        let mut surviving = self.filter_candidates(candidates);
        if surviving.is_empty() {
            debug!(query = %query, "All search candidates filtered out");
            return Err(ProviderError::Miss);
        }
        let page = surviving.remove(0);

        let html = self.fetch_page_html(&page).await?;
        if let Some(url) = extract_infobox_image(&html) {
            debug!(page = %page, url = %url, "Extracted infobox image");
            return Ok(url);
        }

        if let Some(thumb) = self.page_thumbnail(&page).await? {
            debug!(page = %page, url = %thumb, "Using page thumbnail");
            return Ok(normalize_protocol_relative(&thumb));
        }

        Err(ProviderError::Miss)
    }
}

// ---------------------------------------------------------------------------
// HTML extraction
// ---------------------------------------------------------------------------

/// Join the title and platform tokens into one search query.
fn build_query(title: &str, platform: &str) -> String {
    let mut query = title.trim().to_string();
    let platform = platform.trim();
    if !platform.is_empty() {
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(platform);
    }
    query
}

/// Find the page's infobox and pull its cover image URL out.
fn extract_infobox_image(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for selector_str in INFOBOX_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(table) = document.select(&selector).next() {
            return image_from_infobox(table);
        }
    }
    None
}

/// Row 1 of an infobox is the heading; row 2 conventionally holds the
/// cover image. Prefer an image in row 2, then fall back to the first
/// image anywhere in the box.
fn image_from_infobox(table: ElementRef<'_>) -> Option<String> {
    let row_selector = Selector::parse("tr").ok()?;
    let img_selector = Selector::parse("img").ok()?;

    let rows: Vec<ElementRef<'_>> = table.select(&row_selector).collect();
    if let Some(second_row) = rows.get(1) {
        if let Some(src) = first_image_src(second_row, &img_selector) {
            return Some(src);
        }
    }
    first_image_src(&table, &img_selector)
}

fn first_image_src(scope: &ElementRef<'_>, img_selector: &Selector) -> Option<String> {
    scope
        .select(img_selector)
        .find_map(|img| img.value().attr("src"))
        .map(normalize_protocol_relative)
}

/// Scraped image URLs are frequently protocol-relative (`//host/path`).
fn normalize_protocol_relative(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_joins_title_and_platform() {
        assert_eq!(build_query("Chrono Trigger", "snes"), "Chrono Trigger snes");
        assert_eq!(build_query("Chrono Trigger", ""), "Chrono Trigger");
        assert_eq!(build_query("", "snes"), "snes");
    }

    #[test]
    fn filtering_drops_listing_and_console_pages() {
        let provider = WikimediaProvider::new();
        let surviving = provider.filter_candidates(vec![
            "List of Game Boy games".to_string(),
            "Nintendo Entertainment System".to_string(),
            "Chrono Trigger".to_string(),
        ]);
        assert_eq!(surviving, vec!["Chrono Trigger".to_string()]);
    }

    #[test]
    fn filtering_is_case_insensitive() {
        let provider = WikimediaProvider::new();
        let surviving = provider.filter_candidates(vec![
            "LIST OF SNES GAMES".to_string(),
            "nintendo entertainment system".to_string(),
            "EarthBound".to_string(),
        ]);
        assert_eq!(surviving, vec!["EarthBound".to_string()]);
    }

    #[test]
    fn extra_skip_titles_are_honoured() {
        let provider = WikimediaProvider::with_options(
            DEFAULT_ENDPOINT,
            REQUEST_TIMEOUT,
            DEFAULT_THUMB_SIZE,
            &["Famicom Disk System".to_string()],
        );
        let surviving = provider.filter_candidates(vec![
            "Famicom Disk System".to_string(),
            "Kid Icarus".to_string(),
        ]);
        assert_eq!(surviving, vec!["Kid Icarus".to_string()]);
    }

    #[test]
    fn protocol_relative_urls_are_normalized() {
        assert_eq!(
            normalize_protocol_relative("//example.org/a.jpg"),
            "https://example.org/a.jpg"
        );
        assert_eq!(
            normalize_protocol_relative("https://example.org/a.jpg"),
            "https://example.org/a.jpg"
        );
    }

    #[test]
    fn infobox_image_prefers_second_row() {
        let html = r#"
            <html><body>
            <table class="infobox hproduct">
              <tbody>
                <tr><th>Chrono Trigger</th></tr>
                <tr><td><img src="//upload.example.org/cover.jpg"></td></tr>
                <tr><td><img src="//upload.example.org/screenshot.jpg"></td></tr>
              </tbody>
            </table>
            </body></html>
        "#;
        assert_eq!(
            extract_infobox_image(html).unwrap(),
            "https://upload.example.org/cover.jpg"
        );
    }

    #[test]
    fn infobox_image_falls_back_to_whole_box_scan() {
        // No image in the second row; the first image anywhere wins.
        let html = r#"
            <html><body>
            <table class="infobox">
              <tbody>
                <tr><th>Chrono Trigger</th></tr>
                <tr><td>Developer: Square</td></tr>
                <tr><td><img src="https://upload.example.org/late.jpg"></td></tr>
              </tbody>
            </table>
            </body></html>
        "#;
        assert_eq!(
            extract_infobox_image(html).unwrap(),
            "https://upload.example.org/late.jpg"
        );
    }

    #[test]
    fn most_specific_infobox_class_wins() {
        let html = r#"
            <html><body>
            <table class="infobox"><tbody>
              <tr><th>Generic</th></tr>
              <tr><td><img src="https://upload.example.org/generic.jpg"></td></tr>
            </tbody></table>
            <table class="infobox hproduct"><tbody>
              <tr><th>Specific</th></tr>
              <tr><td><img src="https://upload.example.org/specific.jpg"></td></tr>
            </tbody></table>
            </body></html>
        "#;
        assert_eq!(
            extract_infobox_image(html).unwrap(),
            "https://upload.example.org/specific.jpg"
        );
    }

    #[test]
    fn no_infobox_means_no_image() {
        assert!(extract_infobox_image("<html><body><p>plain page</p></body></html>").is_none());
        assert!(extract_infobox_image("not even html <<<").is_none());
    }

    #[test]
    fn search_response_parses() {
        let json = r#"{"query":{"search":[{"title":"Chrono Trigger","pageid":123},
                                          {"title":"Chrono Cross"}]}}"#;
        let body: SearchResponse = serde_json::from_str(json).unwrap();
        let titles: Vec<String> = body
            .query
            .unwrap()
            .search
            .into_iter()
            .map(|h| h.title)
            .collect();
        assert_eq!(titles, vec!["Chrono Trigger", "Chrono Cross"]);
    }

    #[test]
    fn parse_response_unwraps_star_key() {
        let json = r#"{"parse":{"title":"Chrono Trigger","text":{"*":"<html>x</html>"}}}"#;
        let body: ParseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.parse.unwrap().text.html, "<html>x</html>");
    }

    #[test]
    fn pageimages_response_parses() {
        let json = r#"{"query":{"pages":{"123":{"thumbnail":{"source":"https://t.example/x.jpg","width":500}}}}}"#;
        let body: PageImagesResponse = serde_json::from_str(json).unwrap();
        let thumb = body
            .query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|p| p.thumbnail)
            .map(|t| t.source);
        assert_eq!(thumb.as_deref(), Some("https://t.example/x.jpg"));
    }
}
