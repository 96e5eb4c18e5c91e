//! ScreenScraper cover provider, currently a capability slot.
//!
//! ScreenScraper's API wants registered credentials and per-system game
//! IDs. Until a real client lands, the adapter delegates to the
//! content-scrape provider so that references scoped to
//! `screenscraper:` still resolve.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{CoverProvider, ProviderError};

pub struct ScreenscraperProvider {
    delegate: Arc<dyn CoverProvider>,
}

impl ScreenscraperProvider {
    /// Wrap the provider that serves requests until a real ScreenScraper
    /// client exists.
    pub fn new(delegate: Arc<dyn CoverProvider>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl CoverProvider for ScreenscraperProvider {
    fn name(&self) -> &'static str {
        "screenscraper"
    }

    fn is_available(&self) -> bool {
        self.delegate.is_available()
    }

    async fn resolve_cover(
        &self,
        title: &str,
        platform: &str,
    ) -> Result<String, ProviderError> {
        debug!(
            title,
            delegate = self.delegate.name(),
            "screenscraper adapter not implemented; delegating"
        );
        self.delegate.resolve_cover(title, platform).await
    }
}
