//! TheGamesDB cover provider, currently a capability slot.
//!
//! A real implementation would query the TheGamesDB REST API, which
//! needs an API key and its own response mapping. Until one lands, the
//! adapter delegates to the content-scrape provider so that references
//! scoped to `tgdb:` still resolve to something renderable.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{CoverProvider, ProviderError};

pub struct TgdbProvider {
    delegate: Arc<dyn CoverProvider>,
}

impl TgdbProvider {
    /// Wrap the provider that serves requests until a real TheGamesDB
    /// client exists.
    pub fn new(delegate: Arc<dyn CoverProvider>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl CoverProvider for TgdbProvider {
    fn name(&self) -> &'static str {
        "tgdb"
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
            "tgdb adapter not implemented; delegating"
        );
        self.delegate.resolve_cover(title, platform).await
    }
}
