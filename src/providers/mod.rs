//! Cover providers for external image sources.
//!
//! This module defines the [`CoverProvider`] trait that all provider
//! backends implement, the error taxonomy shared at the adapter
//! boundary, and the registry mapping a requested [`Source`] to the
//! adapter that will serve it.
//!
//! # Module layout
//!
//! - [`registry`] -- Source-to-adapter registry.
//! - [`wikimedia`] -- Content-scrape adapter, the only real backend today.
//! - [`tgdb`] -- Capability slot for a TheGamesDB REST client.
//! - [`screenscraper`] -- Capability slot for a ScreenScraper REST client.

pub mod registry;
pub mod screenscraper;
pub mod tgdb;
pub mod wikimedia;

pub use registry::ProviderRegistry;
pub use screenscraper::ScreenscraperProvider;
pub use tgdb::TgdbProvider;
pub use wikimedia::WikimediaProvider;

use async_trait::async_trait;

/// Errors a provider can surface. All of them are recoverable from the
/// resolution engine's point of view: a failed provider means the cover
/// is unavailable, never a fault propagated to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not find or extract a cover for the query.
    #[error("no cover image found")]
    Miss,

    /// Transport-level failure talking to the external endpoint.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a shape we do not understand.
    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Async interface all cover providers implement.
///
/// Each provider wraps a single external source and produces a
/// renderable image URL for a (title, platform) pair. Providers are
/// wrapped in an `Arc` and shared across tasks.
#[async_trait]
pub trait CoverProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"wikimedia"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider is ready to serve requests.
    fn is_available(&self) -> bool;

    /// Produce an image URL for the given game, or fail with a
    /// [`ProviderError`].
    async fn resolve_cover(&self, title: &str, platform: &str)
        -> Result<String, ProviderError>;
}
