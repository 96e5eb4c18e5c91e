//! The cover resolution engine.
//!
//! Orchestrates the full lookup for one game: classify any explicit
//! reference, short-circuit values that are already renderable, consult
//! the two-tier cache, and only then walk the provider chain, writing
//! the result back through the cache. The engine holds no per-call
//! state; everything that persists lives in the injected [`CacheStore`].
//!
//! Concurrent resolutions of the same key are coalesced: one caller
//! performs the network work while the rest wait and then read the
//! freshly written cache entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::providers::ProviderRegistry;
use crate::reference::{ImageReference, Source};

/// One game's identity as supplied by the catalog.
#[derive(Debug, Clone)]
pub struct CoverRequest {
    pub title: String,
    pub platform: String,
    /// Pre-encoded reference stored alongside the game record, if any.
    pub reference: Option<String>,
    /// Source to prefer when no scoped reference dictates one.
    pub preferred_source: Option<Source>,
}

impl CoverRequest {
    pub fn new(title: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            platform: platform.into(),
            reference: None,
            preferred_source: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.preferred_source = Some(source);
        self
    }
}

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOrigin {
    /// Externally hosted direct URL passed through unchanged.
    Direct,
    /// Bundled or on-disk asset passed through unchanged.
    Local,
    /// Inline `data:` URI passed through unchanged.
    Embedded,
    /// Fetched from (or cached for) a provider.
    Provider(Source),
}

impl fmt::Display for CoverOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverOrigin::Direct => f.write_str("external"),
            CoverOrigin::Local => f.write_str("local"),
            CoverOrigin::Embedded => f.write_str("embedded"),
            CoverOrigin::Provider(source) => f.write_str(source.as_str()),
        }
    }
}

/// The artifact handed back to callers. Never carries pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub url: String,
    pub source: CoverOrigin,
    pub from_cache: bool,
}

/// Terminal outcome of a resolution. `Unavailable` is a value, not an
/// error; callers substitute their own static fallback image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolutionResult),
    Unavailable,
}

impl Resolution {
    pub fn into_result(self) -> Option<ResolutionResult> {
        match self {
            Resolution::Resolved(result) => Some(result),
            Resolution::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Resolution::Unavailable)
    }
}

enum FlightRole {
    Leader(OwnedMutexGuard<()>),
    Waiter(Arc<AsyncMutex<()>>),
}

/// The engine. Stateless per call; owns the cache store, the provider
/// registry and the in-flight table.
pub struct Resolver {
    store: Arc<CacheStore>,
    registry: ProviderRegistry,
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Resolver {
    pub fn new(store: Arc<CacheStore>, registry: ProviderRegistry) -> Self {
        Self {
            store,
            registry,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Resolve a cover for one game.
    pub async fn resolve(&self, request: &CoverRequest) -> Resolution {
        // Final values short-circuit before any cache or provider work.
        if let Some(raw) = request.reference.as_deref() {
            match ImageReference::parse(raw) {
                ImageReference::Direct(url) => {
                    return Resolution::Resolved(ResolutionResult {
                        url,
                        source: CoverOrigin::Direct,
                        from_cache: false,
                    });
                }
                ImageReference::LocalAsset(path) => {
                    return Resolution::Resolved(ResolutionResult {
                        url: path,
                        source: CoverOrigin::Local,
                        from_cache: false,
                    });
                }
                ImageReference::Embedded(uri) => {
                    return Resolution::Resolved(ResolutionResult {
                        url: uri,
                        source: CoverOrigin::Embedded,
                        from_cache: false,
                    });
                }
                ImageReference::Scoped { .. } => {}
            }
        }

        let key = self.cache_key(request);
        debug!(key = %key, "Resolving cover");

        if let Some(entry) = self.lookup(&key) {
            return self.cached(&key, entry);
        }
        self.resolve_uncached(&key, request).await
    }

    /// Derive the cache key for a request. A scoped reference's own
    /// triple is authoritative; otherwise the preferred source (or the
    /// registry default) pairs with the request's title and platform.
    pub fn cache_key(&self, request: &CoverRequest) -> CacheKey {
        if let Some(ImageReference::Scoped {
            source,
            title,
            platform,
        }) = request.reference.as_deref().map(ImageReference::parse)
        {
            return CacheKey::new(source, title, platform);
        }

        let platform = request.platform.trim();
        CacheKey::new(
            request
                .preferred_source
                .unwrap_or_else(|| self.registry.default_source()),
            request.title.clone(),
            (!platform.is_empty()).then(|| platform.to_string()),
        )
    }

    fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.store
            .get(key)
            .or_else(|| self.store.scan_broad(&key.title))
    }

    fn cached(&self, key: &CacheKey, entry: CacheEntry) -> Resolution {
        let source = entry.source.unwrap_or(key.source);
        Resolution::Resolved(ResolutionResult {
            url: entry.url,
            source: CoverOrigin::Provider(self.registry.effective_source(source)),
            from_cache: true,
        })
    }

    async fn resolve_uncached(&self, key: &CacheKey, request: &CoverRequest) -> Resolution {
        let serialized = key.serialize();
        loop {
            // The cache may have been filled while this caller waited.
            if let Some(entry) = self.lookup(key) {
                return self.cached(key, entry);
            }

            let role = {
                let mut in_flight = self.in_flight.lock();
                match in_flight.get(&serialized) {
                    Some(slot) => FlightRole::Waiter(slot.clone()),
                    None => {
                        let slot = Arc::new(AsyncMutex::new(()));
                        let guard = slot
                            .clone()
                            .try_lock_owned()
                            .expect("fresh mutex is lockable");
                        in_flight.insert(serialized.clone(), slot);
                        FlightRole::Leader(guard)
                    }
                }
            };

            match role {
                FlightRole::Waiter(slot) => {
                    // The leader holds this lock for the duration of its
                    // fetch; acquiring it means the leader is done. Loop
                    // back to re-check the cache, or take over on a
                    // leader failure.
                    drop(slot.lock().await);
                }
                FlightRole::Leader(guard) => {
                    let outcome = self.fetch(key, request).await;
                    self.in_flight.lock().remove(&serialized);
                    drop(guard);
                    return outcome;
                }
            }
        }
    }

    async fn fetch(&self, key: &CacheKey, request: &CoverRequest) -> Resolution {
        let effective = self.registry.effective_source(key.source);
        let Some(provider) = self.registry.get(key.source) else {
            warn!(source = %key.source, "No provider registered; cover unavailable");
            return Resolution::Unavailable;
        };

        let platform = key.platform.as_deref().unwrap_or(request.platform.as_str());
        match provider.resolve_cover(&key.title, platform).await {
            Ok(url) => {
                self.store
                    .put(key, &url, Some(&key.title), Some(effective));
                Resolution::Resolved(ResolutionResult {
                    url,
                    source: CoverOrigin::Provider(effective),
                    from_cache: false,
                })
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Provider could not produce a cover");
                Resolution::Unavailable
            }
        }
    }
}
