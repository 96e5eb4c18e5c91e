//! Registry mapping a requested [`Source`] to a provider adapter.

use std::collections::HashMap;
use std::sync::Arc;

use crate::reference::Source;

use super::CoverProvider;

/// Holds the configured provider adapters and decides which one serves a
/// request.
///
/// `Auto` and `Cache` are not adapters; both resolve to the default
/// source, as does any source with no registered adapter. The default is
/// fixed at construction so that resolution order cannot drift between
/// callers.
pub struct ProviderRegistry {
    adapters: HashMap<Source, Arc<dyn CoverProvider>>,
    default_source: Source,
}

impl ProviderRegistry {
    /// Create an empty registry whose fallback is `default_source`.
    pub fn new(default_source: Source) -> Self {
        Self {
            adapters: HashMap::new(),
            default_source,
        }
    }

    /// Register the adapter serving `source`. Registering the same source
    /// twice replaces the earlier adapter.
    pub fn register(&mut self, source: Source, adapter: Arc<dyn CoverProvider>) {
        self.adapters.insert(source, adapter);
    }

    /// The source every unresolvable request falls back to.
    pub fn default_source(&self) -> Source {
        self.default_source
    }

    /// Map a requested source to the one that will actually serve it.
    pub fn effective_source(&self, requested: Source) -> Source {
        match requested {
            Source::Auto | Source::Cache => self.default_source,
            s if self.adapters.contains_key(&s) => s,
            _ => self.default_source,
        }
    }

    /// Fetch the adapter for a requested source, after fallback mapping.
    pub fn get(&self, requested: Source) -> Option<Arc<dyn CoverProvider>> {
        self.adapters.get(&self.effective_source(requested)).cloned()
    }
}
