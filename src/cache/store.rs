//! The two-tier cache store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{persist, CacheEntry, CacheKey, CacheStats};
use crate::reference::Source;

/// Two-tier key/value store for resolved cover URLs.
///
/// Lookups check the session tier first, then the durable tier; a
/// durable hit is promoted into the session tier. Writes go through both
/// tiers and are mirrored to the durable file immediately. Durable I/O
/// failures are logged and swallowed, so the store degrades to
/// session-only behaviour rather than failing a resolution.
///
/// The store is an explicit instance owned by whoever resolves covers;
/// there is no process-wide singleton.
pub struct CacheStore {
    session: DashMap<String, CacheEntry>,
    durable: RwLock<HashMap<String, CacheEntry>>,
    path: Option<PathBuf>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    /// A store with no durable file. Both tiers live in memory; contents
    /// are lost when the process exits. Used by tests and one-off CLI
    /// invocations without a configured cache path.
    pub fn in_memory() -> Self {
        Self {
            session: DashMap::new(),
            durable: RwLock::new(HashMap::new()),
            path: None,
            ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Open a store backed by the durable file at `path`, loading any
    /// existing entries. An unreadable file degrades to an empty durable
    /// tier with a warning.
    pub fn open(path: PathBuf) -> Self {
        let entries = match persist::load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to load durable cache; starting empty");
                HashMap::new()
            }
        };
        debug!(path = ?path, entries = entries.len(), "Loaded durable cover cache");
        Self {
            session: DashMap::new(),
            durable: RwLock::new(entries),
            path: Some(path),
            ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Treat entries older than `ttl` as absent. Without this, entries
    /// live until overwritten or explicitly cleared.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Look up a key, session tier first.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let serialized = key.serialize();

        if let Some(entry) = self.session.get(&serialized) {
            if !self.is_expired(&entry) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.clone());
            }
        }

        let promoted = {
            let durable = self.durable.read();
            durable.get(&serialized).filter(|e| !self.is_expired(e)).cloned()
        };
        if let Some(entry) = promoted {
            self.session.insert(serialized, entry.clone());
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Write through both tiers, stamping the entry with the current time.
    /// Last write wins per key.
    pub fn put(&self, key: &CacheKey, url: &str, title: Option<&str>, source: Option<Source>) {
        let entry = CacheEntry {
            url: url.to_string(),
            timestamp: Utc::now(),
            title: title.map(str::to_string),
            source,
        };
        let serialized = key.serialize();
        self.session.insert(serialized.clone(), entry.clone());
        self.durable.write().insert(serialized, entry);
        self.persist();
    }

    /// Linear fallback scan over the durable tier for a key or stored
    /// title containing `fragment` (case-insensitive). Tolerates key
    /// shapes written by older grammar versions; O(n), last resort only.
    pub fn scan_broad(&self, fragment: &str) -> Option<CacheEntry> {
        let needle = fragment.to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let durable = self.durable.read();
        durable
            .iter()
            .filter(|(_, e)| !self.is_expired(e))
            .find(|(key, entry)| {
                key.to_lowercase().contains(&needle)
                    || entry
                        .title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .map(|(_, entry)| entry.clone())
    }

    /// Drop every entry in both tiers and persist the empty durable map.
    pub fn clear(&self) {
        self.session.clear();
        self.durable.write().clear();
        self.persist();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            session_entries: self.session.len(),
            durable_entries: self.durable.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now() - entry.timestamp > ttl,
            None => false,
        }
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let snapshot = self.durable.read().clone();
        if let Err(e) = persist::save_entries(path, &snapshot) {
            warn!(path = ?path, error = %e, "Failed to persist durable cache; continuing session-only");
        }
    }
}
