//! Cache-first access to the product-data service.

use std::time::Duration;

use serde_json::Value;

use super::stats::{CrawlStats, SkipReason};
use crate::cache::{is_empty_response, CacheKind, CachedAnswer, FileCache};
use crate::remote::{ProductDataService, RemoteError};

/// A [`ProductDataService`] behind a [`FileCache`].
///
/// Online, a miss calls the service and writes the answer through before
/// returning it: data as a normal entry, "not found" and empty answers as a
/// marker. Unavailability is not written. Offline, a miss is final and the
/// service is never called.
pub struct CachedSource<S> {
    cache: FileCache,
    service: S,
    offline: bool,
    search_limit: usize,
    pause_every: usize,
    pause: Duration,
    calls_since_pause: usize,
}

impl<S: ProductDataService> CachedSource<S> {
    pub fn new(cache: FileCache, service: S, offline: bool) -> Self {
        Self {
            cache,
            service,
            offline,
            search_limit: 10,
            pause_every: 0,
            pause: Duration::ZERO,
            calls_since_pause: 0,
        }
    }

    /// Candidate limit for number searches.
    #[must_use]
    pub const fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Sleep for `pause` after every `every` remote calls (0 disables).
    #[must_use]
    pub const fn with_pause(mut self, every: usize, pause: Duration) -> Self {
        self.pause_every = every;
        self.pause = pause;
        self
    }

    #[must_use]
    pub const fn is_offline(&self) -> bool {
        self.offline
    }

    #[must_use]
    pub const fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Answer `(kind, key)` from the cache, falling back to the service.
    pub fn fetch(
        &mut self,
        kind: CacheKind,
        key: &str,
        stats: &mut CrawlStats,
    ) -> Result<Value, SkipReason> {
        match self.cache.get(kind, key) {
            Some(CachedAnswer::Found(value)) => {
                stats.cache_hits += 1;
                tracing::debug!(kind = kind.label(), key, "Cache hit");
                return Ok(value);
            }
            Some(CachedAnswer::NotFound) => {
                stats.cache_hits += 1;
                tracing::debug!(kind = kind.label(), key, "Cached not-found");
                return Err(SkipReason::NotFound);
            }
            None => {}
        }
        stats.cache_misses += 1;

        if self.offline {
            tracing::debug!(kind = kind.label(), key, "Offline cache miss");
            return Err(SkipReason::OfflineMiss);
        }
        if !self.service.is_available() {
            return Err(SkipReason::RemoteUnavailable);
        }

        let result = self.call(kind, key);
        stats.remote_calls += 1;
        self.courtesy_pause();

        match result {
            Ok(value) if !is_empty_response(&value) => {
                if let Err(e) = self.cache.put(kind, key, &value) {
                    tracing::warn!("Failed to write cache entry for {}: {}", key, e);
                }
                Ok(value)
            }
            Ok(_) | Err(RemoteError::NotFound) => {
                if let Err(e) = self.cache.put_not_found(kind, key) {
                    tracing::warn!("Failed to write not-found entry for {}: {}", key, e);
                }
                Err(SkipReason::NotFound)
            }
            Err(err) => {
                tracing::debug!(
                    kind = kind.label(),
                    key,
                    service = self.service.name(),
                    "Remote call failed: {}",
                    err
                );
                Err(SkipReason::from(&err))
            }
        }
    }

    fn call(&self, kind: CacheKind, key: &str) -> crate::remote::RemoteResult {
        match kind {
            CacheKind::SearchByNumber => self.service.search(key, self.search_limit),
            CacheKind::DetailsByNumber => self.service.get_details_by_number(key),
            CacheKind::DetailsById => self.service.get_details(key),
            CacheKind::StructureById { depth } => self.service.get_substructure(key, depth),
            CacheKind::StructureByNumber { depth } => {
                self.service.get_substructure_by_number(key, depth)
            }
        }
    }

    fn courtesy_pause(&mut self) {
        if self.pause_every == 0 || self.pause.is_zero() {
            return;
        }
        self.calls_since_pause += 1;
        if self.calls_since_pause >= self.pause_every {
            self.calls_since_pause = 0;
            tracing::debug!("Pausing {:?} after {} remote calls", self.pause, self.pause_every);
            std::thread::sleep(self.pause);
        }
    }
}
