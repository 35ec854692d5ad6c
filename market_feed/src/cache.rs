//! Time-boxed memoization of provider fetches.
//!
//! [`BarCache`] maps a [`CacheKey`] (symbol set, interval, lookback length) to
//! the last successful fetch and the instant it completed. Lookups compare the
//! entry's age against the TTL at call time; an expired entry is simply a miss
//! and the caller fetches again. Failed fetches are never stored.
//!
//! Implementation notes:
//! - The entry map lives behind `arc-swap`: readers load an `Arc` snapshot
//!   without locking, writers copy the map, modify it and swap it in.
//! - Expired entries are dropped whenever a new entry is written.
//! - Time is passed in explicitly so the TTL logic is testable; the
//!   [`CachedProvider`] wrapper reads it from an injectable [`Clock`].

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::{
    models::{request_params::BarsRequestParams, timeframe::Timeframe},
    providers::{DataProvider, FetchedBars, ProviderError},
};

/// Identifies one kind of request, independent of when it was made.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    symbols: Vec<String>,
    timeframe: Timeframe,
    lookback_secs: i64,
}

impl CacheKey {
    /// Symbol order and duplicates do not matter.
    pub fn from_params(params: &BarsRequestParams) -> Self {
        let mut symbols = params.symbols.clone();
        symbols.sort();
        symbols.dedup();
        Self {
            symbols,
            timeframe: params.timeframe,
            lookback_secs: (params.end - params.start).num_seconds(),
        }
    }
}

/// A cached fetch result.
#[derive(Debug)]
pub struct CacheEntry {
    pub bars: FetchedBars,
    pub fetched_at: DateTime<Utc>,
}

type EntryMap = HashMap<CacheKey, Arc<CacheEntry>>;

pub struct BarCache {
    ttl: Duration,
    entries: ArcSwap<EntryMap>,
}

impl BarCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: ArcSwap::from_pointee(EntryMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.fetched_at < self.ttl
    }

    /// Returns the entry for `key` if it is younger than the TTL at `now`.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Arc<CacheEntry>> {
        let snap = self.entries.load();
        snap.get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .cloned()
    }

    /// Stores a fetch result, evicting entries that have expired by `now`.
    pub fn insert(&self, key: CacheKey, bars: FetchedBars, now: DateTime<Utc>) {
        let entry = Arc::new(CacheEntry {
            bars,
            fetched_at: now,
        });
        self.entries.rcu(|current| {
            let mut next: EntryMap = current
                .iter()
                .filter(|(_, e)| self.is_fresh(e, now))
                .map(|(k, e)| (k.clone(), Arc::clone(e)))
                .collect();
            next.insert(key.clone(), Arc::clone(&entry));
            next
        });
    }

    /// Drops every entry; the next lookup of any key is a miss.
    pub fn clear(&self) {
        self.entries.store(Arc::new(EntryMap::new()));
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A [`DataProvider`] that answers from a [`BarCache`] while the entry is fresh.
pub struct CachedProvider<P> {
    inner: P,
    cache: BarCache,
    clock: Clock,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, Arc::new(Utc::now))
    }

    pub fn with_clock(inner: P, ttl: Duration, clock: Clock) -> Self {
        Self {
            inner,
            cache: BarCache::new(ttl),
            clock,
        }
    }

    pub fn cache(&self) -> &BarCache {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: DataProvider> DataProvider for CachedProvider<P> {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<FetchedBars, ProviderError> {
        let key = CacheKey::from_params(&params);

        if let Some(entry) = self.cache.get(&key, (self.clock)()) {
            debug!(fetched_at = %entry.fetched_at, "serving bars from cache");
            return Ok(entry.bars.clone());
        }

        let bars = self.inner.fetch_bars(params).await?;
        self.cache.insert(key, bars.clone(), (self.clock)());
        Ok(bars)
    }
}
