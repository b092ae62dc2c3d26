// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) caching.
//!
//! ## Tiers
//!
//! 1. **Local**: in-process LRU, bounded entry count, max-age per entry.
//!    Bounds how long this instance can lag a key rotation picked up by
//!    another instance.
//! 2. **Remote**: the shared [`RemoteCache`], one serialized snapshot under
//!    `<prefix>:<realm>`. Spreads identity-provider load across instances.
//! 3. **Fetch**: the [`KeySetFetcher`], only on a miss in both tiers or on
//!    an explicit refresh. A successful fetch populates both tiers.
//!
//! The local tier only ever holds snapshots that came from a fetch or from
//! the remote tier, so every read yields exactly one snapshot.
//!
//! ## Concurrency
//!
//! - Snapshots are published as `Arc<KeySetSnapshot>`; readers keep their
//!   `Arc` for the whole verification call.
//! - Locks are held only for map operations, never across an `.await`.
//! - Every publish bumps a generation counter under the local lock. A
//!   remote-tier read only back-fills the local tier if no publish happened
//!   since the read began, so an older shared value never replaces a newer
//!   fetch.
//! - At most one fetch is in flight. Concurrent misses and refreshes await
//!   the same shared future. The fetch runs on its own task, so a caller
//!   that gives up does not cancel it.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use lru::LruCache;
use tracing::{debug, info, warn};

use super::error::KeySetError;
use super::fetcher::KeySetFetcher;
use super::keys::KeySetSnapshot;
use crate::cache::RemoteCache;
use crate::metrics::GatewayMetrics;

/// Default remote tier TTL (5 minutes).
pub const DEFAULT_REMOTE_TTL: Duration = Duration::from_secs(300);

/// Default local tier max age (10 minutes).
pub const DEFAULT_LOCAL_MAX_AGE: Duration = Duration::from_secs(600);

/// Default local tier capacity.
pub const DEFAULT_LOCAL_MAX_ENTRIES: usize = 10;

/// Tunables for [`JwksCache`].
#[derive(Debug, Clone)]
pub struct JwksCacheConfig {
    /// Key of the snapshot in both tiers.
    pub cache_key: String,
    pub remote_ttl: Duration,
    pub local_max_age: Duration,
    pub local_max_entries: usize,
}

impl JwksCacheConfig {
    pub fn new(cache_key: impl Into<String>) -> Self {
        Self {
            cache_key: cache_key.into(),
            remote_ttl: DEFAULT_REMOTE_TTL,
            local_max_age: DEFAULT_LOCAL_MAX_AGE,
            local_max_entries: DEFAULT_LOCAL_MAX_ENTRIES,
        }
    }

    pub fn with_remote_ttl(mut self, ttl: Duration) -> Self {
        self.remote_ttl = ttl;
        self
    }

    pub fn with_local_max_age(mut self, max_age: Duration) -> Self {
        self.local_max_age = max_age;
        self
    }

    pub fn with_local_max_entries(mut self, entries: usize) -> Self {
        self.local_max_entries = entries;
        self
    }
}

/// Why a fetch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchTrigger {
    Miss,
    Refresh,
}

impl FetchTrigger {
    fn as_str(self) -> &'static str {
        match self {
            FetchTrigger::Miss => "miss",
            FetchTrigger::Refresh => "refresh",
        }
    }
}

type FetchResult = Result<Arc<KeySetSnapshot>, KeySetError>;
type InflightFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Local cache entry.
struct LocalEntry {
    snapshot: Arc<KeySetSnapshot>,
    inserted_at: Instant,
}

struct Inner {
    fetcher: Arc<dyn KeySetFetcher>,
    remote: Arc<dyn RemoteCache>,
    local: Mutex<LruCache<String, LocalEntry>>,
    /// Bumped on every publish, under the `local` lock.
    generation: AtomicU64,
    inflight: Mutex<Option<InflightFetch>>,
    config: JwksCacheConfig,
    metrics: GatewayMetrics,
}

/// Two-tier JWKS cache with single-flight fetching.
#[derive(Clone)]
pub struct JwksCache {
    inner: Arc<Inner>,
}

impl JwksCache {
    pub fn new(
        fetcher: Arc<dyn KeySetFetcher>,
        remote: Arc<dyn RemoteCache>,
        config: JwksCacheConfig,
        metrics: GatewayMetrics,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.local_max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Inner {
                fetcher,
                remote,
                local: Mutex::new(LruCache::new(capacity)),
                generation: AtomicU64::new(0),
                inflight: Mutex::new(None),
                config,
                metrics,
            }),
        }
    }

    pub fn config(&self) -> &JwksCacheConfig {
        &self.inner.config
    }

    /// Current key set: local tier, then remote tier, then a (shared) fetch.
    pub async fn get_keys(&self) -> FetchResult {
        let seen = self.inner.generation.load(Ordering::Acquire);

        if let Some(snapshot) = self.inner.local_get() {
            self.inner.metrics.record_cache_hit("local");
            return Ok(snapshot);
        }

        if let Some(snapshot) = self.inner.remote_get().await {
            self.inner.metrics.record_cache_hit("remote");
            return Ok(self.inner.backfill(snapshot, seen));
        }

        self.join_fetch(FetchTrigger::Miss).await
    }

    /// Fetch a new snapshot regardless of freshness and publish it to both
    /// tiers.
    ///
    /// On failure nothing is published or evicted: the previous snapshot
    /// stays in force until its own TTL runs out. Joins a fetch that is
    /// already in flight instead of starting a second one.
    pub async fn refresh(&self) -> FetchResult {
        self.join_fetch(FetchTrigger::Refresh).await
    }

    /// Whether the local tier holds a fresh snapshot.
    pub fn is_warm(&self) -> bool {
        self.inner.local_peek()
    }

    async fn join_fetch(&self, trigger: FetchTrigger) -> FetchResult {
        let fetch = {
            let mut slot = self
                .inner
                .inflight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match slot.as_ref() {
                Some(fetch) => fetch.clone(),
                None => {
                    // A fetch may have completed between our tier checks and
                    // taking the slot.
                    if trigger == FetchTrigger::Miss {
                        if let Some(snapshot) = self.inner.local_get() {
                            return Ok(snapshot);
                        }
                    }
                    let fetch = Inner::spawn_fetch(Arc::clone(&self.inner), trigger);
                    *slot = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }
}

/// Clears the in-flight slot when the fetch task ends, including by panic.
struct InflightGuard(Arc<Inner>);

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Inner {
    fn spawn_fetch(inner: Arc<Inner>, trigger: FetchTrigger) -> InflightFetch {
        let task = tokio::spawn(async move {
            let _guard = InflightGuard(Arc::clone(&inner));
            debug!(trigger = trigger.as_str(), "Fetching signing keys");

            match inner.fetcher.fetch().await {
                Ok(snapshot) => {
                    let snapshot = Arc::new(snapshot);
                    inner.metrics.record_jwks_fetch(trigger.as_str(), "ok");
                    inner.publish(Arc::clone(&snapshot)).await;
                    Ok(snapshot)
                }
                Err(err) => {
                    inner.metrics.record_jwks_fetch(trigger.as_str(), err.outcome());
                    Err(err)
                }
            }
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(KeySetError::Unavailable(format!(
                    "key set fetch task failed: {e}"
                )))
            })
        }
        .boxed()
        .shared()
    }

    fn local_get(&self) -> Option<Arc<KeySetSnapshot>> {
        let key = &self.config.cache_key;
        let mut local = self.local.lock().ok()?;

        let cached = local.get(key).map(|entry| {
            (
                entry.inserted_at.elapsed() < self.config.local_max_age,
                Arc::clone(&entry.snapshot),
            )
        });

        match cached {
            Some((true, snapshot)) => Some(snapshot),
            Some((false, _)) => {
                local.pop(key);
                None
            }
            None => None,
        }
    }

    fn local_peek(&self) -> bool {
        let Ok(local) = self.local.lock() else {
            return false;
        };
        local
            .peek(&self.config.cache_key)
            .is_some_and(|entry| entry.inserted_at.elapsed() < self.config.local_max_age)
    }

    fn local_entry(snapshot: Arc<KeySetSnapshot>) -> LocalEntry {
        LocalEntry {
            snapshot,
            inserted_at: Instant::now(),
        }
    }

    /// Stores a remote-tier snapshot locally unless something was published
    /// after generation `seen`; in that case the newer local snapshot wins.
    fn backfill(&self, snapshot: Arc<KeySetSnapshot>, seen: u64) -> Arc<KeySetSnapshot> {
        let Ok(mut local) = self.local.lock() else {
            return snapshot;
        };

        if self.generation.load(Ordering::Acquire) != seen {
            debug!("Skipping shared key set back-fill, a newer set was published");
            return local
                .peek(&self.config.cache_key)
                .map(|entry| Arc::clone(&entry.snapshot))
                .unwrap_or(snapshot);
        }

        local.put(
            self.config.cache_key.clone(),
            Self::local_entry(Arc::clone(&snapshot)),
        );
        snapshot
    }

    fn local_publish(&self, snapshot: Arc<KeySetSnapshot>) {
        let mut local = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        local.put(self.config.cache_key.clone(), Self::local_entry(snapshot));
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    async fn remote_get(&self) -> Option<Arc<KeySetSnapshot>> {
        let raw = match self.remote.get(&self.config.cache_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Shared key set cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<KeySetSnapshot>(&raw) {
            Ok(snapshot) => Some(Arc::new(snapshot)),
            Err(e) => {
                warn!(error = %e, "Discarding undecodable key set from shared cache");
                None
            }
        }
    }

    async fn publish(&self, snapshot: Arc<KeySetSnapshot>) {
        self.local_publish(Arc::clone(&snapshot));

        let raw = match serde_json::to_string(snapshot.as_ref()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize key set for shared cache");
                return;
            }
        };

        if let Err(e) = self
            .remote
            .set(&self.config.cache_key, &raw, self.config.remote_ttl)
            .await
        {
            warn!(error = %e, "Shared key set cache write failed");
            return;
        }

        info!(keys = snapshot.len(), "Published signing key set");
    }
}
