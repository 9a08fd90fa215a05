//! Coalescing tile cache.
//!
//! Tiles are cached by `(level, index)` for the lifetime of the cache. There
//! is no eviction and no expiry; callers that need a bound wrap this type in
//! their own policy.
//!
//! # Singleflight
//!
//! Concurrent lookups for the same uncached key share one retrieval. The
//! first caller becomes the leader and fetches from the source; later callers
//! wait on the leader's result, success or miss alike. Failures are never
//! cached, so the next lookup after a miss retries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, warn};

use super::source::{TileKey, TileSource};

/// State of one in-flight retrieval, broadcast to waiters.
#[derive(Debug, Clone)]
enum Flight {
    Pending,
    Done(Option<Bytes>),
}

/// What the calling task does for a lookup that missed the fast path.
enum Role {
    Hit(Bytes),
    Leader(watch::Sender<Flight>),
    Follower(watch::Receiver<Flight>),
}

/// Result of a cache lookup with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLookup {
    /// Tile payload, or `None` for a miss
    pub data: Option<Bytes>,

    /// Whether the payload was already cached
    pub cache_hit: bool,
}

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,

    /// Retrievals issued to the source
    pub retrievals: u64,

    /// Retrievals that failed and resolved to a miss
    pub failures: u64,

    /// Lookups that joined another caller's retrieval
    pub coalesced: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    retrievals: AtomicU64,
    failures: AtomicU64,
    coalesced: AtomicU64,
}

/// In-memory tile cache with at most one retrieval per key in flight.
///
/// # Thread Safety
///
/// The cache is safe to share across tasks via `Arc`. A payload becomes
/// visible to readers only once fully inserted.
///
/// # Example
///
/// ```ignore
/// use tile_viewport::tile::{HttpTileSource, TileCache, TileKey};
///
/// let source = HttpTileSource::new("http://localhost:8000/nebula")?;
/// let cache = TileCache::new(source);
///
/// // First call fetches, the second is served from memory.
/// let tile = cache.fetch(TileKey::new(1, 0)).await;
/// let again = cache.fetch(TileKey::new(1, 0)).await;
/// ```
pub struct TileCache<S> {
    /// The underlying tile source
    source: Arc<S>,

    /// Completed tiles
    entries: RwLock<HashMap<TileKey, Bytes>>,

    /// In-flight retrievals for the singleflight pattern
    in_flight: Mutex<HashMap<TileKey, watch::Receiver<Flight>>>,

    counters: Counters,
}

impl<S: TileSource> TileCache<S> {
    /// Create an empty cache over `source`.
    pub fn new(source: S) -> Self {
        Self::with_shared_source(Arc::new(source))
    }

    /// Create an empty cache over a source shared with other components.
    pub fn with_shared_source(source: Arc<S>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Serve `key` from the cache, or retrieve and cache it.
    ///
    /// Returns `None` when the retrieval failed; nothing is cached in that
    /// case.
    pub async fn fetch(&self, key: TileKey) -> Option<Bytes> {
        self.lookup(key).await.data
    }

    /// Like [`TileCache::fetch`], also reporting whether it was a cache hit.
    pub async fn lookup(&self, key: TileKey) -> TileLookup {
        loop {
            // Fast path: check cache
            if let Some(data) = self.get(&key).await {
                return self.hit(key, data);
            }

            // Slow path: join an in-flight retrieval or become leader
            let role = {
                let mut in_flight = self.in_flight.lock().await;

                // A closed channel means the leader was dropped mid-fetch.
                let leader = in_flight
                    .get(&key)
                    .filter(|rx| rx.has_changed().is_ok())
                    .cloned();

                match leader {
                    Some(rx) => Role::Follower(rx),
                    None => {
                        // A leader may have finished since the fast path.
                        let cached = self.entries.read().await.get(&key).cloned();
                        match cached {
                            Some(data) => Role::Hit(data),
                            None => {
                                let (tx, rx) = watch::channel(Flight::Pending);
                                in_flight.insert(key, rx);
                                Role::Leader(tx)
                            }
                        }
                    }
                }
            };

            match role {
                Role::Hit(data) => return self.hit(key, data),
                Role::Leader(tx) => {
                    let data = self.retrieve_as_leader(key).await;
                    tx.send_replace(Flight::Done(data.clone()));
                    return TileLookup {
                        data,
                        cache_hit: false,
                    };
                }
                Role::Follower(mut rx) => {
                    self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                    let outcome = rx
                        .wait_for(|flight| matches!(flight, Flight::Done(_)))
                        .await
                        .map(|flight| match &*flight {
                            Flight::Done(data) => data.clone(),
                            Flight::Pending => None,
                        });

                    match outcome {
                        Ok(data) => {
                            return TileLookup {
                                data,
                                cache_hit: false,
                            }
                        }
                        Err(_) => {
                            // Leader went away; clear its entry and try again.
                            let mut in_flight = self.in_flight.lock().await;
                            if in_flight
                                .get(&key)
                                .is_some_and(|current| current.same_channel(&rx))
                            {
                                in_flight.remove(&key);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Fetch from the source, publish the result, and clear the in-flight entry.
    async fn retrieve_as_leader(&self, key: TileKey) -> Option<Bytes> {
        self.counters.retrievals.fetch_add(1, Ordering::Relaxed);
        debug!(%key, source = self.source.identifier(), "retrieving tile");

        let data = match self.source.retrieve(key).await {
            Ok(data) => Some(data),
            Err(err) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%key, source = self.source.identifier(), error = %err, "tile unavailable");
                None
            }
        };

        // Lock order: in_flight, then entries
        let mut in_flight = self.in_flight.lock().await;
        if let Some(ref data) = data {
            self.entries.write().await.insert(key, data.clone());
        }
        in_flight.remove(&key);

        data
    }

    fn hit(&self, key: TileKey, data: Bytes) -> TileLookup {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!(%key, "tile cache hit");
        TileLookup {
            data: Some(data),
            cache_hit: true,
        }
    }

    /// Cached payload for `key`, without any I/O.
    pub async fn get(&self, key: &TileKey) -> Option<Bytes> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &TileKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Number of cached tiles.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Total size of cached payloads in bytes.
    pub async fn size(&self) -> usize {
        self.entries.read().await.values().map(Bytes::len).sum()
    }

    /// Number of retrievals currently in flight.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            retrievals: self.counters.retrievals.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
