use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::trace;

use crate::error::Result;
use crate::source::DegreeSource;
use crate::types::Vertex;

/// Read-through cache of vertex degrees shared by all scoring workers.
///
/// A cached degree is never recomputed within a run. Two workers missing on the same
/// key may both call the backend; the later insert overwrites the earlier one with
/// the same value.
#[derive(Debug)]
pub struct DegreeCache<V> {
    entries: RwLock<FxHashMap<V, u64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Counters describing how the cache was used during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DegreeCacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the degree source.
    pub misses: u64,
    /// Entries currently cached.
    pub entries: usize,
}

impl<V: Vertex> Default for DegreeCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Vertex> DegreeCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache pre-populated with known degrees.
    pub fn seeded<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = (V, u64)>,
    {
        let cache = Self::new();
        cache.entries.write().extend(seed);
        cache
    }

    /// Returns the cached degree of `vertex` without touching the source.
    pub fn cached(&self, vertex: &V) -> Option<u64> {
        self.entries.read().get(vertex).copied()
    }

    /// Records a degree, overwriting any previous value.
    pub fn insert(&self, vertex: V, degree: u64) {
        self.entries.write().insert(vertex, degree);
    }

    /// Returns the degree of `vertex`, asking `source` only on a miss.
    ///
    /// Errors from the source (including `VertexNotFound`) are propagated and
    /// nothing is cached for the vertex.
    pub fn get_degree<S>(&self, vertex: &V, source: &S) -> Result<u64>
    where
        S: DegreeSource<V> + ?Sized,
    {
        if let Some(degree) = self.cached(vertex) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(degree);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        // No lock is held across the backend call.
        let degree = source.fetch_degree(vertex)?;
        trace!(?vertex, degree, "degree cache fill");
        self.insert(vertex.clone(), degree);
        Ok(degree)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> DegreeCacheStats {
        DegreeCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
