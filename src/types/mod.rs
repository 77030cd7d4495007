#![forbid(unsafe_code)]

//! Core value types shared by the prediction engine and graph sources.

use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

/// Opaque vertex identity.
///
/// Anything hashable and comparable for equality can identify a vertex; SNAP dumps
/// use integer ids while named graphs use strings. The blanket impl means callers
/// never implement this by hand.
pub trait Vertex: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T> Vertex for T where T: Clone + Eq + Hash + Debug + Send + Sync {}

/// Ordered pair of distinct, non-adjacent vertices queued for scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidatePair<V> {
    /// Vertex whose neighborhood drives the enumeration.
    pub source: V,
    /// Vertex tested as a possible new neighbor of `source`.
    pub target: V,
}

impl<V> CandidatePair<V> {
    /// Creates a candidate pair.
    pub fn new(source: V, target: V) -> Self {
        Self { source, target }
    }
}

/// Candidate pair together with its similarity score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredPair<V> {
    /// Source vertex of the pair.
    pub source: V,
    /// Target vertex of the pair.
    pub target: V,
    /// Similarity score; always strictly positive.
    pub score: f64,
}

impl<V> ScoredPair<V> {
    /// Creates a scored pair.
    pub fn new(source: V, target: V, score: f64) -> Self {
        Self {
            source,
            target,
            score,
        }
    }

    /// Rewrites both endpoints through `f`, keeping the score.
    pub fn map_vertices<W>(self, mut f: impl FnMut(V) -> W) -> ScoredPair<W> {
        ScoredPair {
            source: f(self.source),
            target: f(self.target),
            score: self.score,
        }
    }
}
