use rustc_hash::FxHashSet;

use super::adjacency::AdjacencyIndex;
use super::degree_cache::DegreeCache;
use crate::error::Result;
use crate::source::DegreeSource;
use crate::types::Vertex;

/// Read access to the graph available to a similarity function during scoring.
pub struct GraphView<'a, V, D: ?Sized> {
    index: &'a AdjacencyIndex<V>,
    cache: &'a DegreeCache<V>,
    degrees: &'a D,
}

impl<V, D: ?Sized> Clone for GraphView<'_, V, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, D: ?Sized> Copy for GraphView<'_, V, D> {}

impl<'a, V: Vertex, D: DegreeSource<V> + ?Sized> GraphView<'a, V, D> {
    /// Bundles the index, the shared degree cache and the degree backend.
    pub fn new(index: &'a AdjacencyIndex<V>, cache: &'a DegreeCache<V>, degrees: &'a D) -> Self {
        Self {
            index,
            cache,
            degrees,
        }
    }

    /// Neighbor set of an indexed vertex.
    pub fn neighbors(&self, vertex: &V) -> Result<&'a FxHashSet<V>> {
        self.index.neighbors(vertex)
    }

    /// Degree of any vertex, read through the shared cache.
    pub fn degree(&self, vertex: &V) -> Result<u64> {
        self.cache.get_degree(vertex, self.degrees)
    }
}

/// Pair-scoring function used by the parallel scorer.
///
/// `Ok(None)` excludes the pair from the ranking; `Ok(Some(score))` must be strictly
/// positive. Errors abort the owning worker.
pub trait Similarity<V: Vertex>: Sync {
    /// Scores the ordered pair `(v, u)`.
    fn score<D>(&self, v: &V, u: &V, graph: GraphView<'_, V, D>) -> Result<Option<f64>>
    where
        D: DegreeSource<V> + Sync + ?Sized;
}

/// Adamic-Adar index: sum of `1 / ln(degree(z))` over shared neighbors `z`.
///
/// No shared neighbor yields `None`. A shared neighbor of degree below two makes the
/// whole pair undefined, so the score is `None` whatever the other shared neighbors
/// contribute.
///
/// A failed degree lookup does not stop the scan: when another shared neighbor has
/// degree below two the pair is still `None`. The lookup error is returned only if no
/// shared neighbor voids the pair, so the outcome does not depend on set iteration
/// order.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdamicAdar;

impl<V: Vertex> Similarity<V> for AdamicAdar {
    fn score<D>(&self, v: &V, u: &V, graph: GraphView<'_, V, D>) -> Result<Option<f64>>
    where
        D: DegreeSource<V> + Sync + ?Sized,
    {
        let nv = graph.neighbors(v)?;
        let nu = graph.neighbors(u)?;
        let (small, large) = if nv.len() <= nu.len() {
            (nv, nu)
        } else {
            (nu, nv)
        };

        let mut degrees = Vec::new();
        let mut lookup_error = None;
        for z in small.iter().filter(|z| large.contains(*z)) {
            match graph.degree(z) {
                Ok(degree) if degree < 2 => return Ok(None),
                Ok(degree) => degrees.push(degree),
                Err(err) => {
                    lookup_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = lookup_error {
            return Err(err);
        }
        if degrees.is_empty() {
            return Ok(None);
        }

        // Fixed summation order keeps score(v, u) bit-identical to score(u, v).
        degrees.sort_unstable();
        let score = degrees
            .iter()
            .map(|&d| 1.0 / (d as f64).ln())
            .sum::<f64>();
        Ok(Some(score))
    }
}
