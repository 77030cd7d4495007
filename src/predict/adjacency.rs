use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::error::{LinkPredError, Result};
use crate::source::AdjacencySource;
use crate::types::Vertex;

/// Neighbor sets of every hub vertex, in the order the source reported them.
///
/// Built once per run and read-only afterwards, so workers share it without locking.
#[derive(Clone, Debug)]
pub struct AdjacencyIndex<V> {
    min_degree: u64,
    hubs: Vec<V>,
    positions: FxHashMap<V, usize>,
    degrees: Vec<u64>,
    neighbors: Vec<FxHashSet<V>>,
}

impl<V: Vertex> AdjacencyIndex<V> {
    /// Fetches every hub with degree `>= min_degree` from `source` and indexes it.
    ///
    /// Any source failure, or a hub reported twice, fails the whole build with
    /// [`LinkPredError::BulkFetch`]. Records below the threshold are discarded.
    pub fn build<S>(source: &S, min_degree: u64) -> Result<Self>
    where
        S: AdjacencySource<V> + ?Sized,
    {
        let records = source
            .fetch_min_degree_adjacency(min_degree)
            .map_err(|err| LinkPredError::BulkFetch(Box::new(err)))?;

        let mut index = Self {
            min_degree,
            hubs: Vec::with_capacity(records.len()),
            positions: FxHashMap::default(),
            degrees: Vec::with_capacity(records.len()),
            neighbors: Vec::with_capacity(records.len()),
        };
        let mut below_threshold = 0usize;
        for record in records {
            if record.degree < min_degree {
                below_threshold += 1;
                trace!(vertex = ?record.vertex, degree = record.degree, "hub below threshold");
                continue;
            }
            if index.positions.contains_key(&record.vertex) {
                return Err(LinkPredError::BulkFetch(Box::new(
                    LinkPredError::InvalidData(format!(
                        "hub {:?} reported more than once",
                        record.vertex
                    )),
                )));
            }
            index.positions.insert(record.vertex.clone(), index.hubs.len());
            index.hubs.push(record.vertex);
            index.degrees.push(record.degree);
            index.neighbors.push(record.neighbors.into_iter().collect());
        }
        debug!(
            hubs = index.hubs.len(),
            below_threshold, min_degree, "adjacency index built"
        );
        Ok(index)
    }

    /// Threshold the index was built with.
    pub fn min_degree(&self) -> u64 {
        self.min_degree
    }

    /// Hub vertices in source order.
    pub fn hubs(&self) -> &[V] {
        &self.hubs
    }

    /// Number of hubs.
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    /// Returns `true` when no vertex met the threshold.
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Returns `true` if `vertex` is a hub.
    pub fn contains(&self, vertex: &V) -> bool {
        self.positions.contains_key(vertex)
    }

    /// Neighbor set of `vertex`.
    ///
    /// Every scoring candidate must be indexed; asking for anything else is
    /// [`LinkPredError::VertexNotIndexed`].
    pub fn neighbors(&self, vertex: &V) -> Result<&FxHashSet<V>> {
        self.positions
            .get(vertex)
            .map(|&pos| &self.neighbors[pos])
            .ok_or_else(|| LinkPredError::vertex_not_indexed(vertex))
    }

    /// Hub degrees as reported by the bulk fetch, used to seed the degree cache.
    pub fn hub_degrees(&self) -> impl Iterator<Item = (V, u64)> + '_ {
        self.hubs.iter().cloned().zip(self.degrees.iter().copied())
    }
}
