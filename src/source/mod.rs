#![forbid(unsafe_code)]

//! Graph collaborators consumed by the prediction engine.
//!
//! A backend (graph database client, in-memory graph, compressed file) only has to
//! answer two questions: which vertices meet a minimum degree together with their
//! neighbors, and what is the degree of an arbitrary vertex.

mod memory;

pub use memory::{MemoryGraph, Orientation};

use crate::error::Result;
use crate::types::Vertex;

/// One row of the bulk adjacency query: a hub vertex, its degree and its neighbors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubRecord<V> {
    /// The hub vertex.
    pub vertex: V,
    /// Degree reported by the backend; seeds the degree cache.
    pub degree: u64,
    /// Neighbors of the hub, in backend order.
    pub neighbors: Vec<V>,
}

impl<V> HubRecord<V> {
    /// Creates a hub record.
    pub fn new(vertex: V, degree: u64, neighbors: Vec<V>) -> Self {
        Self {
            vertex,
            degree,
            neighbors,
        }
    }
}

/// Bulk provider of hub adjacency.
pub trait AdjacencySource<V: Vertex> {
    /// Returns every vertex whose degree is at least `min_degree`, with its neighbors.
    ///
    /// Order of the returned records defines the enumeration order of candidate pairs.
    fn fetch_min_degree_adjacency(&self, min_degree: u64) -> Result<Vec<HubRecord<V>>>;
}

/// Point lookup of vertex degrees.
pub trait DegreeSource<V: Vertex> {
    /// Returns the degree of `vertex`.
    ///
    /// Must fail with [`crate::LinkPredError::VertexNotFound`] when the vertex does not
    /// exist, as opposed to returning zero.
    fn fetch_degree(&self, vertex: &V) -> Result<u64>;
}

impl<V: Vertex, T: AdjacencySource<V> + ?Sized> AdjacencySource<V> for &T {
    fn fetch_min_degree_adjacency(&self, min_degree: u64) -> Result<Vec<HubRecord<V>>> {
        (**self).fetch_min_degree_adjacency(min_degree)
    }
}

impl<V: Vertex, T: DegreeSource<V> + ?Sized> DegreeSource<V> for &T {
    fn fetch_degree(&self, vertex: &V) -> Result<u64> {
        (**self).fetch_degree(vertex)
    }
}
