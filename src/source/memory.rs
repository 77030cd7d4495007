use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::{AdjacencySource, DegreeSource, HubRecord};
use crate::error::{LinkPredError, Result};
use crate::types::Vertex;

/// How edges of a [`MemoryGraph`] contribute to neighborhoods.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Orientation {
    /// Neighbors are successors; degree is the out-degree.
    #[default]
    Directed,
    /// Each edge is visible from both endpoints.
    Undirected,
}

/// Adjacency-list graph held in memory.
///
/// Vertices keep their first-seen order, which fixes the order hubs are reported in.
/// Duplicate edges and self-loops are dropped on insertion.
#[derive(Clone, Debug)]
pub struct MemoryGraph<V> {
    orientation: Orientation,
    vertices: Vec<V>,
    positions: FxHashMap<V, usize>,
    adjacency: Vec<Vec<usize>>,
    edges: FxHashSet<(usize, usize)>,
}

impl<V: Vertex> MemoryGraph<V> {
    /// Creates an empty graph.
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            vertices: Vec::new(),
            positions: FxHashMap::default(),
            adjacency: Vec::new(),
            edges: FxHashSet::default(),
        }
    }

    /// Builds a graph from an edge iterator.
    pub fn from_edges<I>(orientation: Orientation, edges: I) -> Self
    where
        I: IntoIterator<Item = (V, V)>,
    {
        let mut graph = Self::new(orientation);
        let mut skipped = 0usize;
        for (src, dst) in edges {
            if !graph.add_edge(src, dst) {
                skipped += 1;
            }
        }
        debug!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            skipped,
            "memory graph built"
        );
        graph
    }

    /// Edge orientation of this graph.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of distinct vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertices in first-seen order.
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    /// Adds `vertex` if absent and returns its dense position.
    pub fn add_vertex(&mut self, vertex: V) -> usize {
        if let Some(&pos) = self.positions.get(&vertex) {
            return pos;
        }
        let pos = self.vertices.len();
        self.positions.insert(vertex.clone(), pos);
        self.vertices.push(vertex);
        self.adjacency.push(Vec::new());
        pos
    }

    /// Inserts an edge. Returns `false` for self-loops and duplicates.
    pub fn add_edge(&mut self, src: V, dst: V) -> bool {
        let s = self.add_vertex(src);
        let d = self.add_vertex(dst);
        if s == d {
            return false;
        }
        let key = match self.orientation {
            Orientation::Directed => (s, d),
            Orientation::Undirected => (s.min(d), s.max(d)),
        };
        if !self.edges.insert(key) {
            return false;
        }
        self.adjacency[s].push(d);
        if self.orientation == Orientation::Undirected {
            self.adjacency[d].push(s);
        }
        true
    }

    /// Degree of `vertex`, or `None` when the vertex is unknown.
    pub fn degree(&self, vertex: &V) -> Option<u64> {
        self.positions
            .get(vertex)
            .map(|&pos| self.adjacency[pos].len() as u64)
    }

    /// Neighbors of `vertex` in insertion order, or `None` when the vertex is unknown.
    pub fn neighbors(&self, vertex: &V) -> Option<impl Iterator<Item = &V> + '_> {
        let pos = *self.positions.get(vertex)?;
        Some(self.adjacency[pos].iter().map(|&n| &self.vertices[n]))
    }
}

impl<V: Vertex> AdjacencySource<V> for MemoryGraph<V> {
    fn fetch_min_degree_adjacency(&self, min_degree: u64) -> Result<Vec<HubRecord<V>>> {
        let hubs = self
            .adjacency
            .iter()
            .enumerate()
            .filter(|(_, adj)| adj.len() as u64 >= min_degree)
            .map(|(pos, adj)| {
                HubRecord::new(
                    self.vertices[pos].clone(),
                    adj.len() as u64,
                    adj.iter().map(|&n| self.vertices[n].clone()).collect(),
                )
            })
            .collect();
        Ok(hubs)
    }
}

impl<V: Vertex> DegreeSource<V> for MemoryGraph<V> {
    fn fetch_degree(&self, vertex: &V) -> Result<u64> {
        self.degree(vertex)
            .ok_or_else(|| LinkPredError::vertex_not_found(vertex))
    }
}
