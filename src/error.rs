//! Error type shared by the prediction engine and graph sources.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LinkPredError>;

/// Errors raised while building the adjacency index or scoring candidate pairs.
#[derive(Debug, Error)]
pub enum LinkPredError {
    /// The backing graph has no such vertex (distinct from a vertex of degree zero).
    #[error("vertex {0} not found")]
    VertexNotFound(String),
    /// A scoring candidate has no entry in the adjacency index.
    #[error("vertex {0} is not present in the adjacency index")]
    VertexNotIndexed(String),
    /// The initial bulk adjacency/degree fetch failed; nothing was scored.
    #[error("bulk adjacency fetch failed: {0}")]
    BulkFetch(#[source] Box<LinkPredError>),
    /// A scoring worker returned an error for its partition.
    #[error("worker {worker} failed: {source}")]
    WorkerFailure {
        /// Index of the failing partition.
        worker: usize,
        /// Error raised inside the worker.
        #[source]
        source: Box<LinkPredError>,
    },
    /// A scoring worker panicked before producing its partition result.
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked {
        /// Index of the failing partition.
        worker: usize,
        /// Panic payload, when it was a string.
        message: String,
    },
    /// A caller-supplied option was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Input data violated an expected format or invariant.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A collaborator (graph backend) reported a failure of its own.
    #[error("graph source error: {0}")]
    Source(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LinkPredError {
    /// Builds a [`LinkPredError::VertexNotFound`] from any debuggable vertex key.
    pub fn vertex_not_found(vertex: &impl std::fmt::Debug) -> Self {
        LinkPredError::VertexNotFound(format!("{vertex:?}"))
    }

    /// Builds a [`LinkPredError::VertexNotIndexed`] from any debuggable vertex key.
    pub fn vertex_not_indexed(vertex: &impl std::fmt::Debug) -> Self {
        LinkPredError::VertexNotIndexed(format!("{vertex:?}"))
    }

    /// Returns the innermost error, unwrapping bulk-fetch and worker wrappers.
    pub fn root_cause(&self) -> &LinkPredError {
        match self {
            LinkPredError::BulkFetch(inner) => inner.root_cause(),
            LinkPredError::WorkerFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
