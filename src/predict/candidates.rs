use tracing::debug;

use super::adjacency::AdjacencyIndex;
use crate::error::Result;
use crate::types::{CandidatePair, Vertex};

/// Enumerates every ordered pair `(v, u)` of hubs with `v != u` and `u` not a
/// neighbor of `v`.
///
/// Both loops walk the hubs in index order, so the output is deterministic. The
/// enumeration is quadratic in the number of hubs; narrowing the hub set is the
/// caller's job (raise `min_degree`).
pub fn enumerate<V: Vertex>(index: &AdjacencyIndex<V>) -> Result<Vec<CandidatePair<V>>> {
    let hubs = index.hubs();
    let mut pairs = Vec::new();
    for v in hubs {
        let adjacent = index.neighbors(v)?;
        pairs.extend(
            hubs.iter()
                .filter(|u| *u != v && !adjacent.contains(*u))
                .map(|u| CandidatePair::new(v.clone(), u.clone())),
        );
    }
    debug!(hubs = hubs.len(), candidates = pairs.len(), "candidate pairs enumerated");
    Ok(pairs)
}
