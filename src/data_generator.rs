//! Seeded random graphs for demos, tests and benchmarks.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::Result;

/// Deterministic edge-list generator.
pub struct DataGenerator {
    rng: ChaCha8Rng,
}

impl DataGenerator {
    /// Creates a generator; equal seeds give equal graphs.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Directed friendship graph over users `0..num_users`.
    ///
    /// Each user follows between zero and `2 * avg_connections - 1` others; the first
    /// `num_users / 20` users (at least one) are celebrities that receive extra
    /// follow-backs so the degree distribution has a heavy head.
    pub fn generate_social_network(
        &mut self,
        num_users: usize,
        avg_connections: usize,
    ) -> Vec<(u64, u64)> {
        let mut edges = Vec::new();
        if num_users < 2 {
            return edges;
        }
        let mut seen = HashSet::new();
        let celebrities = (num_users / 20).max(1);

        for user in 0..num_users {
            let connections = self.rng.gen_range(0..(avg_connections * 2).max(1));
            for _ in 0..connections {
                let target = if self.rng.gen_bool(0.3) {
                    self.rng.gen_range(0..celebrities)
                } else {
                    self.rng.gen_range(0..num_users)
                };
                if target != user && seen.insert((user, target)) {
                    edges.push((user as u64, target as u64));
                }
            }
        }

        // Celebrities follow back a share of their followers.
        let inbound: Vec<(u64, u64)> = edges
            .iter()
            .filter(|(_, dst)| (*dst as usize) < celebrities)
            .copied()
            .collect();
        for (src, dst) in inbound {
            if self.rng.gen_bool(0.5) && seen.insert((dst as usize, src as usize)) {
                edges.push((dst, src));
            }
        }
        edges
    }
}

/// Writes `edges` as a SNAP-style edge list with a comment header.
pub fn write_edge_list(path: impl AsRef<Path>, edges: &[(u64, u64)]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# Generated directed graph")?;
    writeln!(out, "# Edges: {}", edges.len())?;
    writeln!(out, "# FromNodeId\tToNodeId")?;
    for (src, dst) in edges {
        writeln!(out, "{src}\t{dst}")?;
    }
    out.flush()?;
    Ok(())
}
