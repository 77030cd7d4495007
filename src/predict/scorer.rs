use std::any::Any;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use super::similarity::{GraphView, Similarity};
use super::topk::top_k;
use crate::error::{LinkPredError, Result};
use crate::source::DegreeSource;
use crate::types::{CandidatePair, ScoredPair, Vertex};

/// Fans candidate pairs out over a fixed group of scoped worker threads.
///
/// Threads are spawned per call and all joined before returning; there is no
/// persistent pool.
#[derive(Clone, Copy, Debug)]
pub struct ParallelScorer {
    worker_count: usize,
    k: usize,
}

/// Result of one worker's partition.
#[derive(Clone, Debug)]
pub struct WorkerOutcome<V> {
    /// Partition index.
    pub worker: usize,
    /// Pairs evaluated by this worker.
    pub evaluated: usize,
    /// Pairs that produced a score, before truncation.
    pub scored: usize,
    /// Local top-k, best first.
    pub top: Vec<ScoredPair<V>>,
    /// Wall time spent in the partition loop.
    pub elapsed: Duration,
}

/// Per-worker counters exposed in run statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Partition index.
    pub worker: usize,
    /// Pairs evaluated.
    pub evaluated: usize,
    /// Pairs with a score.
    pub scored: usize,
    /// Entries kept in the local top-k.
    pub retained: usize,
    /// Partition wall time in milliseconds.
    pub elapsed_ms: u64,
}

impl<V> WorkerOutcome<V> {
    /// Counters for this outcome.
    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            worker: self.worker,
            evaluated: self.evaluated,
            scored: self.scored,
            retained: self.top.len(),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

impl ParallelScorer {
    /// Creates a scorer; both `worker_count` and `k` must be at least one.
    pub fn new(worker_count: usize, k: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(LinkPredError::InvalidArgument(
                "worker count must be at least 1".into(),
            ));
        }
        if k == 0 {
            return Err(LinkPredError::InvalidArgument("k must be at least 1".into()));
        }
        Ok(Self { worker_count, k })
    }

    /// Number of partitions and threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Shared top-k bound for local and global rankings.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Scores every pair and returns one outcome per partition, in partition order.
    ///
    /// All workers are joined before this returns. If any worker fails, the error of
    /// the lowest-indexed failing worker is returned and no partial ranking escapes.
    pub fn score_all<V, D, S>(
        &self,
        pairs: &[CandidatePair<V>],
        graph: GraphView<'_, V, D>,
        similarity: &S,
    ) -> Result<Vec<WorkerOutcome<V>>>
    where
        V: Vertex,
        D: DegreeSource<V> + Sync + ?Sized,
        S: Similarity<V> + ?Sized,
    {
        let partitions = partition(pairs, self.worker_count);
        let k = self.k;
        debug!(
            pairs = pairs.len(),
            workers = partitions.len(),
            k,
            "scoring candidate pairs"
        );

        let joined = thread::scope(|s| -> Result<Vec<_>> {
            let mut handles = Vec::with_capacity(partitions.len());
            for (worker, part) in partitions.iter().copied().enumerate() {
                let handle = thread::Builder::new()
                    .name(format!("linkpred-worker-{worker}"))
                    .spawn_scoped(s, move || run_worker(worker, part, graph, similarity, k))?;
                handles.push(handle);
            }
            Ok(handles.into_iter().map(|h| h.join()).collect())
        })?;

        let mut outcomes = Vec::with_capacity(joined.len());
        let mut failure = None;
        for (worker, result) in joined.into_iter().enumerate() {
            match result {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(err)) => {
                    debug!(worker, error = %err, "worker failed");
                    failure.get_or_insert(LinkPredError::WorkerFailure {
                        worker,
                        source: Box::new(err),
                    });
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    debug!(worker, %message, "worker panicked");
                    failure.get_or_insert(LinkPredError::WorkerPanicked { worker, message });
                }
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(outcomes),
        }
    }
}

/// Splits `items` into `parts` contiguous slices of `len / parts` items; the last
/// slice also takes the remainder.
pub fn partition<T>(items: &[T], parts: usize) -> Vec<&[T]> {
    let parts = parts.max(1);
    let chunk = items.len() / parts;
    let mut slices = Vec::with_capacity(parts);
    for i in 0..parts - 1 {
        slices.push(&items[i * chunk..(i + 1) * chunk]);
    }
    slices.push(&items[(parts - 1) * chunk..]);
    slices
}

fn run_worker<V, D, S>(
    worker: usize,
    pairs: &[CandidatePair<V>],
    graph: GraphView<'_, V, D>,
    similarity: &S,
    k: usize,
) -> Result<WorkerOutcome<V>>
where
    V: Vertex,
    D: DegreeSource<V> + Sync + ?Sized,
    S: Similarity<V> + ?Sized,
{
    let start = Instant::now();
    debug!(worker, pairs = pairs.len(), "worker starting");
    let mut local = Vec::new();
    for pair in pairs {
        if let Some(score) = similarity.score(&pair.source, &pair.target, graph)? {
            // Non-positive (or NaN) scores carry no ranking signal.
            if score > 0.0 {
                local.push(ScoredPair::new(
                    pair.source.clone(),
                    pair.target.clone(),
                    score,
                ));
            }
        }
    }
    let scored = local.len();
    let top = top_k(local, k);
    let elapsed = start.elapsed();
    debug!(
        worker,
        scored,
        elapsed_ms = elapsed.as_millis() as u64,
        "worker finished"
    );
    Ok(WorkerOutcome {
        worker,
        evaluated: pairs.len(),
        scored,
        top,
        elapsed,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
