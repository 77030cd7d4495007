#![forbid(unsafe_code)]

//! Candidate-pair scoring and top-k aggregation.
//!
//! A run proceeds in four phases:
//!
//! 1. **Fetch** - one bulk query builds the [`AdjacencyIndex`] of hubs (vertices with
//!    degree `>= min_degree`) and seeds the shared [`DegreeCache`].
//! 2. **Enumerate** - every ordered pair of distinct, non-adjacent hubs becomes a
//!    [`CandidatePair`](crate::types::CandidatePair).
//! 3. **Score** - [`ParallelScorer`] splits the pairs into contiguous partitions, one
//!    scoped thread each, and every worker keeps its local top-k.
//! 4. **Merge** - the local lists are concatenated in partition order and cut to the
//!    same `k`.
//!
//! A run either returns the complete ranking or fails; partial rankings are never
//! returned.

mod adjacency;
mod candidates;
mod degree_cache;
mod scorer;
mod similarity;
mod topk;

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info_span};

pub use adjacency::AdjacencyIndex;
pub use candidates::enumerate;
pub use degree_cache::{DegreeCache, DegreeCacheStats};
pub use scorer::{partition, ParallelScorer, WorkerOutcome, WorkerStats};
pub use similarity::{AdamicAdar, GraphView, Similarity};
pub use topk::{merge, top_k};

use crate::error::{LinkPredError, Result};
use crate::source::{AdjacencySource, DegreeSource};
use crate::types::{ScoredPair, Vertex};

/// Default hub threshold.
pub const DEFAULT_MIN_DEGREE: u64 = 100;
/// Default ranking length.
pub const DEFAULT_TOP_K: usize = 10;

/// Knobs for a prediction run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredictOptions {
    /// Inclusive minimum degree for a vertex to become a hub.
    pub min_degree: u64,
    /// Number of scoring partitions (and threads).
    pub worker_count: usize,
    /// Length of both the local and the global rankings.
    pub k: usize,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            min_degree: DEFAULT_MIN_DEGREE,
            worker_count: default_worker_count(),
            k: DEFAULT_TOP_K,
        }
    }
}

impl PredictOptions {
    /// Sets the hub threshold.
    pub fn min_degree(mut self, min_degree: u64) -> Self {
        self.min_degree = min_degree;
        self
    }

    /// Sets the number of workers.
    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Sets the ranking length.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

/// Available parallelism, or one when it cannot be queried.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Counters and phase timings of a completed run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Hub threshold used.
    pub min_degree: u64,
    /// Number of hubs indexed.
    pub hubs: usize,
    /// Number of candidate pairs enumerated.
    pub candidates: usize,
    /// Number of pairs with a score, summed over workers.
    pub scored: usize,
    /// Per-worker counters, in partition order.
    pub workers: Vec<WorkerStats>,
    /// Degree cache usage.
    pub degree_cache: DegreeCacheStats,
    /// Bulk fetch and index build time.
    pub fetch_ms: u64,
    /// Candidate enumeration time.
    pub enumerate_ms: u64,
    /// Parallel scoring time.
    pub score_ms: u64,
    /// Merge time.
    pub merge_ms: u64,
    /// End-to-end time.
    pub total_ms: u64,
}

/// Ranked prediction together with run statistics.
#[derive(Clone, Debug, Serialize)]
pub struct Prediction<V> {
    /// Global top-k, best first.
    pub results: Vec<ScoredPair<V>>,
    /// Run statistics.
    pub stats: RunStats,
}

/// Link predictor parameterized by its pair-scoring function.
#[derive(Clone, Debug)]
pub struct LinkPredictor<M = AdamicAdar> {
    options: PredictOptions,
    similarity: M,
}

impl LinkPredictor<AdamicAdar> {
    /// Creates an Adamic-Adar predictor.
    pub fn new(options: PredictOptions) -> Self {
        Self {
            options,
            similarity: AdamicAdar,
        }
    }
}

impl<M> LinkPredictor<M> {
    /// Replaces the similarity function.
    pub fn with_similarity<N>(self, similarity: N) -> LinkPredictor<N> {
        LinkPredictor {
            options: self.options,
            similarity,
        }
    }

    /// Options this predictor runs with.
    pub fn options(&self) -> &PredictOptions {
        &self.options
    }

    /// Fetches hubs from `source`, scores every candidate pair and returns the
    /// global top-k.
    pub fn run<V, S>(&self, source: &S) -> Result<Prediction<V>>
    where
        V: Vertex,
        S: AdjacencySource<V> + DegreeSource<V> + Sync + ?Sized,
        M: Similarity<V>,
    {
        let opts = &self.options;
        let scorer = ParallelScorer::new(opts.worker_count, opts.k)?;
        let span = info_span!(
            "predict",
            min_degree = opts.min_degree,
            workers = opts.worker_count,
            k = opts.k
        );
        let _entered = span.enter();
        let started = Instant::now();

        let phase = Instant::now();
        let index = AdjacencyIndex::build(source, opts.min_degree)?;
        let cache = DegreeCache::seeded(index.hub_degrees());
        let fetch = phase.elapsed();

        let phase = Instant::now();
        let pairs = enumerate(&index)?;
        let enumerate_time = phase.elapsed();

        let phase = Instant::now();
        let view = GraphView::new(&index, &cache, source);
        let outcomes = scorer.score_all(&pairs, view, &self.similarity)?;
        let score = phase.elapsed();

        let phase = Instant::now();
        let workers: Vec<WorkerStats> = outcomes.iter().map(WorkerOutcome::stats).collect();
        let results = merge(outcomes.into_iter().map(|o| o.top), opts.k);
        let merge_time = phase.elapsed();

        let stats = RunStats {
            min_degree: index.min_degree(),
            hubs: index.len(),
            candidates: pairs.len(),
            scored: workers.iter().map(|w| w.scored).sum(),
            workers,
            degree_cache: cache.stats(),
            fetch_ms: millis(fetch),
            enumerate_ms: millis(enumerate_time),
            score_ms: millis(score),
            merge_ms: millis(merge_time),
            total_ms: millis(started.elapsed()),
        };
        debug!(
            hubs = stats.hubs,
            candidates = stats.candidates,
            results = results.len(),
            total_ms = stats.total_ms,
            "prediction finished"
        );
        Ok(Prediction { results, stats })
    }
}

/// Runs an Adamic-Adar prediction against `source`.
pub fn run<V, S>(source: &S, options: &PredictOptions) -> Result<Prediction<V>>
where
    V: Vertex,
    S: AdjacencySource<V> + DegreeSource<V> + Sync + ?Sized,
{
    LinkPredictor::new(options.clone()).run(source)
}

/// Runs the same prediction `repeat` times and returns the last ranking with the
/// mean wall time of all runs.
pub fn run_repeated<V, S>(
    source: &S,
    options: &PredictOptions,
    repeat: usize,
) -> Result<(Prediction<V>, Duration)>
where
    V: Vertex,
    S: AdjacencySource<V> + DegreeSource<V> + Sync + ?Sized,
{
    let rounds = match u32::try_from(repeat) {
        Ok(0) => {
            return Err(LinkPredError::InvalidArgument(
                "repeat must be at least 1".into(),
            ))
        }
        Ok(rounds) => rounds,
        Err(_) => {
            return Err(LinkPredError::InvalidArgument(format!(
                "repeat must be at most {}",
                u32::MAX
            )))
        }
    };
    let predictor = LinkPredictor::new(options.clone());
    let mut total = Duration::ZERO;
    let mut last = None;
    for round in 0..rounds {
        let start = Instant::now();
        let prediction = predictor.run(source)?;
        let elapsed = start.elapsed();
        debug!(round, elapsed_ms = millis(elapsed), "prediction round");
        total += elapsed;
        last = Some(prediction);
    }
    let mean = total / rounds;
    match last {
        Some(prediction) => Ok((prediction, mean)),
        None => Err(LinkPredError::InvalidArgument(
            "repeat must be at least 1".into(),
        )),
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
