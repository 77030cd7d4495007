#![allow(missing_docs)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use linkpred::{
    data_generator::DataGenerator,
    predict::{self, merge, top_k, DegreeCache, GraphView, PredictOptions, Similarity},
    source::{AdjacencySource, DegreeSource, HubRecord, MemoryGraph, Orientation},
    LinkPredError, LinkPredictor, ScoredPair,
};
use proptest::prelude::*;

fn options(min_degree: u64, workers: usize, k: usize) -> PredictOptions {
    PredictOptions::default()
        .min_degree(min_degree)
        .worker_count(workers)
        .k(k)
}

fn as_tuples<V: Clone>(results: &[ScoredPair<V>]) -> Vec<(V, V, f64)> {
    results
        .iter()
        .map(|r| (r.source.clone(), r.target.clone(), r.score))
        .collect()
}

/// Backend that serves a fixed hub list and a partial degree table.
struct Scripted {
    hubs: Vec<HubRecord<u32>>,
    degrees: HashMap<u32, u64>,
    bulk_error: Option<&'static str>,
    lookups: AtomicUsize,
}

impl Scripted {
    fn new(hubs: Vec<HubRecord<u32>>) -> Self {
        Self {
            hubs,
            degrees: HashMap::new(),
            bulk_error: None,
            lookups: AtomicUsize::new(0),
        }
    }
}

impl AdjacencySource<u32> for Scripted {
    fn fetch_min_degree_adjacency(&self, min_degree: u64) -> linkpred::Result<Vec<HubRecord<u32>>> {
        if let Some(message) = self.bulk_error {
            return Err(LinkPredError::Source(message.to_string()));
        }
        Ok(self
            .hubs
            .iter()
            .filter(|h| h.degree >= min_degree)
            .cloned()
            .collect())
    }
}

impl DegreeSource<u32> for Scripted {
    fn fetch_degree(&self, vertex: &u32) -> linkpred::Result<u64> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.degrees
            .get(vertex)
            .copied()
            .ok_or_else(|| LinkPredError::vertex_not_found(vertex))
    }
}

#[test]
fn diamond_ranks_every_non_adjacent_pair() {
    let graph = MemoryGraph::from_edges(
        Orientation::Undirected,
        vec![("A", "C"), ("A", "D"), ("B", "C"), ("B", "D")],
    );
    let prediction = predict::run(&graph, &options(2, 2, 10)).unwrap();
    let pairs = as_tuples(&prediction.results);

    assert_eq!(pairs.len(), 4);
    let order: Vec<_> = pairs.iter().map(|(s, t, _)| (*s, *t)).collect();
    assert_eq!(order, vec![("A", "B"), ("C", "D"), ("D", "C"), ("B", "A")]);
    for (_, _, score) in pairs {
        assert!((score - 2.0 / 2f64.ln()).abs() < 1e-12);
    }
    assert_eq!(prediction.stats.hubs, 4);
    assert_eq!(prediction.stats.candidates, 4);
    assert_eq!(prediction.stats.scored, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn degree_one_shared_neighbor_yields_nothing() {
    // C follows only A, so it is a shared successor of A and B with out-degree 1.
    let graph = MemoryGraph::from_edges(
        Orientation::Directed,
        vec![("A", "C"), ("B", "C"), ("C", "A")],
    );
    let prediction = predict::run(&graph, &options(1, 1, 10)).unwrap();
    assert!(prediction.results.is_empty());
    assert_eq!(prediction.stats.scored, 0);
}

#[test]
fn bulk_fetch_failure_scores_nothing() {
    let mut source = Scripted::new(vec![HubRecord::new(1, 3, vec![2, 3, 4])]);
    source.bulk_error = Some("connection reset");
    let err = predict::run(&source, &options(1, 4, 10)).unwrap_err();
    match err {
        LinkPredError::BulkFetch(inner) => {
            assert!(matches!(*inner, LinkPredError::Source(ref m) if m == "connection reset"));
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_shared_neighbor_fails_the_run() {
    let source = Scripted::new(vec![
        HubRecord::new(1, 1, vec![9]),
        HubRecord::new(2, 1, vec![9]),
    ]);
    let err = predict::run(&source, &options(1, 2, 10)).unwrap_err();
    match &err {
        LinkPredError::WorkerFailure { worker, source } => {
            assert_eq!(*worker, 0);
            assert!(matches!(**source, LinkPredError::VertexNotFound(_)));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(matches!(err.root_cause(), LinkPredError::VertexNotFound(_)));
}

#[test]
fn non_hub_degrees_are_fetched_once_per_vertex() {
    // Hubs 1, 2 and 3 share the non-hub neighbors 10 and 11.
    let mut source = Scripted::new(vec![
        HubRecord::new(1, 2, vec![10, 11]),
        HubRecord::new(2, 2, vec![10, 11]),
        HubRecord::new(3, 2, vec![10, 11]),
    ]);
    source.degrees.insert(10, 3);
    source.degrees.insert(11, 4);

    let prediction = predict::run(&source, &options(2, 1, 10)).unwrap();
    assert_eq!(prediction.results.len(), 6);
    let expected = 1.0 / 3f64.ln() + 1.0 / 4f64.ln();
    assert!(prediction
        .results
        .iter()
        .all(|r| (r.score - expected).abs() < 1e-12));
    assert_eq!(source.lookups.load(Ordering::SeqCst), 2);
    assert_eq!(prediction.stats.degree_cache.misses, 2);
}

#[test]
fn worker_count_does_not_change_generated_ranking() {
    let edges = DataGenerator::new(2024).generate_social_network(400, 12);
    let graph = MemoryGraph::from_edges(Orientation::Directed, edges);

    let baseline = predict::run(&graph, &options(8, 1, 25)).unwrap();
    assert!(!baseline.results.is_empty());
    for workers in 2..=8 {
        let other = predict::run(&graph, &options(8, workers, 25)).unwrap();
        assert_eq!(as_tuples(&baseline.results), as_tuples(&other.results));
        assert_eq!(other.stats.workers.len(), workers);
    }
}

#[test]
fn more_workers_than_candidates_is_fine() {
    let graph = MemoryGraph::from_edges(
        Orientation::Undirected,
        vec![("A", "C"), ("A", "D"), ("B", "C"), ("B", "D")],
    );
    let predictor = LinkPredictor::new(options(2, 16, 3));
    let prediction = predictor.run(&graph).unwrap();
    assert_eq!(prediction.results.len(), 3);
    assert_eq!(prediction.stats.workers.len(), 16);
}

/// Scores a pair as the sum of its ids and counts how often it is asked.
struct IdSum<'a> {
    calls: &'a AtomicUsize,
}

impl Similarity<u32> for IdSum<'_> {
    fn score<D>(&self, v: &u32, u: &u32, _graph: GraphView<'_, u32, D>) -> linkpred::Result<Option<f64>>
    where
        D: DegreeSource<u32> + Sync + ?Sized,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(f64::from(v + u)))
    }
}

#[test]
fn custom_similarity_replaces_adamic_adar() {
    let graph = MemoryGraph::from_edges(
        Orientation::Undirected,
        vec![(1u32, 3u32), (1, 4), (2, 3), (2, 4)],
    );
    let calls = AtomicUsize::new(0);
    let predictor = LinkPredictor::new(options(2, 3, 3)).with_similarity(IdSum { calls: &calls });
    assert_eq!(predictor.options().k, 3);

    let prediction = predictor.run(&graph).unwrap();
    assert_eq!(
        as_tuples(&prediction.results),
        vec![(3, 4, 7.0), (4, 3, 7.0), (1, 2, 3.0)]
    );
    assert_eq!(prediction.stats.candidates, 4);
    assert_eq!(prediction.stats.scored, 4);
}

#[test]
fn custom_similarity_sees_every_candidate_once() {
    let edges = DataGenerator::new(77).generate_social_network(150, 8);
    let graph = MemoryGraph::from_edges(
        Orientation::Directed,
        edges.into_iter().map(|(s, t)| (s as u32, t as u32)),
    );
    let calls = AtomicUsize::new(0);
    let predictor = LinkPredictor::new(options(4, 5, 10)).with_similarity(IdSum { calls: &calls });
    let prediction = predictor.run(&graph).unwrap();

    assert!(prediction.stats.candidates > 0);
    assert_eq!(calls.load(Ordering::SeqCst), prediction.stats.candidates);
    assert_eq!(prediction.results.len(), 10.min(prediction.stats.candidates));
    assert!(prediction
        .results
        .iter()
        .all(|r| r.score == f64::from(r.source + r.target)));
}

#[test]
fn degree_cache_is_consistent_under_contention() {
    let degrees: HashMap<u32, u64> = (0..64).map(|v| (v, u64::from(v) * 3 + 2)).collect();
    let mut source = Scripted::new(Vec::new());
    source.degrees = degrees.clone();
    let cache = DegreeCache::new();

    std::thread::scope(|scope| {
        for t in 0..8u32 {
            let cache = &cache;
            let source = &source;
            let degrees = &degrees;
            scope.spawn(move || {
                for round in 0..200u32 {
                    let v = (round * 7 + t) % 64;
                    assert_eq!(cache.get_degree(&v, source).unwrap(), degrees[&v]);
                }
            });
        }
    });

    assert_eq!(cache.len(), 64);
    for (v, degree) in &degrees {
        assert_eq!(cache.cached(v), Some(*degree));
    }
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, 8 * 200);
    assert!(stats.misses >= 64);
    assert_eq!(source.lookups.load(Ordering::SeqCst) as u64, stats.misses);
}

/// Scores every candidate the slow way over an undirected graph.
fn brute_force(edges: &[(u8, u8)], min_degree: u64) -> BTreeMap<(u8, u8), f64> {
    let graph = MemoryGraph::from_edges(Orientation::Undirected, edges.iter().copied());
    let neighbors = |v: &u8| -> Vec<u8> {
        graph
            .neighbors(v)
            .map(|it| it.copied().collect())
            .unwrap_or_default()
    };
    let degree = |v: &u8| graph.degree(v).unwrap_or(0);
    let hubs: Vec<u8> = graph
        .vertices()
        .iter()
        .copied()
        .filter(|v| degree(v) >= min_degree)
        .collect();

    let mut scores = BTreeMap::new();
    for v in &hubs {
        let nv = neighbors(v);
        for u in &hubs {
            if u == v || nv.contains(u) {
                continue;
            }
            let nu = neighbors(u);
            let mut shared: Vec<u64> = nv.iter().filter(|z| nu.contains(*z)).map(degree).collect();
            if shared.is_empty() || shared.iter().any(|d| *d < 2) {
                continue;
            }
            shared.sort_unstable();
            let score: f64 = shared.iter().map(|d| 1.0 / (*d as f64).ln()).sum();
            scores.insert((*v, *u), score);
        }
    }
    scores
}

fn arb_edges() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..14, 0u8..14), 0..60)
}

proptest! {
    #[test]
    fn prop_engine_matches_brute_force(edges in arb_edges(), min_degree in 0u64..4, workers in 1usize..6) {
        let graph = MemoryGraph::from_edges(Orientation::Undirected, edges.clone());
        let prediction = predict::run(&graph, &options(min_degree, workers, usize::MAX)).unwrap();
        let expected = brute_force(&edges, min_degree);

        prop_assert_eq!(prediction.results.len(), expected.len());
        for r in &prediction.results {
            let want = expected.get(&(r.source, r.target)).copied();
            prop_assert!(want.is_some(), "unexpected pair {:?}", (r.source, r.target));
            prop_assert!((r.score - want.unwrap_or_default()).abs() < 1e-12);
        }
    }

    #[test]
    fn prop_undirected_scores_are_symmetric(edges in arb_edges(), workers in 1usize..6) {
        let graph = MemoryGraph::from_edges(Orientation::Undirected, edges);
        let prediction = predict::run(&graph, &options(1, workers, usize::MAX)).unwrap();
        let scores: HashMap<(u8, u8), f64> = prediction
            .results
            .iter()
            .map(|r| ((r.source, r.target), r.score))
            .collect();
        for ((s, t), score) in &scores {
            prop_assert_eq!(scores.get(&(*t, *s)).map(|x| x.to_bits()), Some(score.to_bits()));
        }
    }

    #[test]
    fn prop_ranking_is_independent_of_worker_count(
        edges in prop::collection::vec((0u16..40, 0u16..40), 0..200),
        workers in 2usize..9,
        k in 1usize..12,
    ) {
        let graph = MemoryGraph::from_edges(Orientation::Directed, edges);
        let single = predict::run(&graph, &options(2, 1, k)).unwrap();
        let many = predict::run(&graph, &options(2, workers, k)).unwrap();
        prop_assert_eq!(as_tuples(&single.results), as_tuples(&many.results));
        prop_assert!(single.results.len() <= k);
        prop_assert!(single.results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn prop_merge_of_local_top_k_equals_global_top_k(
        scores in prop::collection::vec(0.001f64..50.0, 0..80),
        parts in 1usize..7,
        k in 1usize..15,
    ) {
        let all: Vec<ScoredPair<usize>> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| ScoredPair::new(i, i + 1, *s))
            .collect();
        let global = top_k(all.clone(), k);

        let chunk = (all.len() / parts).max(1);
        let locals: Vec<Vec<ScoredPair<usize>>> =
            all.chunks(chunk).map(|c| top_k(c.to_vec(), k)).collect();
        prop_assert_eq!(merge(locals, k), global.clone());
        prop_assert_eq!(merge(vec![global.clone()], k), global);
    }
}
