use crate::types::ScoredPair;

/// Sorts by score descending, keeping encounter order among equal scores, and
/// truncates to `k`.
pub fn top_k<V>(mut results: Vec<ScoredPair<V>>, k: usize) -> Vec<ScoredPair<V>> {
    // `sort_by` is stable.
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(k);
    results
}

/// Merges per-worker top-k lists into the global top-k.
///
/// Lists are concatenated in the given order before the stable sort, so ties are
/// resolved by worker order and then by position within each list. The result is
/// exact as long as every local list was cut with the same `k`.
pub fn merge<V, I>(local_lists: I, k: usize) -> Vec<ScoredPair<V>>
where
    I: IntoIterator<Item = Vec<ScoredPair<V>>>,
{
    let all: Vec<ScoredPair<V>> = local_lists.into_iter().flatten().collect();
    top_k(all, k)
}
