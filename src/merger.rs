//! Global merger: combines per-batch top-Ks into one top-K. Commutative
//! and associative over `(distance, id)` pairs under the tie-break rule,
//! so batch completion order never affects the result.

use crate::scorer::ScoredCandidate;
use crate::vector::VectorId;
use std::collections::BinaryHeap;

/// The merged result of a search: ascending distances and their ids,
/// both of length `k` or fewer if fewer than `k` candidates survived —
/// an empty result is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResult {
    pub distances: Vec<f32>,
    pub ids: Vec<VectorId>,
}

/// Merges all per-batch candidates into the `k` globally smallest by
/// distance, ties broken by smaller id.
pub fn merge(candidates: impl IntoIterator<Item = ScoredCandidate>, k: usize) -> MergedResult {
    let mut heap: BinaryHeap<ScoredCandidate> = BinaryHeap::with_capacity(k + 1);
    for candidate in candidates {
        heap.push(candidate);
        if heap.len() > k {
            heap.pop();
        }
    }

    let sorted = heap.into_sorted_vec();
    let distances = sorted.iter().map(|c| c.distance).collect();
    let ids = sorted.iter().map(|c| c.id).collect();
    MergedResult { distances, ids }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(distance: f32, id: u32) -> ScoredCandidate {
        ScoredCandidate { distance, id: VectorId(id) }
    }

    #[test]
    fn keeps_k_smallest_ascending() {
        let candidates =
            vec![candidate(0.5, 0), candidate(0.1, 1), candidate(0.9, 2), candidate(0.3, 3)];
        let merged = merge(candidates, 2);
        assert_eq!(merged.ids, vec![VectorId(1), VectorId(3)]);
        assert!(merged.distances[0] <= merged.distances[1]);
    }

    #[test]
    fn ties_broken_by_smaller_id() {
        let candidates = vec![candidate(0.5, 5), candidate(0.5, 2)];
        let merged = merge(candidates, 1);
        assert_eq!(merged.ids, vec![VectorId(2)]);
    }

    #[test]
    fn order_of_batch_arrival_does_not_change_the_result() {
        let a = vec![candidate(0.5, 0), candidate(0.1, 1), candidate(0.9, 2)];
        let mut b = a.clone();
        b.reverse();

        let merged_a = merge(a, 2);
        let merged_b = merge(b, 2);
        assert_eq!(merged_a, merged_b);
    }

    #[test]
    fn fewer_than_k_candidates_yields_empty_result_not_an_error() {
        let merged = merge(Vec::new(), 5);
        assert!(merged.ids.is_empty());
        assert!(merged.distances.is_empty());
    }
}
