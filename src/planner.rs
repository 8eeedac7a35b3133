//! Query planner: centroid-pair ranking by additive centroid-sum distance.

use crate::codebook::CentroidCodebook;
use crate::distance::cosine;
use crate::inverted_index::CentroidPair;
use ordered_float::OrderedFloat;

/// Computes per-subspace centroid distances and returns the `nprobe^2`
/// best centroid pairs, ascending by `D[i, j] = d1[i] + d2[j]`, ties
/// broken by ascending flat index `i * C + j`.
pub fn plan(
    codebook: &CentroidCodebook,
    query: &[f32],
    nprobe: usize,
) -> Vec<CentroidPair> {
    let mid = query.len() / 2;
    let (q1, q2) = (&query[..mid], &query[mid..]);

    let d1: Vec<f32> = codebook.side1.iter().map(|c| cosine(q1, c)).collect();
    let d2: Vec<f32> = codebook.side2.iter().map(|c| cosine(q2, c)).collect();

    // Broadcast addition: the C x C sum matrix is never iterated
    // element-by-element to compute a distance — each entry is a plain
    // float addition of two already-computed per-subspace distances.
    let c = codebook.centroid_count;
    let mut combined: Vec<(f32, usize)> = Vec::with_capacity(c * c);
    for (i, &di) in d1.iter().enumerate() {
        for (j, &dj) in d2.iter().enumerate() {
            combined.push((di + dj, i * c + j));
        }
    }

    let keep = (nprobe * nprobe).min(combined.len());
    select_smallest(&mut combined, keep);

    combined
        .into_iter()
        .take(keep)
        .map(|(_, flat)| CentroidPair::new((flat / c) as u32, (flat % c) as u32))
        .collect()
}

/// Partitions `items` so the `keep` smallest (by `(value, index)`, index
/// as tiebreak) are in the front, then sorts just that prefix ascending.
/// This is a "partition-then-sort" partial selection, avoiding a full
/// `O(n log n)` sort of all `C^2` pairs.
fn select_smallest(items: &mut [(f32, usize)], keep: usize) {
    if keep == 0 || keep >= items.len() {
        items.sort_by_key(|&(value, index)| (OrderedFloat(value), index));
        return;
    }

    items.select_nth_unstable_by_key(keep - 1, |&(value, index)| (OrderedFloat(value), index));
    items[..keep].sort_by_key(|&(value, index)| (OrderedFloat(value), index));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codebook_2x2() -> CentroidCodebook {
        CentroidCodebook {
            centroid_count: 2,
            subspace_dim: 1,
            side1: vec![vec![1.0], vec![-1.0]],
            side2: vec![vec![1.0], vec![-1.0]],
        }
    }

    #[test]
    fn nprobe_1_yields_exactly_one_pair() {
        let codebook = codebook_2x2();
        let pairs = plan(&codebook, &[1.0, 1.0], 1);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0], CentroidPair::new(0, 0));
    }

    #[test]
    fn nprobe_equal_to_c_returns_all_pairs_sorted() {
        let codebook = codebook_2x2();
        let pairs = plan(&codebook, &[1.0, 1.0], 2);
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0], CentroidPair::new(0, 0));
    }

    #[test]
    fn query_equal_to_centroid_concat_selects_that_pair_first() {
        let codebook = codebook_2x2();
        let pairs = plan(&codebook, &[-1.0, -1.0], 2);
        assert_eq!(pairs[0], CentroidPair::new(1, 1));
    }
}
