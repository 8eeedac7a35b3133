//! Representative-vector pruner: re-ranks the planner's candidate pairs
//! by distance to each pair's concatenated centroid vector.

use crate::codebook::CentroidCodebook;
use crate::distance::cosine;
use crate::inverted_index::CentroidPair;
use crate::vector::Vector;
use ordered_float::OrderedFloat;

/// Re-ranks the planner's `nprobe^2` pairs by the distance between the
/// query and the concatenated representative vector for each pair,
/// keeping the best `pruning_factor - 1` of them. `pruning_factor == 1`
/// therefore keeps nothing; the off-by-one is preserved verbatim rather
/// than rounded away.
pub fn prune(
    codebook: &CentroidCodebook,
    query: &[f32],
    pairs: &[CentroidPair],
    pruning_factor: usize,
) -> Vec<CentroidPair> {
    let keep_count = pruning_factor.saturating_sub(1).min(pairs.len());
    if keep_count == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, usize)> = pairs
        .iter()
        .enumerate()
        .map(|(idx, pair)| {
            let representative = Vector::concat(
                &codebook.side1[pair.side1 as usize],
                &codebook.side2[pair.side2 as usize],
            );
            (cosine(query, representative.as_slice()), idx)
        })
        .collect();

    scored.select_nth_unstable_by_key(keep_count - 1, |&(value, idx)| (OrderedFloat(value), idx));
    scored[..keep_count].sort_by_key(|&(value, idx)| (OrderedFloat(value), idx));

    scored.into_iter().take(keep_count).map(|(_, idx)| pairs[idx]).collect()
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
    fn pruning_factor_of_one_keeps_nothing() {
        let codebook = codebook_2x2();
        let pairs = vec![CentroidPair::new(0, 0), CentroidPair::new(1, 1)];
        let kept = prune(&codebook, &[1.0, 1.0], &pairs, 1);
        assert!(kept.is_empty());
    }

    #[test]
    fn keeps_pruning_factor_minus_one_pairs_best_first() {
        let codebook = codebook_2x2();
        let pairs = vec![CentroidPair::new(0, 0), CentroidPair::new(1, 1)];
        let kept = prune(&codebook, &[1.0, 1.0], &pairs, 2);
        assert_eq!(kept, vec![CentroidPair::new(0, 0)]);
    }

    #[test]
    fn pruning_factor_covering_all_pairs_keeps_all_but_one() {
        let codebook = codebook_2x2();
        let pairs = vec![
            CentroidPair::new(0, 0),
            CentroidPair::new(0, 1),
            CentroidPair::new(1, 0),
            CentroidPair::new(1, 1),
        ];
        let kept = prune(&codebook, &[1.0, 1.0], &pairs, 4);
        assert_eq!(kept.len(), 3);
    }
}
