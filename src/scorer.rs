//! Batch scorer: turns scattered candidate ids into sequential I/O and
//! scores the gathered rows against the query.

use crate::assembler::Batch;
use crate::cancellation::CancellationToken;
use crate::config::ScoringPrecision;
use crate::distance::{cosine, cosine_f16};
use crate::error::Result;
use crate::store::VectorStore;
use crate::vector::VectorId;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A scored candidate: distance to the query and the candidate's id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub distance: f32,
    pub id: VectorId,
}

impl Eq for ScoredCandidate {}

impl PartialOrd for ScoredCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredCandidate {
    // Ascending by (distance, id): the greatest element under this order
    // is the worst candidate to keep, so a max-heap capped at K naturally
    // evicts it first and the tie-break favors the smaller id surviving.
    fn cmp(&self, other: &Self) -> Ordering {
        (OrderedFloat(self.distance), self.id).cmp(&(OrderedFloat(other.distance), other.id))
    }
}

/// Scores one batch: reads its sequential block from the store, narrows
/// to the configured precision, computes cosine distance to the query,
/// and returns the batch's local top-K ascending.
fn score_batch(
    store: &dyn VectorStore,
    query: &[f32],
    batch: &Batch,
    k: usize,
    precision: ScoringPrecision,
    cancellation: Option<&CancellationToken>,
) -> Result<Vec<ScoredCandidate>> {
    if batch.ids.is_empty() {
        return Ok(Vec::new());
    }

    // Abort at the block-read boundary rather than mid-batch.
    if cancellation.is_some_and(CancellationToken::is_cancelled) {
        return Ok(Vec::new());
    }

    let first_id = batch.ids[0].to_u32();
    let last_id = batch.ids[batch.ids.len() - 1].to_u32();
    let block = store.get_sequential_block(first_id, last_id + 1)?;

    let dim = store.dimension();
    let mut heap: BinaryHeap<ScoredCandidate> = BinaryHeap::with_capacity(k + 1);

    match precision {
        ScoringPrecision::F32 => {
            for &id in &batch.ids {
                let offset = (id.to_u32() - first_id) as usize * dim;
                let row = &block[offset..offset + dim];
                let distance = cosine(query, row);
                push_bounded(&mut heap, ScoredCandidate { distance, id }, k);
            }
        }
        ScoringPrecision::F16 => {
            let query16: Vec<half::f16> = query.iter().map(|x| half::f16::from_f32(*x)).collect();
            for &id in &batch.ids {
                let offset = (id.to_u32() - first_id) as usize * dim;
                let row: Vec<half::f16> =
                    block[offset..offset + dim].iter().map(|x| half::f16::from_f32(*x)).collect();
                let distance = cosine_f16(&query16, &row);
                push_bounded(&mut heap, ScoredCandidate { distance, id }, k);
            }
        }
    }

    Ok(heap.into_sorted_vec())
}

fn push_bounded(heap: &mut BinaryHeap<ScoredCandidate>, candidate: ScoredCandidate, k: usize) {
    heap.push(candidate);
    if heap.len() > k {
        heap.pop();
    }
}

/// Scores every batch, fanning the work out across `pool` and collecting
/// results back on the calling thread. Batches may complete in any
/// order; the caller (the global merger) is responsible for combining
/// them deterministically.
pub fn score_batches(
    store: &dyn VectorStore,
    query: &[f32],
    batches: &[Batch],
    k: usize,
    precision: ScoringPrecision,
    pool: &rayon::ThreadPool,
    cancellation: Option<&CancellationToken>,
) -> Result<Vec<ScoredCandidate>> {
    let per_batch: Vec<Result<Vec<ScoredCandidate>>> = pool.install(|| {
        batches
            .par_iter()
            .map(|batch| score_batch(store, query, batch, k, precision, cancellation))
            .collect()
    });

    let mut all = Vec::new();
    for batch_result in per_batch {
        all.extend(batch_result?);
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryVectorStore;

    fn store() -> InMemoryVectorStore {
        // 4 rows, dim 2: (1,0) (0,1) (-1,0) (0,-1)
        InMemoryVectorStore::new(vec![1.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, -1.0], 2)
    }

    #[test]
    fn scores_and_orders_batch_ascending() {
        let store = store();
        let batch = Batch { ids: vec![VectorId(0), VectorId(1), VectorId(2), VectorId(3)] };
        let scored =
            score_batch(&store, &[1.0, 0.0], &batch, 2, ScoringPrecision::F32, None).unwrap();

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].id, VectorId(0));
        assert!(scored[0].distance <= scored[1].distance);
    }

    #[test]
    fn emits_all_rows_when_batch_not_larger_than_k() {
        let store = store();
        let batch = Batch { ids: vec![VectorId(0), VectorId(1)] };
        let scored =
            score_batch(&store, &[1.0, 0.0], &batch, 5, ScoringPrecision::F32, None).unwrap();
        assert_eq!(scored.len(), 2);
    }

    #[test]
    fn cancelled_token_yields_no_candidates() {
        let store = store();
        let batch = Batch { ids: vec![VectorId(0), VectorId(1)] };
        let token = crate::cancellation::CancellationToken::new();
        token.cancel();
        let scored =
            score_batch(&store, &[1.0, 0.0], &batch, 5, ScoringPrecision::F32, Some(&token))
                .unwrap();
        assert!(scored.is_empty());
    }

    #[test]
    fn fans_out_across_the_worker_pool() {
        let store = store();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let batches = vec![
            Batch { ids: vec![VectorId(0)] },
            Batch { ids: vec![VectorId(1), VectorId(2), VectorId(3)] },
        ];

        let scored = score_batches(
            &store,
            &[1.0, 0.0],
            &batches,
            2,
            ScoringPrecision::F32,
            &pool,
            None,
        )
        .unwrap();
        assert_eq!(scored.len(), 1 + 2);
    }
}
