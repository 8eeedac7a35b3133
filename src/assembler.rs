//! Candidate assembly and batching.

use crate::inverted_index::{CentroidPair, InvertedIndexFile};
use crate::vector::VectorId;
use crate::error::Result;

/// Gathers the ids from the kept inverted lists and returns them sorted
/// ascending. Sorting is mandatory: the scorer relies on contiguous id
/// ranges to turn scattered candidates into sequential block reads.
pub fn assemble_candidates(
    index: &InvertedIndexFile,
    pairs: &[CentroidPair],
) -> Result<Vec<VectorId>> {
    let mut ids = Vec::new();
    for &pair in pairs {
        for &raw_id in index.list(pair)? {
            ids.push(VectorId(raw_id));
        }
    }

    ids.sort_unstable();
    Ok(ids)
}

/// A contiguous, ascending run of candidate ids whose span is at most
/// `max_difference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub ids: Vec<VectorId>,
}

/// Splits sorted candidate ids into batches: starting at the first
/// remaining id, each batch is the maximal prefix whose id span is at
/// most `max_difference`; at most `batch_limit` batches are produced and
/// any remaining ids are dropped — a deliberate work cap, not an error.
pub fn batch_candidates(ids: &[VectorId], max_difference: u32, batch_limit: usize) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut start = 0usize;

    while start < ids.len() && batches.len() < batch_limit {
        let min_id = ids[start].to_u32();
        let ceiling = min_id as u64 + max_difference as u64;

        // Maximal prefix with id < ceiling, i.e. span <= max_difference.
        let end = start
            + ids[start..].partition_point(|id| (id.to_u32() as u64) < ceiling);

        batches.push(Batch { ids: ids[start..end].to_vec() });
        start = end;
    }

    batches
}
