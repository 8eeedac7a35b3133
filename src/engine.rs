//! The index handle: trains, populates, persists, loads, and searches an
//! inverted multi-index.

use crate::assembler::{assemble_candidates, batch_candidates};
use crate::cancellation::CancellationToken;
use crate::codebook::CentroidCodebook;
use crate::config::ImiConfig;
use crate::error::{Error, Result};
use crate::inverted_index::{CentroidPair, InvertedIndexFile, InvertedListsBuilder};
use crate::merger::{merge, MergedResult};
use crate::planner::plan;
use crate::pruner::prune;
use crate::scorer::score_batches;
use crate::store::VectorStore;
use crate::vector::VectorId;

/// Vectors trained and populated per inner loop before their offsets are
/// flushed, bounding peak memory during an index build.
pub const POPULATE_BATCH_SIZE: usize = 500_000;

/// The lifecycle state of an [`ImiIndex`].
///
/// Search is only valid once the index has a codebook and inverted lists
/// resident, whether freshly populated or reloaded from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Trained,
    Populated,
    Persisted,
    Loaded,
}

/// Per-query overrides of the config's tuning defaults. Any field left
/// `None` falls back to the value on [`ImiConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchParams {
    pub top_k: Option<usize>,
    pub nprobe: Option<usize>,
    pub max_difference: Option<u32>,
    pub batch_limit: Option<usize>,
    pub pruning_factor: Option<usize>,
}

/// An inverted multi-index over vectors held in an external [`VectorStore`].
pub struct ImiIndex {
    config: ImiConfig,
    state: IndexState,
    codebook: Option<CentroidCodebook>,
    inverted_lists_builder: Option<InvertedListsBuilder>,
    inverted_index: Option<InvertedIndexFile>,
    pool: rayon::ThreadPool,
}

impl ImiIndex {
    /// Creates an untrained index handle for `config`.
    pub fn new(config: ImiConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| Error::invalid_config(e.to_string()))?;

        Ok(ImiIndex {
            config,
            state: IndexState::Uninitialized,
            codebook: None,
            inverted_lists_builder: None,
            inverted_index: None,
            pool,
        })
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn config(&self) -> &ImiConfig {
        &self.config
    }

    /// Trains both subspace codebooks over `vectors`. `vectors` is assumed
    /// to already fit in memory; callers training over a larger sample
    /// should subsample before calling this.
    pub fn train(&mut self, vectors: &[Vec<f32>], max_iterations: usize, seed: u64) -> Result<()> {
        tracing::info!(
            "training centroid codebook: {} vectors, centroid_count={}",
            vectors.len(),
            self.config.centroid_count
        );

        let codebook = CentroidCodebook::train(&self.config, vectors, max_iterations, seed)?;
        self.codebook = Some(codebook);
        self.state = IndexState::Trained;
        Ok(())
    }

    /// Assigns every vector in `store` to its centroid pair and builds the
    /// in-memory inverted lists, in batches of [`POPULATE_BATCH_SIZE`].
    pub fn populate(&mut self, store: &dyn VectorStore) -> Result<()> {
        let codebook = self
            .codebook
            .as_ref()
            .ok_or_else(|| Error::index_not_ready("populate called before train"))?;

        let mut builder = InvertedListsBuilder::new(self.config.centroid_count);
        let mut next_id: u32 = 0;
        let total = store.count() as u32;

        while next_id < total {
            let end_id = (next_id + POPULATE_BATCH_SIZE as u32).min(total);
            let block = store.get_sequential_block(next_id, end_id)?;
            let dim = store.dimension();

            for (offset, row_id) in (next_id..end_id).enumerate() {
                let row = &block[offset * dim..(offset + 1) * dim];
                let (side1, side2) = codebook.assign(row);
                builder.push(CentroidPair::new(side1, side2), VectorId(row_id));
            }

            tracing::debug!("populated vectors [{next_id}, {end_id})");
            next_id = end_id;
        }

        self.inverted_lists_builder = Some(builder);
        self.state = IndexState::Populated;
        Ok(())
    }

    /// Writes the codebook and inverted-list files to `config.index_dir`
    /// and reopens the inverted lists read-only.
    pub fn persist(&mut self, total_vectors: usize) -> Result<()> {
        let codebook = self
            .codebook
            .as_ref()
            .ok_or_else(|| Error::index_not_ready("persist called before train"))?;
        let builder = self
            .inverted_lists_builder
            .take()
            .ok_or_else(|| Error::index_not_ready("persist called before populate"))?;

        codebook.write_file(self.config.centroids_path())?;
        builder.write_files(self.config.offsets_path(), self.config.id_run_path())?;

        let inverted_index = InvertedIndexFile::open(
            self.config.offsets_path(),
            self.config.id_run_path(),
            self.config.centroid_count,
            total_vectors,
        )?;

        self.inverted_index = Some(inverted_index);
        self.state = IndexState::Persisted;
        Ok(())
    }

    /// Loads a previously persisted codebook and inverted lists from
    /// `config.index_dir`.
    pub fn load(config: ImiConfig, total_vectors: usize) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| Error::invalid_config(e.to_string()))?;

        let codebook = CentroidCodebook::read_file(config.centroids_path())?;
        let inverted_index = InvertedIndexFile::open(
            config.offsets_path(),
            config.id_run_path(),
            config.centroid_count,
            total_vectors,
        )?;

        Ok(ImiIndex {
            config,
            state: IndexState::Loaded,
            codebook: Some(codebook),
            inverted_lists_builder: None,
            inverted_index: Some(inverted_index),
            pool,
        })
    }

    /// Runs a k-nearest-neighbor search. Valid only once the index is
    /// `Persisted` or `Loaded`; any other state is an `IndexNotReady` error.
    pub fn search(
        &self,
        store: &dyn VectorStore,
        query: &[f32],
        params: SearchParams,
        cancellation: Option<&CancellationToken>,
    ) -> Result<MergedResult> {
        if self.state != IndexState::Persisted && self.state != IndexState::Loaded {
            return Err(Error::index_not_ready(format!(
                "search requires a Persisted or Loaded index, got {:?}",
                self.state
            )));
        }

        let codebook = self.codebook.as_ref().expect("state invariant: codebook present when ready");
        let inverted_index =
            self.inverted_index.as_ref().expect("state invariant: inverted index present when ready");

        let top_k = params.top_k.unwrap_or(self.config.top_k);
        let nprobe = params.nprobe.unwrap_or(self.config.nprobe);
        let max_difference = params.max_difference.unwrap_or(self.config.max_difference);
        let batch_limit = params.batch_limit.unwrap_or(self.config.batch_limit);
        let pruning_factor = params.pruning_factor.unwrap_or(self.config.pruning_factor);

        let planned = plan(codebook, query, nprobe);
        let pruned = prune(codebook, query, &planned, pruning_factor);
        tracing::debug!("planned {} pairs, {} survive pruning", planned.len(), pruned.len());

        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            return Ok(merge(Vec::new(), top_k));
        }

        let candidates = assemble_candidates(inverted_index, &pruned)?;
        let batches = batch_candidates(&candidates, max_difference, batch_limit);

        let scored = score_batches(store, query, &batches, top_k, self.config.precision, &self.pool, cancellation)?;
        Ok(merge(scored, top_k))
    }
}
