use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Scoring precision used by the batch scorer's distance kernel.
///
/// Made an explicit, build-time choice on the engine rather than an
/// inline cast buried in the hot loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringPrecision {
    /// Narrow both the query and candidate rows to `f16` before scoring.
    F16,
    /// Score at full `f32` precision.
    F32,
}

impl Default for ScoringPrecision {
    fn default() -> Self {
        ScoringPrecision::F16
    }
}

/// Explicit configuration carried on the index handle.
///
/// Every location and tuning knob the engine needs is named here up
/// front, rather than derived from ambient state at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImiConfig {
    /// Directory holding the serialized index files for this shard.
    pub index_dir: PathBuf,
    /// Tag identifying the shard, used to name files
    /// (`centroids_{shard_tag}`, `imi_index_{shard_tag}/...`).
    pub shard_tag: String,
    /// Number of centroids per subspace (`C`). Typical value 256.
    pub centroid_count: usize,
    /// Full vector dimension (`D`). Must be even.
    pub dim: usize,
    /// Maximum id span covered by a single scoring batch.
    pub max_difference: u32,
    /// Maximum number of batches scored per query.
    pub batch_limit: usize,
    /// Number of centroid pairs retained after representative pruning.
    pub pruning_factor: usize,
    /// Number of centroids probed per subspace before pruning.
    pub nprobe: usize,
    /// Default number of results returned by `search`.
    pub top_k: usize,
    /// Scoring precision for the batch scorer's distance kernel.
    pub precision: ScoringPrecision,
    /// Number of worker threads used to fan out batch scoring.
    pub workers: usize,
}

impl ImiConfig {
    /// Conservative tuning defaults for a freshly constructed configuration:
    /// `top_k=5`, `nprobe=1`, `max_difference=10000`, `batch_limit=2000`,
    /// `pruning_factor=2250`, `centroid_count=256`, two scoring workers.
    pub fn new(index_dir: impl Into<PathBuf>, shard_tag: impl Into<String>, dim: usize) -> Self {
        ImiConfig {
            index_dir: index_dir.into(),
            shard_tag: shard_tag.into(),
            centroid_count: 256,
            dim,
            max_difference: 10_000,
            batch_limit: 2_000,
            pruning_factor: 2_250,
            nprobe: 1,
            top_k: 5,
            precision: ScoringPrecision::F16,
            workers: 2,
        }
    }

    /// Loads a configuration from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ImiConfig = toml::from_str(&contents)
            .map_err(|e| Error::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration, returning `InvalidConfig` on the first
    /// violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 || self.dim % 2 != 0 {
            return Err(Error::invalid_config(format!(
                "dimension must be even and non-zero, got {}",
                self.dim
            )));
        }

        if self.centroid_count == 0 {
            return Err(Error::invalid_config("centroid_count must be positive"));
        }

        if self.nprobe == 0 {
            return Err(Error::invalid_config("nprobe must be positive"));
        }

        if self.top_k == 0 {
            return Err(Error::invalid_config("top_k must be positive"));
        }

        let max_pairs = self.centroid_count * self.centroid_count;
        if self.pruning_factor > max_pairs {
            return Err(Error::invalid_config(format!(
                "pruning_factor ({}) exceeds centroid_count^2 ({})",
                self.pruning_factor, max_pairs
            )));
        }

        Ok(())
    }

    /// Subspace dimension (`D/2`).
    pub fn subspace_dim(&self) -> usize {
        self.dim / 2
    }

    /// Path to the centroid file for this shard.
    pub fn centroids_path(&self) -> PathBuf {
        self.index_dir.join(format!("centroids_{}", self.shard_tag))
    }

    /// Path to the directory holding the offset table and id run.
    pub fn inverted_index_dir(&self) -> PathBuf {
        self.index_dir.join(format!("imi_index_{}", self.shard_tag))
    }

    /// Path to the offset table file.
    pub fn offsets_path(&self) -> PathBuf {
        self.inverted_index_dir().join("index_offsets.bin")
    }

    /// Path to the concatenated id run file.
    pub fn id_run_path(&self) -> PathBuf {
        self.inverted_index_dir().join("concatenated_values.bin")
    }
}
