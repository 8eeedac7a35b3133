#![warn(missing_docs)]

//! Approximate nearest-neighbor search over a two-subspace inverted
//! multi-index, backed by a memory-mapped vector store.
//!
//! An [`engine::ImiIndex`] trains a [`codebook::CentroidCodebook`] over a
//! sample of vectors, assigns every vector in a [`store::VectorStore`] to
//! its centroid pair, and persists the resulting inverted lists
//! ([`inverted_index`]) to disk. Queries are planned ([`planner`]), pruned
//! ([`pruner`]), batched and scored ([`assembler`], [`scorer`]) against
//! the raw vectors, then merged into a top-K result ([`merger`]).

mod assembler;
mod cancellation;
mod codebook;
mod config;
mod distance;
mod engine;
mod error;
mod inverted_index;
mod kmeans;
mod merger;
mod planner;
mod pruner;
mod scorer;
mod store;
mod vector;

pub use assembler::{assemble_candidates, batch_candidates, Batch};
pub use cancellation::CancellationToken;
pub use codebook::CentroidCodebook;
pub use config::{ImiConfig, ScoringPrecision};
pub use distance::{cosine, cosine_f16, sqeuclidean};
pub use engine::{ImiIndex, IndexState, SearchParams, POPULATE_BATCH_SIZE};
pub use error::{Error, ErrorCode, Result};
pub use inverted_index::{CentroidPair, InvertedIndexFile, InvertedListsBuilder, ListSpan};
pub use kmeans::KMeans;
pub use merger::{merge, MergedResult};
pub use planner::plan;
pub use pruner::prune;
pub use scorer::{score_batches, ScoredCandidate};
pub use store::{InMemoryVectorStore, MmapVectorStore, VectorStore};
pub use vector::{Vector, VectorId};
