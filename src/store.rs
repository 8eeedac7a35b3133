//! The vector store is an external collaborator: this crate only
//! consumes its contract. `MmapVectorStore` is a concrete implementation
//! of that contract over a flat, row-major, memory-mapped `f32` file,
//! kept here so the engine and its tests have something concrete to read
//! sequential blocks from.

use crate::error::{Error, ErrorCode, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Contract the engine needs from a vector store.
pub trait VectorStore: Send + Sync {
    /// Dimension of every vector in the store.
    fn dimension(&self) -> usize;

    /// Number of vectors (`N`) in the store.
    fn count(&self) -> usize;

    /// Reads a contiguous, id-ordered block `[start_id, end_id)`.
    ///
    /// Returns a flat row-major buffer of `(end_id - start_id) * dimension`
    /// floats. Implementations may back this with a memory-mapped file.
    fn get_sequential_block(&self, start_id: u32, end_id: u32) -> Result<Vec<f32>>;
}

/// Vector store backed by a memory-mapped, contiguous `f32` record file.
///
/// The file must contain exactly `count * dimension` little-endian `f32`
/// values in row-major order.
pub struct MmapVectorStore {
    mmap: Mmap,
    dimension: usize,
    count: usize,
}

impl MmapVectorStore {
    /// Opens an existing vector record file.
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let element_size = std::mem::size_of::<f32>();
        let row_bytes = dimension * element_size;
        if row_bytes == 0 || mmap.len() % row_bytes != 0 {
            return Err(Error::new(
                ErrorCode::CorruptIndex,
                "vector store file size is not a multiple of the row width",
            ));
        }

        let count = mmap.len() / row_bytes;
        Ok(MmapVectorStore { mmap, dimension, count })
    }
}

impl VectorStore for MmapVectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn count(&self) -> usize {
        self.count
    }

    fn get_sequential_block(&self, start_id: u32, end_id: u32) -> Result<Vec<f32>> {
        if end_id < start_id || end_id as usize > self.count {
            return Err(Error::new(
                ErrorCode::CorruptIndex,
                format!(
                    "block [{start_id}, {end_id}) out of range for store of {} rows",
                    self.count
                ),
            ));
        }

        let element_size = std::mem::size_of::<f32>();
        let row_bytes = self.dimension * element_size;
        let start = start_id as usize * row_bytes;
        let end = end_id as usize * row_bytes;
        let bytes = &self.mmap[start..end];

        let floats: &[f32] = bytemuck::cast_slice(bytes);
        Ok(floats.to_vec())
    }
}

/// An in-memory vector store, used by tests and small fixtures where
/// paying for a memory-mapped file is unnecessary.
pub struct InMemoryVectorStore {
    data: Vec<f32>,
    dimension: usize,
}

impl InMemoryVectorStore {
    /// Builds a store from a flat, row-major buffer of `rows * dimension`
    /// floats.
    pub fn new(data: Vec<f32>, dimension: usize) -> Self {
        assert_eq!(data.len() % dimension, 0);
        InMemoryVectorStore { data, dimension }
    }
}

impl VectorStore for InMemoryVectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn count(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn get_sequential_block(&self, start_id: u32, end_id: u32) -> Result<Vec<f32>> {
        if end_id < start_id || end_id as usize > self.count() {
            return Err(Error::new(
                ErrorCode::CorruptIndex,
                format!(
                    "block [{start_id}, {end_id}) out of range for store of {} rows",
                    self.count()
                ),
            ));
        }

        let start = start_id as usize * self.dimension;
        let end = end_id as usize * self.dimension;
        Ok(self.data[start..end].to_vec())
    }
}
