//! On-disk inverted-list layout: the offset table plus packed id run,
//! and the in-memory builder used while populating an index.

use crate::error::{Error, ErrorCode, Result};
use crate::vector::VectorId;
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// A centroid pair `(i, j)` addressable by its flat key `i * C + j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CentroidPair {
    pub side1: u32,
    pub side2: u32,
}

impl CentroidPair {
    pub fn new(side1: u32, side2: u32) -> Self {
        CentroidPair { side1, side2 }
    }

    /// Flat index into a `C * C` array: `i * C + j`.
    pub fn flat_index(&self, centroid_count: usize) -> usize {
        self.side1 as usize * centroid_count + self.side2 as usize
    }
}

/// Dense, in-memory builder for the inverted lists: a `C^2`-sized array
/// of growable lists, matching the on-disk layout directly rather than a
/// dictionary keyed by centroid-pair tuples.
pub struct InvertedListsBuilder {
    centroid_count: usize,
    lists: Vec<Vec<VectorId>>,
}

impl InvertedListsBuilder {
    pub fn new(centroid_count: usize) -> Self {
        InvertedListsBuilder {
            centroid_count,
            lists: vec![Vec::new(); centroid_count * centroid_count],
        }
    }

    /// Appends `id` to the list for `pair`. Within a single-threaded build
    /// pass over ascending ids, this keeps each list sorted ascending for
    /// free, since ids are assigned in ascending order during a build pass.
    pub fn push(&mut self, pair: CentroidPair, id: VectorId) {
        let index = pair.flat_index(self.centroid_count);
        self.lists[index].push(id);
    }

    /// Serializes the built lists to the id-run and offset-table files
    /// in lexicographic `(i, j)` order.
    pub fn write_files(
        &self,
        offsets_path: impl AsRef<Path>,
        id_run_path: impl AsRef<Path>,
    ) -> Result<()> {
        if let Some(parent) = offsets_path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let offsets_tmp = offsets_path.as_ref().with_extension("tmp");
        let id_run_tmp = id_run_path.as_ref().with_extension("tmp");

        {
            let mut offsets_writer = BufWriter::new(File::create(&offsets_tmp)?);
            let mut id_run_writer = BufWriter::new(File::create(&id_run_tmp)?);

            let mut start: u32 = 0;
            for list in &self.lists {
                let length = list.len() as u32;
                offsets_writer.write_all(&start.to_le_bytes())?;
                offsets_writer.write_all(&length.to_le_bytes())?;

                for id in list {
                    id_run_writer.write_all(&id.to_u32().to_le_bytes())?;
                }

                start += length;
            }
        }

        fs::rename(&offsets_tmp, &offsets_path)?;
        fs::rename(&id_run_tmp, &id_run_path)?;
        Ok(())
    }

    /// Total number of ids pushed across all lists.
    pub fn total_ids(&self) -> usize {
        self.lists.iter().map(|l| l.len()).sum()
    }
}

/// One `(start, length)` record of the offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSpan {
    pub start: u32,
    pub length: u32,
}

/// Loaded view over a built inverted index: the offset table resident in
/// memory, the id run accessed through a read-only memory map.
///
/// All memory-mapped views are scoped to this handle with guaranteed
/// unmapping on every exit path, including query errors — `Mmap` is
/// dropped along with `InvertedIndexFile`.
pub struct InvertedIndexFile {
    offsets: Vec<ListSpan>,
    id_run: Mmap,
    centroid_count: usize,
}

impl InvertedIndexFile {
    /// Loads the offset table fully into memory and opens the id run as a
    /// memory-mapped, read-only view.
    pub fn open(
        offsets_path: impl AsRef<Path>,
        id_run_path: impl AsRef<Path>,
        centroid_count: usize,
        total_vectors: usize,
    ) -> Result<Self> {
        let offsets_bytes = fs::read(offsets_path)?;
        let record_size = 8; // two little-endian u32s.
        if offsets_bytes.len() != centroid_count * centroid_count * record_size {
            return Err(Error::new(
                ErrorCode::CorruptIndex,
                "offset table length does not match centroid_count^2",
            ));
        }

        let mut offsets = Vec::with_capacity(centroid_count * centroid_count);
        let mut sum_length: u64 = 0;
        for chunk in offsets_bytes.chunks_exact(record_size) {
            let start = u32::from_le_bytes(chunk[0..4].try_into().unwrap());
            let length = u32::from_le_bytes(chunk[4..8].try_into().unwrap());
            sum_length += length as u64;
            offsets.push(ListSpan { start, length });
        }

        if sum_length as usize != total_vectors {
            return Err(Error::new(
                ErrorCode::CorruptIndex,
                format!(
                    "sum of list lengths ({sum_length}) does not equal vector count ({total_vectors})"
                ),
            ));
        }

        let id_run_file = File::open(id_run_path)?;
        let id_run = unsafe { Mmap::map(&id_run_file)? };

        let expected_bytes = total_vectors * std::mem::size_of::<u32>();
        if id_run.len() != expected_bytes {
            return Err(Error::new(
                ErrorCode::CorruptIndex,
                "id run file size does not match the expected vector count",
            ));
        }

        Ok(InvertedIndexFile { offsets, id_run, centroid_count })
    }

    /// Returns the borrowed id window for `pair`, a view directly into the
    /// memory-mapped id run for the duration of the borrow — never copied.
    pub fn list(&self, pair: CentroidPair) -> Result<&[u32]> {
        let index = pair.flat_index(self.centroid_count);
        let span = self.offsets.get(index).ok_or_else(|| {
            Error::new(ErrorCode::CorruptIndex, "centroid pair out of range")
        })?;

        let start_byte = span.start as usize * std::mem::size_of::<u32>();
        let end_byte = start_byte + span.length as usize * std::mem::size_of::<u32>();
        if end_byte > self.id_run.len() {
            return Err(Error::new(
                ErrorCode::CorruptIndex,
                "inverted list span exceeds id run file size",
            ));
        }

        let bytes = &self.id_run[start_byte..end_byte];
        Ok(bytemuck::cast_slice(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trips_through_files() {
        let mut builder = InvertedListsBuilder::new(2);
        builder.push(CentroidPair::new(0, 0), VectorId(0));
        builder.push(CentroidPair::new(0, 1), VectorId(1));
        builder.push(CentroidPair::new(1, 1), VectorId(2));
        builder.push(CentroidPair::new(1, 1), VectorId(3));

        let dir = tempfile::tempdir().unwrap();
        let offsets_path = dir.path().join("index_offsets.bin");
        let id_run_path = dir.path().join("concatenated_values.bin");
        builder.write_files(&offsets_path, &id_run_path).unwrap();

        let loaded = InvertedIndexFile::open(&offsets_path, &id_run_path, 2, 4).unwrap();

        assert_eq!(loaded.list(CentroidPair::new(0, 0)).unwrap(), &[0]);
        assert_eq!(loaded.list(CentroidPair::new(0, 1)).unwrap(), &[1]);
        assert_eq!(loaded.list(CentroidPair::new(1, 0)).unwrap(), &[] as &[u32]);
        assert_eq!(loaded.list(CentroidPair::new(1, 1)).unwrap(), &[2, 3]);
    }

    #[test]
    fn rejects_mismatched_total_count() {
        let mut builder = InvertedListsBuilder::new(2);
        builder.push(CentroidPair::new(0, 0), VectorId(0));

        let dir = tempfile::tempdir().unwrap();
        let offsets_path = dir.path().join("index_offsets.bin");
        let id_run_path = dir.path().join("concatenated_values.bin");
        builder.write_files(&offsets_path, &id_run_path).unwrap();

        let result = InvertedIndexFile::open(&offsets_path, &id_run_path, 2, 5);
        assert!(result.is_err());
    }
}
