//! Two-subspace coarse centroid codebook: training, cosine assignment,
//! and the on-disk centroid file format.

use crate::config::ImiConfig;
use crate::distance::cosine;
use crate::error::{Error, ErrorCode, Result};
use crate::kmeans::KMeans;
use byteorder_helpers::{read_u32, write_u32};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"IMICB001";

/// Two sets of `C` centroids, one per subspace of dimension `D/2`.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidCodebook {
    /// Number of centroids per subspace.
    pub centroid_count: usize,
    /// Subspace dimension (`D/2`).
    pub subspace_dim: usize,
    /// Side-1 centroids, row-major, `centroid_count` rows of `subspace_dim`.
    pub side1: Vec<Vec<f32>>,
    /// Side-2 centroids, row-major, `centroid_count` rows of `subspace_dim`.
    pub side2: Vec<Vec<f32>>,
}

impl CentroidCodebook {
    /// Trains both subspace codebooks with independent Euclidean k-means
    /// runs over the supplied vectors.
    ///
    /// K-means needs the full subspace resident to iterate, so callers
    /// training over a dataset larger than fits in memory should
    /// subsample before calling this rather than expect it to stream.
    pub fn train(
        config: &ImiConfig,
        vectors: &[Vec<f32>],
        max_iterations: usize,
        seed: u64,
    ) -> Result<Self> {
        let subspace_dim = config.subspace_dim();
        if vectors.len() < config.centroid_count {
            return Err(Error::invalid_config(
                "need at least centroid_count vectors to train the codebook",
            ));
        }

        let firsts: Vec<&[f32]> = vectors.iter().map(|v| &v[..subspace_dim]).collect();
        let seconds: Vec<&[f32]> = vectors.iter().map(|v| &v[subspace_dim..]).collect();

        let mut kmeans1 = KMeans::new(config.centroid_count, max_iterations, seed);
        kmeans1.fit(&firsts)?;

        // Distinct seed for the second subspace so its initialization
        // isn't a lockstep copy of the first subspace's random walk.
        let mut kmeans2 = KMeans::new(config.centroid_count, max_iterations, seed.wrapping_add(1));
        kmeans2.fit(&seconds)?;

        Ok(CentroidCodebook {
            centroid_count: config.centroid_count,
            subspace_dim,
            side1: kmeans1.centroids().to_vec(),
            side2: kmeans2.centroids().to_vec(),
        })
    }

    /// Assigns a vector to its `(side1, side2)` centroid pair using cosine
    /// distance, ties broken by lowest centroid index.
    pub fn assign(&self, vector: &[f32]) -> (u32, u32) {
        let mid = vector.len() / 2;
        let (first, second) = (&vector[..mid], &vector[mid..]);
        (self.nearest_cosine(&self.side1, first), self.nearest_cosine(&self.side2, second))
    }

    fn nearest_cosine(&self, centroids: &[Vec<f32>], half: &[f32]) -> u32 {
        let mut best_index = 0usize;
        let mut best_distance = f32::MAX;

        for (i, centroid) in centroids.iter().enumerate() {
            let distance = cosine(half, centroid);
            if distance < best_distance {
                best_distance = distance;
                best_index = i;
            }
        }

        best_index as u32
    }

    /// Writes the codebook to `path`, preceded by a small header recording
    /// `C` and `D`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");

        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);

            writer.write_all(MAGIC)?;
            write_u32(&mut writer, self.centroid_count as u32)?;
            write_u32(&mut writer, (self.subspace_dim * 2) as u32)?;

            for row in &self.side1 {
                writer.write_all(bytemuck::cast_slice(row))?;
            }
            for row in &self.side2 {
                writer.write_all(bytemuck::cast_slice(row))?;
            }
        }

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Reads a codebook previously written by [`write_file`](Self::write_file).
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::new(ErrorCode::CorruptIndex, "bad centroid file magic"));
        }

        let centroid_count = read_u32(&mut reader)? as usize;
        let dim = read_u32(&mut reader)? as usize;
        if dim == 0 || dim % 2 != 0 {
            return Err(Error::new(ErrorCode::CorruptIndex, "centroid file dimension is not even"));
        }
        let subspace_dim = dim / 2;

        let side1 = Self::read_rows(&mut reader, centroid_count, subspace_dim)?;
        let side2 = Self::read_rows(&mut reader, centroid_count, subspace_dim)?;

        Ok(CentroidCodebook { centroid_count, subspace_dim, side1, side2 })
    }

    fn read_rows(
        reader: &mut impl Read,
        count: usize,
        dim: usize,
    ) -> Result<Vec<Vec<f32>>> {
        let mut rows = Vec::with_capacity(count);
        let mut buf = vec![0u8; dim * std::mem::size_of::<f32>()];
        for _ in 0..count {
            reader.read_exact(&mut buf)?;
            let floats: &[f32] = bytemuck::cast_slice(&buf);
            rows.push(floats.to_vec());
        }
        Ok(rows)
    }
}

/// Small helpers kept local so we don't pull in a full `byteorder`
/// dependency just for four call sites.
mod byteorder_helpers {
    use std::io::{Read, Result, Write};

    pub fn write_u32(writer: &mut impl Write, value: u32) -> Result<()> {
        writer.write_all(&value.to_le_bytes())
    }

    pub fn read_u32(reader: &mut impl Read) -> Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_config() -> ImiConfig {
        let mut config = ImiConfig::new(".", "test", 4);
        config.centroid_count = 2;
        config
    }

    #[test]
    fn assigns_axis_aligned_vectors_to_distinct_cells() {
        let codebook = CentroidCodebook {
            centroid_count: 2,
            subspace_dim: 1,
            side1: vec![vec![1.0], vec![-1.0]],
            side2: vec![vec![1.0], vec![-1.0]],
        };

        assert_eq!(codebook.assign(&[1.0, 0.0, 1.0, 0.0]), (0, 0));
        assert_eq!(codebook.assign(&[-1.0, 0.0, -1.0, 0.0]), (1, 1));
    }

    #[test]
    fn round_trips_through_file() {
        let config = toy_config();
        let vectors: Vec<Vec<f32>> = (0..8)
            .map(|i| vec![i as f32, (i * 2) as f32, (i * 3) as f32, (i * 4) as f32])
            .collect();

        let codebook = CentroidCodebook::train(&config, &vectors, 10, 1).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("centroids_test");
        codebook.write_file(&path).unwrap();

        let reloaded = CentroidCodebook::read_file(&path).unwrap();
        assert_eq!(reloaded, codebook);
    }
}
