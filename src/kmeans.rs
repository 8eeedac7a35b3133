//! Euclidean k-means used to train each subspace's coarse centroids.
//! Reproducible training requires a fixed random seed, so this trainer
//! is seeded with `rand::StdRng` rather than `rand::thread_rng()`.

use crate::distance::sqeuclidean;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cmp::min;

/// K-means clustering over dense `f32` rows under squared Euclidean
/// distance.
#[derive(Debug)]
pub struct KMeans {
    assignments: Vec<usize>,
    centroids: Vec<Vec<f32>>,
    n_clusters: usize,
    max_iter: usize,
    seed: u64,
}

impl KMeans {
    /// Creates a new trainer.
    /// - `n_clusters`: number of centroids to fit.
    /// - `max_iter`: maximum refinement iterations.
    /// - `seed`: fixed seed for centroid initialization and reinitialization
    ///   of degenerate clusters, so `fit` is reproducible.
    pub fn new(n_clusters: usize, max_iter: usize, seed: u64) -> Self {
        Self {
            n_clusters,
            max_iter,
            seed,
            assignments: Vec::new(),
            centroids: Vec::with_capacity(n_clusters),
        }
    }

    /// Trains the centroids over `vectors`, a slice of equal-length rows.
    pub fn fit(&mut self, vectors: &[&[f32]]) -> Result<()> {
        if self.n_clusters > vectors.len() {
            return Err(Error::invalid_config(
                "dataset is smaller than the requested cluster count",
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        self.centroids = self.initialize_centroids(vectors, &mut rng);
        self.assignments = vec![0; vectors.len()];

        let mut no_improvement_count = 0;
        for _ in 0..self.max_iter {
            if no_improvement_count > 5 {
                break;
            }

            let assignments = self.assign_clusters(vectors);

            let end = min(1000, assignments.len());
            match assignments[0..end] == self.assignments[0..end] {
                true => no_improvement_count += 1,
                false => no_improvement_count = 0,
            }

            self.assignments = assignments;
            self.centroids = self.update_centroids(vectors, &mut rng);
        }

        Ok(())
    }

    fn initialize_centroids(&self, vectors: &[&[f32]], rng: &mut StdRng) -> Vec<Vec<f32>> {
        let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(self.n_clusters);

        let first = vectors.choose(rng).expect("fit checked non-empty input");
        centroids.push(first.to_vec());

        for _ in 1..self.n_clusters {
            let distances: Vec<f32> = vectors
                .iter()
                .map(|vector| {
                    centroids
                        .iter()
                        .map(|centroid| sqeuclidean(vector, centroid))
                        .fold(f32::MAX, f32::min)
                })
                .collect();

            let total: f32 = distances.iter().sum();
            let threshold = rng.gen::<f32>() * total;
            let mut cumulative = 0.0;

            let mut chosen = vectors.len() - 1;
            for (i, distance) in distances.iter().enumerate() {
                cumulative += distance;
                if cumulative >= threshold {
                    chosen = i;
                    break;
                }
            }

            centroids.push(vectors[chosen].to_vec());
        }

        centroids
    }

    fn update_centroids(&self, vectors: &[&[f32]], rng: &mut StdRng) -> Vec<Vec<f32>> {
        let dimension = vectors[0].len();
        let mut centroids = vec![vec![0.0; dimension]; self.n_clusters];
        let mut cluster_count = vec![0usize; self.n_clusters];

        for (i, &cluster_id) in self.assignments.iter().enumerate() {
            cluster_count[cluster_id] += 1;
            for (sum, value) in centroids[cluster_id].iter_mut().zip(vectors[i]) {
                *sum += value;
            }
        }

        for i in 0..self.n_clusters {
            if cluster_count[i] == 0 {
                centroids[i] = vectors.choose(rng).expect("non-empty input").to_vec();
                continue;
            }

            for value in centroids[i].iter_mut() {
                *value /= cluster_count[i] as f32;
            }
        }

        centroids
    }

    fn assign_clusters(&self, vectors: &[&[f32]]) -> Vec<usize> {
        vectors.iter().map(|vector| self.find_nearest_centroid(vector)).collect()
    }

    /// Finds the index of the nearest centroid (Euclidean) to a vector.
    pub fn find_nearest_centroid(&self, vector: &[f32]) -> usize {
        self.centroids
            .iter()
            .enumerate()
            .map(|(i, centroid)| (i, sqeuclidean(vector, centroid)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(id, _)| id)
            .unwrap_or(0)
    }

    /// Returns the fitted centroids.
    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.centroids
    }
}
