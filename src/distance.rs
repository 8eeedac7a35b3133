use simsimd::SpatialSimilarity;

/// Computes the cosine *distance* (`1 - cosine similarity`) between two
/// equal-length float slices.
///
/// The engine uses cosine distance exclusively, so this is a single free
/// function rather than a multi-variant distance-metric type.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    f32::cosine(a, b).unwrap_or(1.0) as f32
}

/// Squared Euclidean distance, used only by the k-means trainer. Centroid
/// training runs under Euclidean distance, while assignment and query
/// scoring both run under cosine distance — a deliberate asymmetry kept
/// for compatibility with existing centroid files rather than normalized
/// away.
pub fn sqeuclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    f32::sqeuclidean(a, b).unwrap_or(f64::MAX) as f32
}

/// Cosine distance between half-precision slices, used by the batch
/// scorer's narrowed kernel.
pub fn cosine_f16(a: &[half::f16], b: &[half::f16]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x.to_f32() * y.to_f32()).sum();
    let norm_a: f32 = a.iter().map(|x| x.to_f32().powi(2)).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x.to_f32().powi(2)).sum::<f32>().sqrt();
    1.0 - dot / (norm_a * norm_b)
}
