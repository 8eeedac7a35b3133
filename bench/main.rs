use criterion::*;
use imi_search::{ImiConfig, ImiIndex, InMemoryVectorStore, SearchParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The number of vector records in the store.
const COLLECTION_SIZE: usize = 100_000;

/// The vector embedding dimension.
const DIMENSION: usize = 128;

fn random_vectors(count: usize, dim: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count * dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn build_test_index() -> (ImiIndex, InMemoryVectorStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ImiConfig::new(dir.path(), "bench", DIMENSION);
    config.centroid_count = 64;

    let flat = random_vectors(COLLECTION_SIZE, DIMENSION, 7);
    let store = InMemoryVectorStore::new(flat.clone(), DIMENSION);

    let training_sample: Vec<Vec<f32>> =
        flat.chunks(DIMENSION).take(20_000).map(|row| row.to_vec()).collect();

    let mut index = ImiIndex::new(config).unwrap();
    index.train(&training_sample, 15, 42).unwrap();
    index.populate(&store).unwrap();
    index.persist(store.count()).unwrap();

    (index, store, dir)
}

fn bench_search(criterion: &mut Criterion) {
    let (index, store, _dir) = build_test_index();
    let query = random_vectors(1, DIMENSION, 99);

    let routine = || {
        black_box(index.search(&store, &query, SearchParams::default(), None).unwrap());
    };

    criterion.bench_function("search inverted multi-index", |bencher| bencher.iter(routine));
}

criterion_group!(bench, bench_search);
criterion_main!(bench);
