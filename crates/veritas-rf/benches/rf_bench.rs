//! Criterion benchmarks for veritas-rf: training, prediction and persistence.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use veritas_rf::{EnsembleClassifier, LabelVocabulary, RandomForest, RandomForestConfig};

fn make_classification(
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.5
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

fn bench_rf_train(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 3, 42);
    let cfg = RandomForestConfig::new(50).unwrap().with_seed(42);

    c.bench_function("rf_train_500x20_3class_50trees", |b| {
        b.iter(|| cfg.fit(&features, &labels).unwrap());
    });
}

fn bench_rf_predict_batch(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 3, 42);
    let forest = RandomForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap();

    c.bench_function("rf_predict_batch_500x20_50trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

fn bench_classifier_single(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 3, 42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_max_depth(Some(15))
        .fit(&features, &labels)
        .unwrap();
    let classifier = EnsembleClassifier::new(forest, LabelVocabulary::forensic()).unwrap();

    c.bench_function("classifier_predict_single_100trees", |b| {
        b.iter(|| classifier.predict(&features[7]).unwrap());
    });
}

fn bench_model_bytes(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 3, 42);
    let forest = RandomForestConfig::new(50).unwrap().fit(&features, &labels).unwrap();
    let bytes = forest.to_bytes().unwrap();

    c.bench_function("model_from_bytes_50trees", |b| {
        b.iter(|| RandomForest::from_bytes(&bytes).unwrap());
    });
}

criterion_group!(
    benches,
    bench_rf_train,
    bench_rf_predict_batch,
    bench_classifier_single,
    bench_model_bytes
);
criterion_main!(benches);
