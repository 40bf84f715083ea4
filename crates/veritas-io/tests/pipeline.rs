//! End-to-end integration tests: CSV -> cross-validate -> report/model -> predict.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;
use veritas_io::{
    ClassMetricsEntry, EvaluationRecord, FeatureImportanceEntry, FeatureReader, ReportWriter,
    RunName, read_inference_document,
};
use veritas_rf::{
    CrossValidation, EnsembleClassifier, LabelVocabulary, ModelStore, RandomForestConfig, RfError,
};

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn train_report_round_trip() {
    // 1. Read CSV
    let dataset = FeatureReader::new(&fixture_path("forensic_30x4.csv"))
        .read()
        .expect("fixture should parse");
    assert_eq!(dataset.n_samples(), 30);
    assert_eq!(dataset.n_features(), 4);
    assert_eq!(
        dataset.class_counts().into_iter().collect::<Vec<_>>(),
        vec![(0, 10), (1, 10), (2, 10)]
    );

    // 2. Cross-validate
    let rf_config = RandomForestConfig::new(20)
        .unwrap()
        .with_max_depth(Some(15))
        .with_seed(1234);
    let report = CrossValidation::new(5)
        .unwrap()
        .with_seed(1234)
        .evaluate(&rf_config, dataset.features(), dataset.labels())
        .unwrap();
    assert_eq!(report.folds.len(), 5);
    assert!(report.mean_accuracy > 0.8, "mean = {}", report.mean_accuracy);

    // 3. Final forest + report
    let forest = rf_config.fit(dataset.features(), dataset.labels()).unwrap();
    let vocabulary = LabelVocabulary::forensic();
    let confusion = &report.holdout.confusion_matrix;
    let record = EvaluationRecord {
        n_samples: report.n_samples,
        n_features: report.n_features,
        n_classes: report.n_classes,
        n_trees: forest.n_trees(),
        fold_accuracies: report.fold_accuracies(),
        cv_accuracy_mean: report.mean_accuracy,
        cv_accuracy_std: report.std_accuracy,
        holdout_n_train: report.holdout.n_train,
        holdout_n_test: report.holdout.n_test,
        holdout_accuracy: report.holdout.accuracy,
        confusion_matrix: confusion.as_rows().to_vec(),
        class_metrics: confusion
            .class_metrics()
            .into_iter()
            .map(|m| ClassMetricsEntry {
                class: m.class,
                name: vocabulary.name(m.class).unwrap_or("?").to_string(),
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect(),
        feature_importances: forest
            .ranked_importances(dataset.feature_names())
            .into_iter()
            .map(|f| FeatureImportanceEntry {
                name: f.name,
                importance: f.importance,
                rank: f.rank,
            })
            .collect(),
    };

    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path(), RunName::new("forensic_rt".into()).unwrap()).unwrap();
    let report_path = writer.write_evaluation(&record).unwrap();
    let store = ModelStore::new(writer.model_path());
    store.save(&forest).unwrap();

    // 4. Deserialize the report back and verify
    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(content["run"], "forensic_rt");
    assert_eq!(content["fold_accuracies"].as_array().unwrap().len(), 5);
    let matrix = content["confusion_matrix"].as_array().unwrap();
    assert_eq!(matrix.len(), 3);
    let held_out: u64 = matrix
        .iter()
        .flat_map(|row| row.as_array().unwrap())
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(held_out, 6);
    let importances = content["feature_importances"].as_array().unwrap();
    assert_eq!(importances.len(), 4);
    assert_eq!(importances[0]["rank"], 1);

    // 5. Reload the model and classify an inference document
    let loaded = store.load().unwrap();
    let classifier = EnsembleClassifier::new(loaded, vocabulary).unwrap();
    let input = dir.path().join("tampered.json");
    fs::write(
        &input,
        json!([{
            "file": "suspect.jpg",
            "prnu_mean": 0.40,
            "ela_mean": 9.5,
            "ela_max": 60.0,
            "noise_std": 1.1
        }])
        .to_string(),
    )
    .unwrap();
    let document = read_inference_document(&input).unwrap();
    let result = classifier.predict_json(&document).unwrap();
    assert_eq!(result.label_name(), "Tampered");

    let output = serde_json::to_value(result.to_output()).unwrap();
    assert_eq!(output["RF_label"], "Tampered");
    let total: f64 = output["RF_probabilities"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_f64().unwrap())
        .sum();
    assert!((total - 100.0).abs() < 1e-6);
}

#[test]
fn retraining_overwrites_model_file() {
    let dataset = FeatureReader::new(&fixture_path("forensic_30x4.csv"))
        .read()
        .unwrap();
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path(), RunName::new("overwrite".into()).unwrap()).unwrap();
    let store = ModelStore::new(writer.model_path());

    for n_trees in [3, 8] {
        let forest = RandomForestConfig::new(n_trees)
            .unwrap()
            .fit(dataset.features(), dataset.labels())
            .unwrap();
        store.save(&forest).unwrap();
    }
    assert_eq!(store.load().unwrap().n_trees(), 8);
}

#[test]
fn huge_csv_label_is_rejected_at_training() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge_label.csv");
    fs::write(&path, "prnu_mean,Label\n0.1,0\n0.2,1\n0.3,1e12\n").unwrap();

    let dataset = FeatureReader::new(&path).read().unwrap();
    assert_eq!(dataset.labels()[2], 1_000_000_000_000);
    assert_eq!(dataset.class_counts().len(), 3);

    let err = RandomForestConfig::new(2)
        .unwrap()
        .fit(dataset.features(), dataset.labels())
        .unwrap_err();
    assert!(matches!(
        err,
        RfError::LabelOutOfRange {
            label: 1_000_000_000_000,
            sample_index: 2,
            ..
        }
    ));
}
