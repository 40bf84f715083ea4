//! JSON report writer for training runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::RunName;

/// Per-class precision, recall, and F1 from the hold-out split.
#[derive(Debug, Clone, Serialize)]
pub struct ClassMetricsEntry {
    /// Class index.
    pub class: usize,
    /// Vocabulary name of the class.
    pub name: String,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Hold-out rows of this class.
    pub support: usize,
}

/// One feature's importance and rank.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportanceEntry {
    /// Column name.
    pub name: String,
    /// Normalized importance.
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Diagnostic report of one training run.
///
/// Holds primitives only, so veritas-io has no dependency on veritas-rf.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    /// Rows in the dataset.
    pub n_samples: usize,
    /// Feature columns.
    pub n_features: usize,
    /// Classes seen in the labels.
    pub n_classes: usize,
    /// Trees per forest.
    pub n_trees: usize,
    /// Accuracy of every fold, in fold order.
    pub fold_accuracies: Vec<f64>,
    /// Mean fold accuracy.
    pub cv_accuracy_mean: f64,
    /// Population standard deviation of the fold accuracies.
    pub cv_accuracy_std: f64,
    /// Rows the hold-out forest trained on.
    pub holdout_n_train: usize,
    /// Rows held out.
    pub holdout_n_test: usize,
    /// Accuracy on the held-out rows.
    pub holdout_accuracy: f64,
    /// `confusion_matrix[true][predicted]` on the held-out rows.
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Per-class metrics on the held-out rows.
    pub class_metrics: Vec<ClassMetricsEntry>,
    /// Importances of the final forest, most important first.
    pub feature_importances: Vec<FeatureImportanceEntry>,
}

/// Writes training reports to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// The report is named `{run}_evaluate.json` and the model path is
/// `{run}_model.bin`.
pub struct ReportWriter {
    output_dir: PathBuf,
    run: RunName,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), run = %run))]
    pub fn new(output_dir: &Path, run: RunName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            run,
        })
    }

    /// Write the run's report to `{run}_evaluate.json`, replacing any
    /// earlier report. Returns the written path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeReport`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_evaluation(&self, record: &EvaluationRecord) -> Result<PathBuf, IoError> {
        let path = self.evaluation_path();
        let artifact = EvaluateArtifact {
            run: self.run.as_str(),
            record,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| {
            IoError::SerializeReport {
                path: path.clone(),
                source: e,
            }
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "evaluation report written");
        Ok(path)
    }

    /// Return `{output_dir}/{run}_evaluate.json`.
    #[must_use]
    pub fn evaluation_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_evaluate.json", self.run.as_str()))
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; just computes `{output_dir}/{run}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.run.as_str()))
    }
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    run: &'a str,
    #[serde(flatten)]
    record: &'a EvaluationRecord,
}
