//! CSV feature-table reader and JSON inference-input reader.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::FeatureDataset;

/// Default name of the label column.
pub const DEFAULT_LABEL_COLUMN: &str = "Label";

/// Reads a labelled feature table from a CSV file.
///
/// Expected CSV format:
/// - Header row required
/// - One column holds integer class labels; it is found by name
///   (default `Label`), and column 0 is used when no header matches
/// - Every other column is a numeric feature, kept in header order
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Header holds only the label column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable |
/// | [`IoError::InvalidLabel`] | Label cell is not a non-negative integer |
pub struct FeatureReader {
    path: PathBuf,
    label_column: String,
}

impl FeatureReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
        }
    }

    /// Use `name` as the label column instead of `Label`.
    #[must_use]
    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = name.into();
        self
    }

    /// Read and validate the CSV file, returning a [`FeatureDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<FeatureDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets InconsistentRowLength fire instead of a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();

        let label_index = match header.iter().position(|h| h == self.label_column) {
            Some(index) => index,
            None => {
                warn!(
                    label_column = %self.label_column,
                    fallback = header.get(0).unwrap_or(""),
                    "label column not found, using column 0"
                );
                0
            }
        };
        let label_name = header.get(label_index).unwrap_or("").to_string();

        let feature_names: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != label_index)
            .map(|(_, name)| name.to_string())
            .collect();
        if feature_names.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        debug!(label_index, n_features = feature_names.len(), "read CSV header");

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut row = Vec::with_capacity(feature_names.len());
            for (col_index, raw) in record.iter().enumerate() {
                if col_index == label_index {
                    labels.push(self.parse_label(row_index, raw)?);
                    continue;
                }
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: header.get(col_index).unwrap_or("").to_string(),
                        raw: raw.to_string(),
                    })?;
                row.push(value);
            }
            features.push(row);
        }

        if features.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let dataset = FeatureDataset::new(label_name, feature_names, features, labels);
        info!(
            n_samples = dataset.n_samples(),
            n_features = dataset.n_features(),
            class_counts = ?dataset.class_counts(),
            "feature dataset loaded"
        );
        Ok(dataset)
    }

    /// Labels are whole numbers; `2` and `2.0` both read as class 2.
    fn parse_label(&self, row_index: usize, raw: &str) -> Result<usize, IoError> {
        if let Ok(label) = raw.parse::<usize>() {
            return Ok(label);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as usize)
            .ok_or_else(|| IoError::InvalidLabel {
                path: self.path.clone(),
                row_index,
                raw: raw.to_string(),
            })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Read an inference document from a JSON file.
///
/// Object keys keep their file order, which fixes the feature order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::JsonParse`] | Content is not valid JSON |
#[instrument(fields(path = %path.display()))]
pub fn read_inference_document(path: &Path) -> Result<serde_json::Value, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| IoError::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })
}
