//! File I/O, validation, and serialization for the veritas pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{FeatureDataset, RunName};
pub use error::IoError;
pub use reader::{DEFAULT_LABEL_COLUMN, FeatureReader, read_inference_document};
pub use writer::{ClassMetricsEntry, EvaluationRecord, FeatureImportanceEntry, ReportWriter};
