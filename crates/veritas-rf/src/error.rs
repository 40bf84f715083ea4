use std::path::PathBuf;

/// Coarse failure category, for callers that only need to branch on the
/// kind of failure rather than on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Training data or configuration is unusable.
    InvalidInput,
    /// A prediction input does not have the trained feature count.
    DimensionMismatch,
    /// A stored model is missing, unreadable, or corrupt.
    ModelNotFound,
    /// An inference document has no usable numeric fields.
    Schema,
}

/// Errors from Random Forest operations.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid n_folds value provided.
        n_folds: usize,
    },

    /// Returned when there are fewer samples than folds.
    #[error("{n_samples} samples cannot fill {n_folds} folds")]
    TooFewSamplesForFolds {
        /// Number of samples in the dataset.
        n_samples: usize,
        /// The requested number of folds.
        n_folds: usize,
    },

    /// Returned when the hold-out test fraction is not in (0.0, 1.0).
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction.
        fraction: f64,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the label vector is not aligned with the feature rows.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a training row has a different number of features than the first row.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a training label is not below the class limit.
    #[error("label {label} at sample {sample_index} is outside [0, {max_classes})")]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// Exclusive upper bound on labels.
        max_classes: usize,
    },

    /// Returned when a forest predicts labels the vocabulary cannot name.
    #[error("model has {n_classes} classes but the label vocabulary names only {vocabulary_size}")]
    LabelOutOfVocabulary {
        /// Number of classes the forest was trained on.
        n_classes: usize,
        /// Number of names in the vocabulary.
        vocabulary_size: usize,
    },

    /// Returned when a prediction input has the wrong number of features.
    #[error("prediction input has {got} features, expected {expected}")]
    DimensionMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when an inference document is not an object or a list holding one.
    #[error("inference input must be a JSON object or an array of objects, got {found}")]
    InvalidDocument {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// Returned when an inference document has no numeric fields.
    #[error("inference input has no numeric fields")]
    NoNumericFields,

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when a decoded model is structurally invalid.
    #[error("corrupt model in {path}: {reason}")]
    CorruptModel {
        /// Path of the offending model.
        path: PathBuf,
        /// What failed validation.
        reason: String,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}

impl RfError {
    /// Return the failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RfError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            RfError::InvalidDocument { .. } | RfError::NoNumericFields => ErrorKind::Schema,
            RfError::DeserializeModel { .. }
            | RfError::CorruptModel { .. }
            | RfError::ReadModel { .. }
            | RfError::IncompatibleModelVersion { .. } => ErrorKind::ModelNotFound,
            _ => ErrorKind::InvalidInput,
        }
    }
}
