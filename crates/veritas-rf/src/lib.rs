//! Random Forest engine for forensic image classification.
//!
//! CART decision trees grown on bootstrap samples, majority-vote ensembles
//! with per-label confidence, k-fold cross-validation with a stratified
//! hold-out confusion matrix, and versioned model persistence.
//!
//! Training data is row-major: `features[sample][feature]`, with zero-based
//! class indices in `labels`. Every random choice flows from an explicit
//! seed, so the same data and seed always produce the same forest.

mod bootstrap;
mod classifier;
mod config;
mod confusion;
mod error;
mod eval;
mod forest;
mod importance;
mod node;
mod predict;
mod serialize;
mod split;
mod tree;

pub use bootstrap::{BootstrapSample, bootstrap_sample};
pub use classifier::{
    EnsembleClassifier, LabelScore, LabelVocabulary, PredictionOutput, PredictionResult,
    extract_features,
};
pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::{ErrorKind, RfError};
pub use eval::{CrossValidation, CrossValidationReport, FoldResult, HoldoutEvaluation};
pub use forest::{ForestParams, RandomForest};
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::VoteTally;
pub use serialize::ModelStore;
pub use split::SplitCriterion;
pub use tree::{DEFAULT_MAX_CLASSES, DecisionTree, DecisionTreeConfig};
