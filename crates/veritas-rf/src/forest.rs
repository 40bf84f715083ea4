//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::bootstrap::BootstrapSample;
use crate::config::{MaxFeatures, RandomForestConfig};
use crate::error::RfError;
use crate::split::SplitCriterion;
use crate::tree::{DecisionTree, DecisionTreeConfig, validate_training_data};

/// Hyperparameters a forest was trained with, kept alongside its trees.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForestParams {
    /// Number of trees requested.
    pub n_trees: usize,
    /// Depth limit per tree.
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs to split.
    pub min_samples_split: usize,
    /// Minimum rows per child of a split.
    pub min_samples_leaf: usize,
    /// Per-split feature sampling strategy.
    pub max_features: MaxFeatures,
    /// Impurity measure.
    pub criterion: SplitCriterion,
    /// Base seed the per-tree seeds were drawn from.
    pub seed: u64,
}

/// A fitted Random Forest ensemble.
///
/// Trees are stored in training order, so tree `i` is always the one grown
/// from the `i`-th derived seed regardless of which thread finished first.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) params: ForestParams,
}

/// Derive the per-tree seeds: the first `n_trees` outputs of a generator
/// seeded with the base seed.
///
/// Tree `i` gets the same seed whatever `n_trees` is.
pub(crate) fn tree_seeds(base_seed: u64, n_trees: usize) -> Vec<u64> {
    let mut master = ChaCha8Rng::seed_from_u64(base_seed);
    (0..n_trees).map(|_| master.r#gen()).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<RandomForest, RfError> {
    if config.n_trees == 0 {
        return Err(RfError::InvalidTreeCount { n_trees: 0 });
    }
    let (n_features, n_classes) = validate_training_data(features, labels, config.max_classes)?;
    let max_features = config.max_features.resolve(n_features)?;
    let n_samples = features.len();

    let tree_config = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    // Collecting into Result keeps index order and drops every tree if any fails.
    let trees = tree_seeds(config.seed, config.n_trees)
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sample = BootstrapSample::draw(n_samples, &mut rng);
            tree_config
                .clone()
                .with_seed(rng.r#gen())
                .fit_validated(
                    &sample.rows(features),
                    &sample.labels(labels),
                    n_features,
                    n_classes,
                )
        })
        .collect::<Result<Vec<DecisionTree>, RfError>>()?;

    debug!(
        n_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
        "tree training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        params: ForestParams {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features,
            criterion: config.criterion,
            seed: config.seed,
        },
    };

    info!(n_trees = forest.n_trees(), "random forest training complete");
    Ok(forest)
}

impl RandomForest {
    /// Borrow the trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the hyperparameters this forest was trained with.
    #[must_use]
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Mean Decrease in Impurity per feature, summed over trees and
    /// normalised to 1.0.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            for (total, importance) in totals.iter_mut().zip(tree.feature_importances()) {
                *total += importance;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }
}
