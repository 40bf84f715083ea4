//! K-fold cross-validation and hold-out evaluation for Random Forest.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{info, instrument};

use crate::config::RandomForestConfig;
use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::tree::validate_training_data;

/// Cross-validation configuration.
///
/// Construct via [`CrossValidation::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `seed`          | 42      |
/// | `test_fraction` | 0.2     |
#[derive(Debug, Clone)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
    test_fraction: f64,
}

/// Accuracy of one forest on one held-out fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    /// Zero-based fold position.
    pub fold: usize,
    /// Rows the fold's forest was trained on.
    pub n_train: usize,
    /// Rows in the fold itself.
    pub n_test: usize,
    /// Correct predictions / fold size.
    pub accuracy: f64,
}

/// Evaluation on a single stratified train/test split.
#[derive(Debug, Clone)]
pub struct HoldoutEvaluation {
    /// Rows used for training.
    pub n_train: usize,
    /// Rows held out for testing.
    pub n_test: usize,
    /// Accuracy on the held-out rows.
    pub accuracy: f64,
    /// True × predicted counts on the held-out rows.
    pub confusion_matrix: ConfusionMatrix,
    /// The forest trained on the `n_train` rows; the one the metrics describe.
    pub forest: RandomForest,
}

/// Results of k-fold cross-validation plus the hold-out diagnostics.
#[derive(Debug, Clone)]
pub struct CrossValidationReport {
    /// Per-fold results, in fold order.
    pub folds: Vec<FoldResult>,
    /// Arithmetic mean of the fold accuracies.
    pub mean_accuracy: f64,
    /// Population standard deviation of the fold accuracies.
    pub std_accuracy: f64,
    /// Single train/test split evaluation, independent of the folds.
    pub holdout: HoldoutEvaluation,
    /// Total number of samples.
    pub n_samples: usize,
    /// Number of features.
    pub n_features: usize,
    /// Number of classes.
    pub n_classes: usize,
}

impl CrossValidationReport {
    /// Fold accuracies in fold order.
    #[must_use]
    pub fn fold_accuracies(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.accuracy).collect()
    }
}

impl CrossValidation {
    /// Create a new cross-validation config with the given number of folds.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, RfError> {
        if n_folds < 2 {
            return Err(RfError::InvalidFoldCount { n_folds });
        }
        Ok(Self {
            n_folds,
            seed: 42,
            test_fraction: 0.2,
        })
    }

    /// Set the seed used to shuffle rows into folds and into the hold-out split.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the fraction of rows held out for the confusion matrix.
    #[must_use]
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the hold-out test fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Run k-fold cross-validation and a hold-out evaluation.
    ///
    /// Rows are shuffled with the seed and cut into `n_folds` contiguous
    /// folds whose sizes differ by at most one. Each fold is scored by a
    /// fresh forest trained on the other folds. Separately, a stratified
    /// train/test split yields the confusion matrix.
    ///
    /// Folds run in parallel on the rayon pool.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::InvalidTestFraction`] | test fraction outside (0, 1) |
    /// | [`RfError::TooFewSamplesForFolds`] | fewer samples than folds |
    /// | Other RF errors | From validation or underlying training |
    #[instrument(skip_all, fields(n_folds = self.n_folds, n_samples = features.len()))]
    pub fn evaluate(
        &self,
        config: &RandomForestConfig,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<CrossValidationReport, RfError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(RfError::InvalidTestFraction {
                fraction: self.test_fraction,
            });
        }
        let (n_features, n_classes) =
            validate_training_data(features, labels, config.max_classes)?;
        let n_samples = features.len();
        if n_samples < self.n_folds {
            return Err(RfError::TooFewSamplesForFolds {
                n_samples,
                n_folds: self.n_folds,
            });
        }

        let folds = fold_partition(n_samples, self.n_folds, self.seed);

        let fold_results = (0..self.n_folds)
            .into_par_iter()
            .map(|fold| {
                let train_idx: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|&(other, _)| other != fold)
                    .flat_map(|(_, rows)| rows.iter().copied())
                    .collect();
                let test_idx = &folds[fold];

                let fold_config = config
                    .clone()
                    .with_seed(config.seed.wrapping_add(fold as u64));
                let scored = train_and_score(&fold_config, features, labels, &train_idx, test_idx)?;
                let accuracy = scored.accuracy;

                info!(fold, accuracy, n_test = test_idx.len(), "fold completed");
                Ok(FoldResult {
                    fold,
                    n_train: train_idx.len(),
                    n_test: test_idx.len(),
                    accuracy,
                })
            })
            .collect::<Result<Vec<FoldResult>, RfError>>()?;

        let accuracies: Vec<f64> = fold_results.iter().map(|f| f.accuracy).collect();
        let mean_accuracy = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
        let std_accuracy = (accuracies
            .iter()
            .map(|&a| (a - mean_accuracy).powi(2))
            .sum::<f64>()
            / accuracies.len() as f64)
            .sqrt();

        let holdout = self.holdout(config, features, labels, n_classes)?;

        info!(
            mean_accuracy,
            std_accuracy,
            holdout_accuracy = holdout.accuracy,
            "cross-validation complete"
        );

        Ok(CrossValidationReport {
            folds: fold_results,
            mean_accuracy,
            std_accuracy,
            holdout,
            n_samples,
            n_features,
            n_classes,
        })
    }

    fn holdout(
        &self,
        config: &RandomForestConfig,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<HoldoutEvaluation, RfError> {
        let (train_idx, test_idx) = stratified_split(labels, n_classes, self.test_fraction, self.seed);
        let scored = train_and_score(config, features, labels, &train_idx, &test_idx)?;
        Ok(HoldoutEvaluation {
            n_train: train_idx.len(),
            n_test: test_idx.len(),
            accuracy: scored.accuracy,
            confusion_matrix: ConfusionMatrix::from_labels(&scored.truth, &scored.predicted, n_classes)?,
            forest: scored.forest,
        })
    }
}

/// A forest trained on one split, with its predictions on the other.
struct Scored {
    forest: RandomForest,
    accuracy: f64,
    truth: Vec<usize>,
    predicted: Vec<usize>,
}

/// Train on `train_idx` and predict `test_idx`.
fn train_and_score(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    train_idx: &[usize],
    test_idx: &[usize],
) -> Result<Scored, RfError> {
    let pick_rows = |idx: &[usize]| idx.iter().map(|&i| features[i].clone()).collect::<Vec<_>>();
    let pick_labels = |idx: &[usize]| idx.iter().map(|&i| labels[i]).collect::<Vec<_>>();

    let forest = config.fit(&pick_rows(train_idx), &pick_labels(train_idx))?;
    let truth = pick_labels(test_idx);
    let predicted = forest.predict_batch(&pick_rows(test_idx))?;
    let correct = predicted.iter().zip(&truth).filter(|(p, t)| p == t).count();
    Ok(Scored {
        accuracy: correct as f64 / truth.len() as f64,
        forest,
        truth,
        predicted,
    })
}

/// Shuffle `0..n_samples` and cut it into `n_folds` contiguous folds.
///
/// The first `n_samples % n_folds` folds hold one extra row.
pub(crate) fn fold_partition(n_samples: usize, n_folds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..n_samples).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let base = n_samples / n_folds;
    let extra = n_samples % n_folds;
    let mut folds = Vec::with_capacity(n_folds);
    let mut start = 0;
    for fold in 0..n_folds {
        let size = base + usize::from(fold < extra);
        folds.push(order[start..start + size].to_vec());
        start += size;
    }
    folds
}

/// Split rows into `(train, test)` keeping class proportions.
///
/// Each class contributes `round(count * test_fraction)` rows to the test
/// side; both sides are then guaranteed at least one row when there are at
/// least two rows in total.
pub(crate) fn stratified_split(
    labels: &[usize],
    n_classes: usize,
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut rows in by_class {
        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64 * test_fraction).round() as usize).min(rows.len());
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    if labels.len() >= 2 {
        if test.is_empty() {
            test.extend(train.pop());
        } else if train.is_empty() {
            train.extend(test.pop());
        }
    }
    (train, test)
}
