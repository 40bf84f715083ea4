//! Majority-vote prediction for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::node::majority_label;

/// Per-label count of tree votes for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    counts: Vec<usize>,
}

impl VoteTally {
    pub(crate) fn new(counts: Vec<usize>) -> Self {
        Self { counts }
    }

    /// Return the votes cast for `label` (0 for labels never seen).
    #[must_use]
    pub fn count(&self, label: usize) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Return the total number of votes cast, i.e. the number of trees.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Return the label with the most votes, lowest label on a tie.
    #[must_use]
    pub fn winner(&self) -> usize {
        majority_label(&self.counts)
    }

    /// Return the counts indexed by label.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }
}

impl RandomForest {
    /// Predict the class label for a single sample by majority vote.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::DimensionMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(self.predict_with_votes(sample)?.winner())
    }

    /// Collect every tree's vote for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::DimensionMismatch`] when `sample.len() != n_features`.
    pub fn predict_with_votes(&self, sample: &[f64]) -> Result<VoteTally, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::DimensionMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut counts = vec![0usize; self.n_classes];
        for tree in &self.trees {
            counts[tree.leaf_label(sample)] += 1;
        }
        Ok(VoteTally::new(counts))
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::DimensionMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
