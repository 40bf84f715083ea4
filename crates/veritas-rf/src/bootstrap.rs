//! Bootstrap resampling for bagging.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::RfError;

/// Row indices drawn with replacement.
///
/// Holds indices rather than copied rows; [`BootstrapSample::rows`] and
/// [`BootstrapSample::labels`] materialise the resampled dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSample {
    indices: Vec<usize>,
}

impl BootstrapSample {
    /// Draw `n_samples` indices uniformly from `[0, n_samples)` with replacement.
    pub fn draw(n_samples: usize, rng: &mut impl Rng) -> Self {
        let indices = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
        Self { indices }
    }

    /// Draw with a fresh generator seeded from `seed`.
    #[must_use]
    pub fn seeded(n_samples: usize, seed: u64) -> Self {
        Self::draw(n_samples, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Return the drawn indices, duplicates included, in draw order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Copy the drawn rows out of `features`.
    #[must_use]
    pub fn rows(&self, features: &[Vec<f64>]) -> Vec<Vec<f64>> {
        self.indices.iter().map(|&i| features[i].clone()).collect()
    }

    /// Copy the drawn labels out of `labels`.
    #[must_use]
    pub fn labels(&self, labels: &[usize]) -> Vec<usize> {
        self.indices.iter().map(|&i| labels[i]).collect()
    }

    /// Indices of rows never drawn (out-of-bag), ascending.
    #[must_use]
    pub fn out_of_bag(&self, n_samples: usize) -> Vec<usize> {
        let mut in_bag = vec![false; n_samples];
        for &i in &self.indices {
            in_bag[i] = true;
        }
        (0..n_samples).filter(|&i| !in_bag[i]).collect()
    }
}

/// Resample a dataset with replacement, deterministically from `seed`.
///
/// Returns `(features', labels')` of the same length as the input.
///
/// # Errors
///
/// Returns [`RfError::LabelCountMismatch`] if `labels.len() != features.len()`.
pub fn bootstrap_sample(
    features: &[Vec<f64>],
    labels: &[usize],
    seed: u64,
) -> Result<(Vec<Vec<f64>>, Vec<usize>), RfError> {
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    let sample = BootstrapSample::seeded(features.len(), seed);
    Ok((sample.rows(features), sample.labels(labels)))
}
