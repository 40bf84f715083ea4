use rand::Rng;
use rand::seq::index;

use crate::node::{FeatureIndex, Impurity};

/// Two decreases closer than this are treated as equal, so the earlier
/// candidate (lower feature, then lower threshold) keeps the win.
const TIE_TOLERANCE: f64 = 1e-10;

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// An empty node has zero impurity.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let probabilities = class_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64 / n);
        let value = match self {
            SplitCriterion::Gini => 1.0 - probabilities.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -probabilities.map(|p| p * p.ln()).sum::<f64>(),
        };
        Impurity::new(value.max(0.0))
    }
}

impl std::str::FromStr for SplitCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gini" => Ok(SplitCriterion::Gini),
            "entropy" => Ok(SplitCriterion::Entropy),
            other => Err(format!("unknown criterion: {other} (expected gini or entropy)")),
        }
    }
}

/// The chosen split of a node's rows.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I(parent) - n_l·I(left) - n_r·I(right)`; always positive.
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Pick the features examined at one node, in ascending order.
///
/// With `max_features >= n_features` every feature is used and the RNG is
/// left untouched.
fn candidate_features(n_features: usize, max_features: usize, rng: &mut impl Rng) -> Vec<usize> {
    if max_features >= n_features {
        return (0..n_features).collect();
    }
    let mut chosen = index::sample(rng, n_features, max_features).into_vec();
    chosen.sort_unstable();
    chosen
}

/// Find the split of `sample_indices` with the largest impurity decrease.
///
/// Candidate thresholds are the midpoints between consecutive distinct
/// values of a feature among the node's rows. Ties go to the lowest feature
/// index, then the lowest threshold.
///
/// Returns `None` when no candidate decreases impurity, e.g. when every
/// examined feature is constant, or when `min_samples_leaf` rules out every
/// boundary.
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    criterion: SplitCriterion,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || features.is_empty() {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let parent_weighted = n_samples as f64 * criterion.impurity(&parent_counts, n_samples).value();

    let mut best: Option<(FeatureIndex, f64, f64)> = None;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n_samples);

    for feat_idx in candidate_features(features.len(), max_features, rng) {
        let column = &features[feat_idx];
        sorted.clear();
        sorted.extend(sample_indices.iter().map(|&si| (column[si], labels[si])));
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for i in 0..n_samples - 1 {
            let (value, label) = sorted[i];
            left_counts[label] += 1;
            right_counts[label] -= 1;

            let next = sorted[i + 1].0;
            if value == next {
                continue;
            }
            let n_left = i + 1;
            let n_right = n_samples - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let decrease = parent_weighted
                - n_left as f64 * criterion.impurity(&left_counts, n_left).value()
                - n_right as f64 * criterion.impurity(&right_counts, n_right).value();

            let improves = match best {
                None => decrease > TIE_TOLERANCE,
                Some((_, _, best_decrease)) => decrease > best_decrease + TIE_TOLERANCE,
            };
            if improves {
                best = Some((FeatureIndex::new(feat_idx), midpoint(value, next), decrease));
            }
        }
    }

    let (feature, threshold, impurity_decrease) = best?;

    let column = &features[feature.index()];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| column[si] <= threshold);

    Some(SplitResult {
        feature,
        threshold,
        impurity_decrease,
        left_indices,
        right_indices,
    })
}

/// Midpoint of `lo < hi` that still sends `lo` left and `hi` right.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi { mid } else { lo }
}
