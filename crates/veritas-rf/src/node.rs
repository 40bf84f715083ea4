use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Position of a node inside its tree's arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root of every tree.
    pub const ROOT: NodeIndex = NodeIndex(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Criterion-agnostic impurity value (Gini or Entropy).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// `true` when every sample at the node carries the same label.
    #[must_use]
    pub fn is_pure(self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// A node of a decision tree.
///
/// Nodes live in a per-tree `Vec<Node>` and refer to their children by
/// [`NodeIndex`], so a tree owns its nodes outright and serializes as a flat
/// list.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior node: rows with `x[feature] <= threshold` go left.
    Split {
        /// Feature compared at this node.
        feature: FeatureIndex,
        /// Midpoint between two consecutive distinct training values.
        threshold: f64,
        /// Left child (`<=`).
        left: NodeIndex,
        /// Right child (`>`).
        right: NodeIndex,
        /// Impurity of the rows reaching this node, before the split.
        impurity: Impurity,
        /// Number of training rows that reached this node.
        n_samples: usize,
        /// Weighted impurity decrease achieved by the split.
        impurity_decrease: f64,
    },
    /// A terminal node.
    Leaf {
        /// Majority label of the training rows that reached this leaf.
        prediction: usize,
        /// Training row count per label, indexed by label.
        votes: Vec<usize>,
        /// Impurity at this leaf.
        impurity: Impurity,
    },
}

impl Node {
    /// Build a leaf from per-label counts; the prediction is their majority.
    pub(crate) fn leaf(votes: Vec<usize>, impurity: Impurity) -> Self {
        Node::Leaf {
            prediction: majority_label(&votes),
            votes,
            impurity,
        }
    }

    /// Return the impurity at this node (before splitting for interior nodes).
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Return the number of training rows that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } => *n_samples,
            Node::Leaf { votes, .. } => votes.iter().sum(),
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Index of the largest count, preferring the lowest index on a tie.
///
/// Returns 0 for an empty slice.
pub(crate) fn majority_label(counts: &[usize]) -> usize {
    let mut best = 0;
    for (label, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = label;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_prefers_lowest_label_on_tie() {
        assert_eq!(majority_label(&[3, 3, 1]), 0);
        assert_eq!(majority_label(&[1, 4, 4]), 1);
        assert_eq!(majority_label(&[0, 0, 2]), 2);
        assert_eq!(majority_label(&[]), 0);
    }

    #[test]
    fn leaf_takes_majority_and_counts_rows() {
        let leaf = Node::leaf(vec![1, 5, 2], Impurity::new(0.53));
        assert!(leaf.is_leaf());
        assert_eq!(leaf.n_samples(), 8);
        match leaf {
            Node::Leaf { prediction, .. } => assert_eq!(prediction, 1),
            Node::Split { .. } => panic!("expected a leaf"),
        }
    }

    #[test]
    fn split_reports_its_sample_count() {
        let split = Node::Split {
            feature: FeatureIndex::new(2),
            threshold: 3.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            impurity: Impurity::new(0.48),
            n_samples: 20,
            impurity_decrease: 0.16,
        };
        assert!(!split.is_leaf());
        assert_eq!(split.n_samples(), 20);
        assert!((split.impurity().value() - 0.48).abs() < f64::EPSILON);
    }

    #[test]
    fn display_forms() {
        assert_eq!(FeatureIndex::new(3).to_string(), "f3");
        assert_eq!(NodeIndex::ROOT.to_string(), "#0");
        assert_eq!(Impurity::new(1.0 / 3.0).to_string(), "0.333333");
    }

    #[test]
    fn zero_impurity_is_pure() {
        assert!(Impurity::new(0.0).is_pure());
        assert!(!Impurity::new(0.2).is_pure());
    }
}
