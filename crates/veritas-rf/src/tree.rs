use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::RfError;
use crate::node::{Node, NodeIndex};
use crate::split::{SplitCriterion, find_best_split};

/// Exclusive upper bound on training labels unless a caller sets its own.
pub const DEFAULT_MAX_CLASSES: usize = 256;

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth.
    ///
    /// The root is depth 0, so `Some(1)` allows a single split.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of rows a node needs before it may split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of rows each child of a split must keep.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how many randomly chosen features each node examines.
    ///
    /// `None` examines every feature.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the seed of the feature-subsampling RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum rows required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum rows required in each child.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the per-node feature sample size, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Induce a decision tree from a row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]`, `labels[sample_idx]` (zero-based).
    /// The class count is taken as the largest label plus one. Labels must be
    /// below [`DEFAULT_MAX_CLASSES`].
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                         |
    /// |---------------------------------------|----------------------------------------------|
    /// | [`RfError::EmptyDataset`]             | `features` is empty                          |
    /// | [`RfError::ZeroFeatures`]             | rows have zero feature columns               |
    /// | [`RfError::LabelCountMismatch`]       | `labels.len() != features.len()`             |
    /// | [`RfError::FeatureCountMismatch`]     | rows have inconsistent lengths               |
    /// | [`RfError::NonFiniteValue`]           | any value is NaN or infinite                 |
    /// | [`RfError::LabelOutOfRange`]          | a label is not below the class limit         |
    /// | [`RfError::InvalidMaxFeatures`]       | `max_features` outside [1, n_features]       |
    /// | [`RfError::InvalidMaxDepth`]          | `max_depth` is `Some(0)`                     |
    /// | [`RfError::InvalidMinSamplesSplit`]   | `min_samples_split` < 2                      |
    /// | [`RfError::InvalidMinSamplesLeaf`]    | `min_samples_leaf` < 1                       |
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let (n_features, n_classes) =
            validate_training_data(features, labels, DEFAULT_MAX_CLASSES)?;
        self.fit_validated(features, labels, n_features, n_classes)
    }

    /// Induce a tree on data that already passed [`validate_training_data`].
    ///
    /// `n_classes` may exceed the labels present, so that every tree of a
    /// forest records votes over the same label range.
    #[instrument(level = "debug", skip_all, fields(n_samples = features.len()))]
    pub(crate) fn fit_validated(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_features: usize,
        n_classes: usize,
    ) -> Result<DecisionTree, RfError> {
        self.validate(n_features)?;
        let max_features = self.max_features.unwrap_or(n_features);

        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let mut builder = TreeBuilder {
            columns: &columns,
            labels,
            n_classes,
            config: self,
            max_features,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            arena: Vec::new(),
        };
        let all_rows: Vec<usize> = (0..features.len()).collect();
        builder.grow(&all_rows, 0);
        let nodes = builder.arena;

        debug!(n_nodes = nodes.len(), n_classes, "decision tree built");

        Ok(DecisionTree {
            nodes,
            n_features,
            n_classes,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
        })
    }

    fn validate(&self, n_features: usize) -> Result<(), RfError> {
        if self.max_depth == Some(0) {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(())
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a training set and return `(n_features, n_classes)`.
///
/// `n_classes` is the largest label plus one; every label must be below
/// `max_classes`.
pub(crate) fn validate_training_data(
    features: &[Vec<f64>],
    labels: &[usize],
    max_classes: usize,
) -> Result<(usize, usize), RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    if let Some((sample_index, &label)) = labels
        .iter()
        .enumerate()
        .find(|&(_, &label)| label >= max_classes)
    {
        return Err(RfError::LabelOutOfRange {
            label,
            sample_index,
            max_classes,
        });
    }
    // Every label is below max_classes, so the increment cannot overflow.
    let n_classes = labels.iter().max().map_or(1, |&max| max + 1);
    Ok((n_features, n_classes))
}

/// Recursive induction state for one tree.
struct TreeBuilder<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    config: &'a DecisionTreeConfig,
    max_features: usize,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `rows` and return the index of its root.
    fn grow(&mut self, rows: &[usize], depth: usize) -> NodeIndex {
        let mut votes = vec![0usize; self.n_classes];
        for &row in rows {
            votes[self.labels[row]] += 1;
        }
        let impurity = self.config.criterion.impurity(&votes, rows.len());

        let single_label = votes.iter().filter(|&&c| c > 0).count() <= 1;
        let at_max_depth = self.config.max_depth.is_some_and(|max| depth >= max);
        if single_label || at_max_depth || rows.len() < self.config.min_samples_split {
            return self.push(Node::leaf(votes, impurity));
        }

        let Some(split) = find_best_split(
            self.columns,
            self.labels,
            rows,
            self.n_classes,
            self.config.criterion,
            self.max_features,
            self.config.min_samples_leaf,
            &mut self.rng,
        ) else {
            return self.push(Node::leaf(votes, impurity));
        };

        // Reserve the parent slot so it precedes its children in the arena.
        let node_idx = self.push(Node::leaf(votes, impurity));
        let left = self.grow(&split.left_indices, depth + 1);
        let right = self.grow(&split.right_indices, depth + 1);

        self.arena[node_idx.index()] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity,
            n_samples: rows.len(),
            impurity_decrease: split.impurity_decrease,
        };
        node_idx
    }

    fn push(&mut self, node: Node) -> NodeIndex {
        self.arena.push(node);
        NodeIndex::new(self.arena.len() - 1)
    }
}

/// A fitted CART decision tree.
///
/// Immutable once built; the root is always at [`NodeIndex::ROOT`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
}

impl DecisionTree {
    /// Classify a single sample.
    ///
    /// Starting at the root, goes left when `sample[feature] <= threshold`
    /// and right otherwise, until a leaf is reached.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::DimensionMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::DimensionMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.leaf_label(sample))
    }

    /// Label of the leaf `sample` lands in; the length is assumed checked.
    pub(crate) fn leaf_label(&self, sample: &[f64]) -> usize {
        let mut idx = NodeIndex::ROOT.index();
        loop {
            match &self.nodes[idx] {
                Node::Leaf { prediction, .. } => return *prediction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Mean Decrease in Impurity per feature, normalised to sum to 1.0.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Check that every child index, feature index and leaf label is in range
    /// and that the root exists.
    pub(crate) fn check_structure(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if feature.index() >= self.n_features {
                        return Err(format!("node {idx} splits on missing feature {feature}"));
                    }
                    // Children always follow their parent, which rules out cycles.
                    for child in [left, right] {
                        if child.index() <= idx || child.index() >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf {
                    prediction, votes, ..
                } => {
                    if *prediction >= self.n_classes || votes.len() != self.n_classes {
                        return Err(format!("leaf {idx} disagrees with {} classes", self.n_classes));
                    }
                }
            }
        }
        Ok(())
    }

    /// Return the arena of nodes; the root is at index 0.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the feature count fixed at training time.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of labels leaves vote over.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the depth limit this tree was grown with.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the `min_samples_split` this tree was grown with.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the length of the longest root-to-leaf path.
    ///
    /// A tree that is a single leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(NodeIndex::ROOT, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::majority_label;

    /// Ten rows, three classes; feature 1 is weakly informative.
    fn ten_row_dataset() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = (0..10)
            .map(|i| vec![(i + 1) as f64, if i % 2 == 0 { 1.0 } else { 0.0 }])
            .collect();
        (features, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 2])
    }

    /// Walk the tree and return, per leaf, the labels of the rows reaching it.
    fn rows_per_leaf(tree: &DecisionTree, features: &[Vec<f64>], labels: &[usize]) -> Vec<(usize, Vec<usize>)> {
        let mut reached: Vec<Vec<usize>> = vec![Vec::new(); tree.n_nodes()];
        for (row, &label) in features.iter().zip(labels) {
            let mut idx = 0;
            while let Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } = &tree.nodes()[idx]
            {
                idx = if row[feature.index()] <= *threshold {
                    left.index()
                } else {
                    right.index()
                };
            }
            reached[idx].push(label);
        }
        reached.into_iter().enumerate().filter(|(i, _)| tree.nodes()[*i].is_leaf()).collect()
    }

    #[test]
    fn empty_dataset_error() {
        let err = DecisionTreeConfig::new().fit(&[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn label_count_mismatch_error() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = DecisionTreeConfig::new().fit(&features, &[0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelCountMismatch {
                n_samples: 2,
                n_labels: 1
            }
        ));
    }

    #[test]
    fn ragged_rows_error() {
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let err = DecisionTreeConfig::new().fit(&features, &[0, 1]).unwrap_err();
        assert!(matches!(err, RfError::FeatureCountMismatch { sample_index: 1, .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let features = vec![vec![1.0, 2.0], vec![3.0, f64::INFINITY]];
        let err = DecisionTreeConfig::new().fit(&features, &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            RfError::NonFiniteValue {
                sample_index: 1,
                feature_index: 1
            }
        ));
    }

    #[test]
    fn oversized_label_error() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = DecisionTreeConfig::new()
            .fit(&features, &[0, usize::MAX])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelOutOfRange {
                label: usize::MAX,
                sample_index: 1,
                max_classes: DEFAULT_MAX_CLASSES
            }
        ));
    }

    #[test]
    fn invalid_hyperparameters_rejected() {
        let (features, labels) = ten_row_dataset();
        let zero_depth = DecisionTreeConfig::new().with_max_depth(Some(0));
        assert!(matches!(
            zero_depth.fit(&features, &labels),
            Err(RfError::InvalidMaxDepth { .. })
        ));
        let tiny_split = DecisionTreeConfig::new().with_min_samples_split(1);
        assert!(matches!(
            tiny_split.fit(&features, &labels),
            Err(RfError::InvalidMinSamplesSplit { .. })
        ));
        let too_many = DecisionTreeConfig::new().with_max_features(Some(3));
        assert!(matches!(
            too_many.fit(&features, &labels),
            Err(RfError::InvalidMaxFeatures { .. })
        ));
    }

    #[test]
    fn single_label_is_one_leaf() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let tree = DecisionTreeConfig::new().fit(&features, &[1, 1, 1]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&[100.0, -4.0]).unwrap(), 1);
    }

    #[test]
    fn depth_one_tree_on_ten_rows() {
        let (features, labels) = ten_row_dataset();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(1))
            .with_min_samples_split(2)
            .fit(&features, &labels)
            .unwrap();

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        match &tree.nodes()[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                // Cutting at 6.5 isolates class 2 (decrease 3.6); cutting at
                // 3.5 isolates class 0 for only 3.17.
                assert_eq!(feature.index(), 0);
                assert!((threshold - 6.5).abs() < 1e-12);
            }
            Node::Leaf { .. } => panic!("root should split"),
        }
        // Left leaf holds classes 0 and 1 three apiece: the tie goes to 0.
        assert_eq!(tree.predict(&[2.0, 0.0]).unwrap(), 0);
        assert_eq!(tree.predict(&[5.0, 0.0]).unwrap(), 0);
        assert_eq!(tree.predict(&[9.0, 1.0]).unwrap(), 2);
    }

    #[test]
    fn leaves_hold_majority_of_their_rows() {
        let (features, labels) = ten_row_dataset();
        for max_depth in [Some(1), Some(2), None] {
            let tree = DecisionTreeConfig::new()
                .with_max_depth(max_depth)
                .fit(&features, &labels)
                .unwrap();
            for (leaf_idx, reached) in rows_per_leaf(&tree, &features, &labels) {
                let mut counts = vec![0; tree.n_classes()];
                reached.iter().for_each(|&l| counts[l] += 1);
                match &tree.nodes()[leaf_idx] {
                    Node::Leaf {
                        prediction, votes, ..
                    } => {
                        assert_eq!(votes, &counts);
                        assert_eq!(*prediction, majority_label(&counts));
                    }
                    Node::Split { .. } => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn single_label_nodes_are_leaves() {
        let (features, labels) = ten_row_dataset();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        for node in tree.nodes() {
            if let Node::Split { impurity, .. } = node {
                assert!(!impurity.is_pure());
            }
        }
        // Unlimited depth separates the training set completely.
        for (row, &label) in features.iter().zip(&labels) {
            assert_eq!(tree.predict(row).unwrap(), label);
        }
    }

    #[test]
    fn identical_rows_with_mixed_labels_become_a_leaf() {
        let features = vec![vec![1.0, 1.0]; 4];
        let tree = DecisionTreeConfig::new().fit(&features, &[0, 1, 1, 0]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&[1.0, 1.0]).unwrap(), 0);
    }

    #[test]
    fn min_samples_split_stops_growth() {
        let (features, labels) = ten_row_dataset();
        let tree = DecisionTreeConfig::new()
            .with_min_samples_split(11)
            .fit(&features, &labels)
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&[1.0, 1.0]).unwrap(), 2);
    }

    #[test]
    fn xor_needs_depth_two() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let labels = vec![0, 1, 1, 0];
        // No single cut lowers Gini on XOR, so the root stays a leaf.
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn prediction_dimension_mismatch() {
        let (features, labels) = ten_row_dataset();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(err, RfError::DimensionMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn records_hyperparameters() {
        let (features, labels) = ten_row_dataset();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(4))
            .with_min_samples_split(3)
            .fit(&features, &labels)
            .unwrap();
        assert_eq!(tree.max_depth(), Some(4));
        assert_eq!(tree.min_samples_split(), 3);
        assert_eq!(tree.n_features(), 2);
        assert_eq!(tree.n_classes(), 3);
        assert!(tree.check_structure().is_ok());
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let (features, labels) = ten_row_dataset();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        let importances = tree.feature_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn entropy_separates_too() {
        let (features, labels) = ten_row_dataset();
        let tree = DecisionTreeConfig::new()
            .with_criterion(SplitCriterion::Entropy)
            .fit(&features, &labels)
            .unwrap();
        assert_eq!(tree.predict(&[1.0, 1.0]).unwrap(), 0);
        assert_eq!(tree.predict(&[10.0, 0.0]).unwrap(), 2);
    }

    #[test]
    fn deterministic_with_feature_subsampling() {
        let (features, labels) = ten_row_dataset();
        let config = DecisionTreeConfig::new().with_max_features(Some(1)).with_seed(9);
        let a = config.fit(&features, &labels).unwrap();
        let b = config.fit(&features, &labels).unwrap();
        assert_eq!(a.nodes(), b.nodes());
    }

    #[test]
    fn corrupted_child_index_is_detected() {
        let (features, labels) = ten_row_dataset();
        let mut tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        if let Node::Split { left, .. } = &mut tree.nodes[0] {
            *left = NodeIndex::new(999);
        }
        assert!(tree.check_structure().is_err());
    }
}
