//! CART decision trees
//!
use std::collections::BTreeSet;

use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Ix1, Ix2};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::NodeIter;
use super::{DecisionTreeValidParams, SplitQuality};
use ids_forest::{
    dataset::Dataset,
    error::{Error, Result},
    traits::*,
    Float,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Feature values closer than this are treated as equal when searching split points
const FEATURE_THRESHOLD: f64 = 1e-7;

impl SplitQuality {
    /// Impurity of a node given its weighted class frequencies
    pub fn impurity(&self, class_freq: &[f64]) -> f64 {
        match self {
            SplitQuality::Gini => gini_impurity(class_freq),
            SplitQuality::Entropy => entropy(class_freq),
        }
    }
}

/// Given the class frequencies calculates the gini impurity of the subset.
fn gini_impurity(class_freq: &[f64]) -> f64 {
    let n_samples = class_freq.iter().sum::<f64>();
    if n_samples <= 0.0 {
        return 0.0;
    }

    let purity = class_freq
        .iter()
        .map(|x| x / n_samples)
        .map(|x| x * x)
        .sum::<f64>();

    1.0 - purity
}

/// Given the class frequencies calculates the entropy of the subset.
fn entropy(class_freq: &[f64]) -> f64 {
    let n_samples = class_freq.iter().sum::<f64>();
    if n_samples <= 0.0 {
        return 0.0;
    }

    class_freq
        .iter()
        .map(|x| x / n_samples)
        .map(|x| if x > 0.0 { -x * x.log2() } else { 0.0 })
        .sum()
}

/// Index of the largest entry, the first one on ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_idx, best), (idx, val)| {
            if *val > best {
                (idx, *val)
            } else {
                (best_idx, best)
            }
        })
        .0
}

/// Map labels to their position in the sorted `classes`
pub(crate) fn encode_targets<'a>(
    targets: impl Iterator<Item = &'a usize>,
    classes: &[usize],
) -> Result<Vec<usize>> {
    targets
        .map(|t| {
            classes
                .binary_search(t)
                .map_err(|_| Error::Parameters(format!("unknown class {}", t)))
        })
        .collect()
}

/// Decision of an internal node: samples with `x[feature_idx] <= threshold` go left
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
struct Split<F> {
    feature_idx: usize,
    threshold: F,
    left: usize,
    right: usize,
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
/// A node in the decision tree
pub struct TreeNode<F> {
    split: Option<Split<F>>,
    value: Vec<f64>,
    impurity: f64,
    n_samples: usize,
    weighted_n_samples: f64,
    depth: usize,
}

impl<F: Float> TreeNode<F> {
    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Returns the depth of the node in the decision tree
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Return the split (feature index, threshold) for internal nodes
    pub fn split(&self) -> Option<(usize, F)> {
        self.split.as_ref().map(|s| (s.feature_idx, s.threshold))
    }

    /// Returns the node ids of both children, first left then right
    pub fn children(&self) -> Option<(usize, usize)> {
        self.split.as_ref().map(|s| (s.left, s.right))
    }

    /// Weighted class frequencies of the training samples reaching this node
    pub fn class_frequencies(&self) -> &[f64] {
        &self.value
    }

    /// Class frequencies normalised to one
    pub fn class_distribution(&self) -> Vec<f64> {
        let total = self.weighted_n_samples;
        if total > 0.0 {
            self.value.iter().map(|x| x / total).collect()
        } else {
            self.value.clone()
        }
    }

    pub fn impurity(&self) -> f64 {
        self.impurity
    }

    /// Number of distinct training samples reaching this node
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn weighted_n_samples(&self) -> f64 {
        self.weighted_n_samples
    }
}

/// A fitted decision tree model for classification.
///
/// ### Structure
/// A decision tree structure is a binary tree where:
/// * Each internal node specifies a decision, represented by a choice of a feature and a threshold such that all
///   observations for which `feature <= threshold` is true fall in the left subtree, while the others fall in the
///   right subtree.
/// * leaf nodes store the weighted class frequencies of the training observations that reached them. The predicted
///   class is the most frequent one, the predicted probabilities are the normalised frequencies.
///
/// ### Algorithm
///
/// Starting with a single root node, nodes are grown depth first by applying the following rule to every node
/// considered:
///
/// * Draw features in random order until `max_features` non-constant features have been inspected;
/// * For each of them try every threshold halfway between two consecutive distinct values;
/// * Keep the threshold minimising the weighted impurity of the two children;
/// * If the weighted impurity decrease is at least `min_impurity_decrease`, create the two children, otherwise the
///   node becomes a leaf.
///
/// Nodes become leaves without searching when they are pure, hold fewer than `min_samples_split` samples or
/// reached `max_depth`.
///
/// The [quality score](SplitQuality) used can be specified in the [parameters](super::DecisionTreeParams).
///
/// ### Example
///
/// ```rust
/// use ids_forest_trees::DecisionTree;
/// use ids_forest::prelude::*;
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[0.1, 5.], [0.2, 4.], [0.8, 5.], [0.9, 4.]],
///     array![0usize, 0, 1, 1],
/// );
/// let tree = DecisionTree::params().fit(&dataset).unwrap();
///
/// assert_eq!(tree.depth(), 1);
/// assert_eq!(tree.feature_importances()[0], 1.0);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<F> {
    nodes: Vec<TreeNode<F>>,
    classes: Vec<usize>,
    num_features: usize,
}

/// Pending node of the depth-first builder
struct Frame {
    start: usize,
    end: usize,
    depth: usize,
    parent: Option<(usize, bool)>,
}

/// Best split found for a node
struct Candidate<F> {
    proxy: f64,
    feature_idx: usize,
    threshold: F,
    weighted_left: f64,
    weighted_right: f64,
    impurity_left: f64,
    impurity_right: f64,
}

/// Grows a tree from weighted samples, samples with zero weight are ignored
struct TreeBuilder<'a, 'r, F, R> {
    x: ArrayView2<'a, F>,
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    params: &'a DecisionTreeValidParams<F>,
    max_features: usize,
    features: Vec<usize>,
    rng: &'r mut R,
}

impl<'a, 'r, F: Float, R: Rng> TreeBuilder<'a, 'r, F, R> {
    fn class_frequencies(&self, samples: &[usize]) -> Vec<f64> {
        let mut freq = vec![0.0; self.n_classes];
        for s in samples {
            freq[self.y[*s]] += self.weights[*s];
        }
        freq
    }

    fn find_best_split(
        &mut self,
        samples: &[usize],
        parent_freq: &[f64],
        weighted_n: f64,
    ) -> Option<Candidate<F>> {
        let quality = self.params.split_quality();
        let min_leaf = self.params.min_samples_leaf();
        let feature_threshold = F::cast(FEATURE_THRESHOLD);
        let n_node = samples.len();

        self.features.shuffle(self.rng);

        let mut best: Option<Candidate<F>> = None;
        let mut visited = 0;
        let mut sorted = Vec::with_capacity(n_node);

        for feature_idx in self.features.iter().copied() {
            if visited >= self.max_features {
                break;
            }

            sorted.clear();
            sorted.extend(samples.iter().map(|s| (self.x[(*s, feature_idx)], *s)));
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            // constant features are skipped and do not count towards the quota
            if sorted[n_node - 1].0 <= sorted[0].0 + feature_threshold {
                continue;
            }
            visited += 1;

            let mut left_freq = vec![0.0; self.n_classes];
            let mut right_freq = parent_freq.to_vec();
            let (mut weighted_left, mut weighted_right) = (0.0, weighted_n);

            // move the samples one by one from the right to the left child
            for pos in 0..n_node - 1 {
                let (value, sample) = sorted[pos];
                let class = self.y[sample];
                let weight = self.weights[sample];

                left_freq[class] += weight;
                right_freq[class] -= weight;
                weighted_left += weight;
                weighted_right -= weight;

                let next = sorted[pos + 1].0;
                if next <= value + feature_threshold {
                    continue;
                }

                let n_left = pos + 1;
                if n_left < min_leaf || n_node - n_left < min_leaf {
                    continue;
                }

                let impurity_left = quality.impurity(&left_freq);
                let impurity_right = quality.impurity(&right_freq);
                let proxy = -weighted_left * impurity_left - weighted_right * impurity_right;

                if best.as_ref().map_or(true, |b| proxy > b.proxy) {
                    let mut threshold = value / F::cast(2.0) + next / F::cast(2.0);
                    if threshold == next || !threshold.is_finite() {
                        threshold = value;
                    }

                    best = Some(Candidate {
                        proxy,
                        feature_idx,
                        threshold,
                        weighted_left,
                        weighted_right,
                        impurity_left,
                        impurity_right,
                    });
                }
            }
        }

        best
    }

    fn build(mut self) -> Result<Vec<TreeNode<F>>> {
        let mut samples = (0..self.y.len())
            .filter(|s| self.weights[*s] > 0.0)
            .collect::<Vec<_>>();
        if samples.is_empty() {
            return Err(Error::NotEnoughSamples(
                "cannot grow a tree without samples".into(),
            ));
        }

        let params = self.params;
        let root_weight = samples.iter().map(|s| self.weights[*s]).sum::<f64>();
        let mut nodes: Vec<TreeNode<F>> = Vec::new();
        let mut stack = vec![Frame {
            start: 0,
            end: samples.len(),
            depth: 0,
            parent: None,
        }];

        while let Some(frame) = stack.pop() {
            let node_samples = &samples[frame.start..frame.end];
            let n_node = node_samples.len();
            let value = self.class_frequencies(node_samples);
            let weighted_n = value.iter().sum::<f64>();
            let impurity = params.split_quality().impurity(&value);

            let is_leaf = params.max_depth().map_or(false, |d| frame.depth >= d)
                || n_node < params.min_samples_split()
                || n_node < 2 * params.min_samples_leaf()
                || impurity <= f64::EPSILON;

            let split = if is_leaf {
                None
            } else {
                self.find_best_split(node_samples, &value, weighted_n)
                    .filter(|c| {
                        let improvement = (weighted_n / root_weight)
                            * (impurity
                                - c.weighted_right / weighted_n * c.impurity_right
                                - c.weighted_left / weighted_n * c.impurity_left);
                        improvement + f64::EPSILON >= params.min_impurity_decrease()
                    })
            };

            let node_id = nodes.len();
            if let Some((parent, is_left)) = frame.parent {
                if let Some(split) = nodes[parent].split.as_mut() {
                    if is_left {
                        split.left = node_id;
                    } else {
                        split.right = node_id;
                    }
                }
            }

            nodes.push(TreeNode {
                split: split.as_ref().map(|c| Split {
                    feature_idx: c.feature_idx,
                    threshold: c.threshold,
                    left: 0,
                    right: 0,
                }),
                value,
                impurity,
                n_samples: n_node,
                weighted_n_samples: weighted_n,
                depth: frame.depth,
            });

            if let Some(c) = split {
                // move samples of the left child to the front
                let node_samples = &mut samples[frame.start..frame.end];
                node_samples.sort_by_key(|s| self.x[(*s, c.feature_idx)] > c.threshold);
                let n_left = node_samples
                    .iter()
                    .take_while(|s| self.x[(**s, c.feature_idx)] <= c.threshold)
                    .count();
                let mid = frame.start + n_left;

                stack.push(Frame {
                    start: mid,
                    end: frame.end,
                    depth: frame.depth + 1,
                    parent: Some((node_id, false)),
                });
                stack.push(Frame {
                    start: frame.start,
                    end: mid,
                    depth: frame.depth + 1,
                    parent: Some((node_id, true)),
                });
            }
        }

        Ok(nodes)
    }
}

impl<F: Float> DecisionTree<F> {
    /// Grow a tree on weighted samples
    ///
    /// `y` holds positions into `classes`, samples with a weight of zero are left out.
    pub(crate) fn grow<R: Rng>(
        x: ArrayView2<F>,
        y: &[usize],
        weights: &[f64],
        classes: Vec<usize>,
        params: &DecisionTreeValidParams<F>,
        rng: &mut R,
    ) -> Result<Self> {
        if x.nrows() != y.len() || y.len() != weights.len() {
            return Err(Error::MismatchedShapes(x.nrows(), y.len()));
        }
        if x.ncols() == 0 {
            return Err(Error::Parameters("records have no features".into()));
        }

        let builder = TreeBuilder {
            x: x.reborrow(),
            y,
            weights,
            n_classes: classes.len(),
            params,
            max_features: params.max_features().resolve(x.ncols()),
            features: (0..x.ncols()).collect(),
            rng,
        };
        let nodes = builder.build()?;

        Ok(DecisionTree {
            nodes,
            classes,
            num_features: x.ncols(),
        })
    }

    /// Walk from the root to the leaf responsible for a sample
    fn leaf_for(&self, row: &ArrayBase<impl Data<Elem = F>, Ix1>) -> &TreeNode<F> {
        let mut node = &self.nodes[0];
        while let Some(split) = &node.split {
            node = if row[split.feature_idx] <= split.threshold {
                &self.nodes[split.left]
            } else {
                &self.nodes[split.right]
            };
        }
        node
    }

    /// Normalised class distribution of the leaf reached by a sample
    pub(crate) fn distribution_for(&self, row: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Vec<f64> {
        self.leaf_for(row).class_distribution()
    }

    /// Create a node iterator in level-order (BFT)
    pub fn iter_nodes(&self) -> NodeIter<F> {
        NodeIter::new(&self.nodes)
    }

    /// Return node by id, the root has id zero
    pub fn node(&self, id: usize) -> Option<&TreeNode<F>> {
        self.nodes.get(id)
    }

    /// Return root node of the tree
    pub fn root_node(&self) -> &TreeNode<F> {
        &self.nodes[0]
    }

    /// Class labels indexing the predicted probabilities, sorted ascending
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Return the indices of the features used in a split, sorted ascending
    pub fn features(&self) -> Vec<usize> {
        self.iter_nodes()
            .filter_map(|node| node.split().map(|(idx, _)| idx))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Return the weighted impurity decrease for each feature, normalised to sum to one
    ///
    /// Every split contributes the impurity of its node minus the impurity of the two children, all
    /// weighted by the fraction of the training weight reaching them. A tree without any split has
    /// zero importance everywhere.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut importances = Array1::zeros(self.num_features);

        for node in self.iter_nodes() {
            if let Some((left, right)) = node.children() {
                let (left, right) = (&self.nodes[left], &self.nodes[right]);
                let feature_idx = node.split.as_ref().map(|s| s.feature_idx).unwrap_or(0);

                importances[feature_idx] += node.weighted_n_samples * node.impurity
                    - left.weighted_n_samples * left.impurity
                    - right.weighted_n_samples * right.impurity;
            }
        }

        let root_weight = self.root_node().weighted_n_samples;
        if root_weight > 0.0 {
            importances /= root_weight;
        }

        let sum = importances.sum();
        if sum > 0.0 {
            importances /= sum;
        }

        importances
    }

    /// Return max depth of the tree
    pub fn depth(&self) -> usize {
        self.iter_nodes().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Return the number of leaves in this tree
    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }
}

impl<F: Float> Predict<F, usize> for DecisionTree<F> {
    /// Make predictions for each row of a matrix of features `x`.
    fn predict<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
        x.rows()
            .into_iter()
            .map(|row| self.classes[argmax(&self.leaf_for(&row).value)])
            .collect()
    }
}

impl<F: Float> PredictProba<F> for DecisionTree<F> {
    fn predict_proba<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (row, mut target) in x.rows().into_iter().zip(proba.rows_mut()) {
            for (t, p) in target.iter_mut().zip(self.distribution_for(&row)) {
                *t = F::cast(p);
            }
        }
        proba
    }
}

impl<F: Float> Fit<F, usize, Error> for DecisionTreeValidParams<F> {
    type Object = DecisionTree<F>;

    /// Fit a decision tree using `hyperparamters` on the dataset consisting of
    /// a matrix of features `x` and an array of labels `y`.
    fn fit(&self, dataset: &Dataset<F, usize>) -> Result<Self::Object> {
        let classes = dataset.labels();
        let y = encode_targets(dataset.targets.iter(), &classes)?;
        let weights = vec![1.0; y.len()];
        let mut rng = StdRng::seed_from_u64(self.seed());

        DecisionTree::grow(dataset.records(), &y, &weights, classes, self, &mut rng)
    }
}
