use ids_forest::{
    error::{Error, Result},
    Float, ParamGuard,
};
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::DecisionTree;

/// The metric used to determine the feature by which a node is split
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplitQuality {
    /// Measures the degree of probability of a randomly chosen point in the subtree being misclassified, defined as
    /// one minus the sum over all labels of the squared probability of encountering that label.
    /// At each step the split is applied to the feature which decreases the most the weighted Gini impurity of the
    /// two children.
    Gini,
    /// Measures the entropy of a subtree, defined as the sum over all labels of the probability of encountering that label in the
    /// subtree times its logarithm in base two, with negative sign. The entropy of the node minus the weighted sum of the entropy
    /// of its two subtrees defines the "information gain" obtained by applying the split.
    Entropy,
}

/// Number of features drawn at random as split candidates in every node
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least one
    Sqrt,
    /// `floor(log2(n_features))`, at least one
    Log2,
    /// Every feature is a candidate
    All,
}

impl MaxFeatures {
    /// Resolve to an absolute number of features
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
        };

        n.clamp(1, n_features.max(1))
    }
}

/// The set of hyperparameters that can be specified for fitting a
/// [decision tree](DecisionTree).
///
/// ### Example
///
/// ```rust
/// use ids_forest_trees::{DecisionTree, SplitQuality};
/// use ids_forest::prelude::*;
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[1., 2.], [1., 3.], [2., 2.], [2., 3.]],
///     array![0usize, 0, 1, 1],
/// );
///
/// let tree = DecisionTree::params()
///     .split_quality(SplitQuality::Entropy)
///     .max_depth(Some(5))
///     .fit(&dataset)
///     .unwrap();
///
/// assert_eq!(tree.predict(&dataset.records), dataset.targets);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeValidParams<F> {
    split_quality: SplitQuality,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
    min_impurity_decrease: f64,
    seed: u64,

    float_marker: PhantomData<F>,
}

impl<F: Float> DecisionTreeValidParams<F> {
    pub fn split_quality(&self) -> SplitQuality {
        self.split_quality
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    pub fn min_impurity_decrease(&self) -> f64 {
        self.min_impurity_decrease
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeParams<F>(pub(crate) DecisionTreeValidParams<F>);

impl<F: Float> DecisionTreeParams<F> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams {
            split_quality: SplitQuality::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            min_impurity_decrease: 0.0,
            seed: 42,
            float_marker: PhantomData,
        })
    }

    /// Sets the metric used to decide the feature on which to split a node
    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.split_quality = split_quality;
        self
    }

    /// Sets the optional limit to the depth of the decision tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of samples required to split a node
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of samples that a split has to place in each leaf
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the number of features considered when looking for the best split
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.max_features = max_features;
        self
    }

    /// Sets the minimum weighted decrease in impurity that a split needs to bring in order for it to be applied
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: f64) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }

    /// Sets the seed of the generator drawing candidate features
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float> Default for DecisionTreeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> DecisionTree<F> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `split_quality = SplitQuality::Gini`
    /// * `max_depth = None`
    /// * `min_samples_split = 2`
    /// * `min_samples_leaf = 1`
    /// * `max_features = MaxFeatures::All`
    /// * `min_impurity_decrease = 0.0`
    /// * `seed = 42`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F> {
        DecisionTreeParams::new()
    }
}

impl<F: Float> ParamGuard for DecisionTreeParams<F> {
    type Checked = DecisionTreeValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.min_samples_split < 2 {
            Err(Error::Parameters(format!(
                "Minimum number of samples to split should be at least 2, but was {}",
                self.0.min_samples_split
            )))
        } else if self.0.min_samples_leaf < 1 {
            Err(Error::Parameters(
                "Minimum number of samples in a leaf should be at least 1, but was 0".into(),
            ))
        } else if self.0.max_depth == Some(0) {
            Err(Error::Parameters(
                "Maximum depth should be at least 1, but was 0".into(),
            ))
        } else if !(self.0.min_impurity_decrease >= 0.0) {
            Err(Error::Parameters(format!(
                "Minimum impurity decrease should be non-negative, but was {}",
                self.0.min_impurity_decrease
            )))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
