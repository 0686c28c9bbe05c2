use ids_forest::{
    error::{Error, Result},
    Float, ParamGuard,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::{
    DecisionTreeParams, DecisionTreeValidParams, MaxFeatures, RandomForestClassifier, SplitQuality,
};

/// Reweighting of the training samples by class
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassWeight {
    /// Weight every class by `n_samples / (n_classes * class_count)`, computed on the
    /// training targets before bootstrapping
    Balanced,
}

/// Checked hyperparameters of a [random forest](RandomForestClassifier)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomForestValidParams<F> {
    n_estimators: usize,
    tree: DecisionTreeValidParams<F>,
    bootstrap: bool,
    class_weight: Option<ClassWeight>,
    seed: u64,
}

impl<F: Float> RandomForestValidParams<F> {
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Parameters shared by every tree of the ensemble
    pub fn tree_params(&self) -> &DecisionTreeValidParams<F> {
        &self.tree
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn class_weight(&self) -> Option<ClassWeight> {
        self.class_weight
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// The set of hyperparameters that can be specified for fitting a
/// [random forest](RandomForestClassifier).
///
/// ### Example
///
/// ```rust
/// use ids_forest_trees::{RandomForestClassifier, MaxFeatures, SplitQuality};
/// use ids_forest::prelude::*;
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[0.1, 1.], [0.2, 0.], [0.3, 1.], [0.7, 0.], [0.8, 1.], [0.9, 0.]],
///     array![0usize, 0, 0, 1, 1, 1],
/// );
///
/// let forest = RandomForestClassifier::params()
///     .n_estimators(10)
///     .split_quality(SplitQuality::Entropy)
///     .max_features(MaxFeatures::All)
///     .fit(&dataset)
///     .unwrap();
///
/// assert_eq!(forest.predict(&array![[0.15, 0.], [0.85, 1.]]), array![0, 1]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomForestParams<F>(RandomForestValidParams<F>);

impl<F: Float> RandomForestParams<F> {
    pub fn new() -> Self {
        Self(RandomForestValidParams {
            n_estimators: 100,
            tree: DecisionTreeParams::new().max_features(MaxFeatures::Sqrt).0,
            bootstrap: true,
            class_weight: None,
            seed: 42,
        })
    }

    fn with_tree(
        mut self,
        update: impl FnOnce(DecisionTreeParams<F>) -> DecisionTreeParams<F>,
    ) -> Self {
        self.0.tree = update(DecisionTreeParams(self.0.tree)).0;
        self
    }

    /// Sets the number of trees in the ensemble
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Sets the metric used to decide the feature on which to split a node
    pub fn split_quality(self, split_quality: SplitQuality) -> Self {
        self.with_tree(|tree| tree.split_quality(split_quality))
    }

    /// Sets the optional limit to the depth of every tree
    pub fn max_depth(self, max_depth: Option<usize>) -> Self {
        self.with_tree(|tree| tree.max_depth(max_depth))
    }

    pub fn min_samples_split(self, min_samples_split: usize) -> Self {
        self.with_tree(|tree| tree.min_samples_split(min_samples_split))
    }

    pub fn min_samples_leaf(self, min_samples_leaf: usize) -> Self {
        self.with_tree(|tree| tree.min_samples_leaf(min_samples_leaf))
    }

    /// Sets the number of candidate features drawn in every node
    pub fn max_features(self, max_features: MaxFeatures) -> Self {
        self.with_tree(|tree| tree.max_features(max_features))
    }

    pub fn min_impurity_decrease(self, min_impurity_decrease: f64) -> Self {
        self.with_tree(|tree| tree.min_impurity_decrease(min_impurity_decrease))
    }

    /// Draw a bootstrap sample for every tree, otherwise every tree sees all samples
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.0.bootstrap = bootstrap;
        self
    }

    pub fn class_weight(mut self, class_weight: Option<ClassWeight>) -> Self {
        self.0.class_weight = class_weight;
        self
    }

    /// Sets the seed from which the seeds of all trees are derived
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float> Default for RandomForestParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> RandomForestClassifier<F> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `n_estimators = 100`
    /// * `split_quality = SplitQuality::Gini`
    /// * `max_depth = None`
    /// * `min_samples_split = 2`
    /// * `min_samples_leaf = 1`
    /// * `max_features = MaxFeatures::Sqrt`
    /// * `min_impurity_decrease = 0.0`
    /// * `bootstrap = true`
    /// * `class_weight = None`
    /// * `seed = 42`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> RandomForestParams<F> {
        RandomForestParams::new()
    }
}

impl<F: Float> ParamGuard for RandomForestParams<F> {
    type Checked = RandomForestValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_estimators < 1 {
            return Err(Error::Parameters(format!(
                "Number of estimators should be at least 1, but was {}",
                self.0.n_estimators
            )));
        }
        DecisionTreeParams(self.0.tree).check()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = RandomForestParams::<f64>::new().check().unwrap();

        assert_eq!(params.n_estimators(), 100);
        assert_eq!(params.tree_params().max_features(), MaxFeatures::Sqrt);
        assert_eq!(params.tree_params().split_quality(), SplitQuality::Gini);
        assert!(params.bootstrap());
        assert_eq!(params.class_weight(), None);
    }

    #[test]
    fn invalid_params() {
        let params = RandomForestParams::<f64>::new();

        assert!(params.n_estimators(0).check().is_err());
        assert!(params.min_samples_split(1).check().is_err());
        assert!(params.min_samples_leaf(0).check().is_err());
        assert!(params.max_depth(Some(0)).check().is_err());
    }
}
