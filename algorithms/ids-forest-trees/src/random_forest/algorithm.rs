//! Random forest classifier
//!
//! An ensemble of decision trees, each grown on a bootstrap sample of the training data with a
//! random subset of candidate features in every node.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2, Zip};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use super::{ClassWeight, RandomForestValidParams};
use crate::decision_trees::{argmax, encode_targets};
use crate::DecisionTree;
use ids_forest::{
    dataset::Dataset,
    error::{Error, Result},
    traits::*,
    Float,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A fitted random forest
///
/// Every tree votes with the class distribution of the leaf a sample falls into. The predicted
/// probabilities are the mean of these distributions, the predicted class is the one with the
/// highest mean probability.
///
/// ### Example
///
/// ```rust
/// use ids_forest_trees::{ClassWeight, RandomForestClassifier};
/// use ids_forest::prelude::*;
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[1., 0.], [2., 1.], [3., 0.], [7., 1.], [8., 0.], [9., 1.], [10., 0.], [11., 1.]],
///     array![0usize, 0, 0, 1, 1, 1, 1, 1],
/// );
///
/// let forest = RandomForestClassifier::params()
///     .n_estimators(16)
///     .class_weight(Some(ClassWeight::Balanced))
///     .fit(&dataset)
///     .unwrap();
///
/// let proba = forest.predict_proba(&dataset.records);
/// assert_eq!(proba.ncols(), forest.classes().len());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestClassifier<F> {
    trees: Vec<DecisionTree<F>>,
    classes: Vec<usize>,
    num_features: usize,
}

/// Weight of every class, indexed by position in the sorted classes
pub(crate) fn class_weights(
    y: &[usize],
    n_classes: usize,
    class_weight: Option<ClassWeight>,
) -> Vec<f64> {
    match class_weight {
        None => vec![1.0; n_classes],
        Some(ClassWeight::Balanced) => {
            let mut counts = vec![0usize; n_classes];
            for class in y {
                counts[*class] += 1;
            }

            counts
                .iter()
                .map(|count| {
                    if *count == 0 {
                        0.0
                    } else {
                        y.len() as f64 / (n_classes * count) as f64
                    }
                })
                .collect()
        }
    }
}

/// Multiplicity of every sample in a bootstrap sample of the same size
fn bootstrap_counts<R: Rng>(n_samples: usize, rng: &mut R) -> Vec<usize> {
    let mut counts = vec![0; n_samples];
    for _ in 0..n_samples {
        counts[rng.gen_range(0..n_samples)] += 1;
    }
    counts
}

impl<F: Float> Fit<F, usize, Error> for RandomForestValidParams<F> {
    type Object = RandomForestClassifier<F>;

    fn fit(&self, dataset: &Dataset<F, usize>) -> Result<Self::Object> {
        let n_samples = dataset.nsamples();
        if n_samples == 0 {
            return Err(Error::NotEnoughSamples(
                "cannot fit a random forest without samples".into(),
            ));
        }

        let classes = dataset.labels();
        let y = encode_targets(dataset.targets.iter(), &classes)?;
        let class_weights = class_weights(&y, classes.len(), self.class_weight());
        let sample_weights = y.iter().map(|c| class_weights[*c]).collect::<Vec<_>>();

        // one seed per tree, drawn before the trees are grown in parallel
        let mut rng = StdRng::seed_from_u64(self.seed());
        let seeds = (0..self.n_estimators())
            .map(|_| rng.gen::<u64>())
            .collect::<Vec<_>>();

        tracing::debug!(
            n_estimators = self.n_estimators(),
            n_samples,
            n_features = dataset.nfeatures(),
            n_classes = classes.len(),
            "fitting random forest"
        );

        let records = dataset.records();
        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let weights = if self.bootstrap() {
                    bootstrap_counts(n_samples, &mut rng)
                        .iter()
                        .zip(&sample_weights)
                        .map(|(count, weight)| *count as f64 * weight)
                        .collect()
                } else {
                    sample_weights.clone()
                };

                DecisionTree::grow(
                    records,
                    &y,
                    &weights,
                    classes.clone(),
                    self.tree_params(),
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RandomForestClassifier {
            trees,
            classes,
            num_features: dataset.nfeatures(),
        })
    }
}

impl<F: Float> RandomForestClassifier<F> {
    /// Mean class distribution of all trees for a single sample
    fn mean_distribution(&self, row: &ArrayView1<F>) -> Vec<f64> {
        let mut mean = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in mean.iter_mut().zip(tree.distribution_for(row)) {
                *acc += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        mean.iter_mut().for_each(|x| *x /= n_trees);
        mean
    }

    /// Class labels indexing the columns of [`predict_proba`](PredictProba::predict_proba),
    /// sorted ascending
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn trees(&self) -> &[DecisionTree<F>] {
        &self.trees
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Mean decrease in impurity per feature, normalised to sum to one
    ///
    /// Trees consisting of a single leaf are left out of the mean. If no tree has a split every
    /// importance is zero.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut importances = Array1::zeros(self.num_features);
        let mut n_used = 0;

        for tree in self.trees.iter().filter(|tree| tree.node_count() > 1) {
            importances += &tree.feature_importances();
            n_used += 1;
        }

        if n_used == 0 {
            return importances;
        }

        importances /= n_used as f64;
        let sum = importances.sum();
        if sum > 0.0 {
            importances /= sum;
        }

        importances
    }
}

impl<F: Float> PredictProba<F> for RandomForestClassifier<F> {
    fn predict_proba<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let x = x.view();
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));

        Zip::from(proba.axis_iter_mut(Axis(0)))
            .and(x.axis_iter(Axis(0)))
            .par_for_each(|mut target, row| {
                for (t, p) in target.iter_mut().zip(self.mean_distribution(&row)) {
                    *t = F::cast(p);
                }
            });

        proba
    }
}

impl<F: Float> Predict<F, usize> for RandomForestClassifier<F> {
    fn predict<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
        let x = x.view();
        let mut prediction = Array1::zeros(x.nrows());

        Zip::from(&mut prediction)
            .and(x.axis_iter(Axis(0)))
            .par_for_each(|target, row| {
                *target = self.classes[argmax(&self.mean_distribution(&row))];
            });

        prediction
    }
}
