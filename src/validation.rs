//! Cross-validation
//!
//! Stratified k-fold splitting, per-fold scoring of an estimator and learning curves. Every
//! routine is generic over the hyperparameter type: anything that can be fitted to a dataset and
//! whose fitted model predicts labels can be validated.
use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::dataset::{Dataset, Label};
use crate::error::{Error, Result};
use crate::metrics_classification::f1_score;
use crate::traits::{Fit, Predict};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Stratified k-fold splitter without shuffling
///
/// Test folds are built so that each fold holds roughly the class proportions of the whole
/// dataset. Samples of a class keep their original order and are handed out to the folds in
/// contiguous blocks.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        StratifiedKFold { n_splits: 5 }
    }
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        StratifiedKFold { n_splits }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Assign every sample to a test fold
    fn test_folds<L: Label>(&self, labels: &[L]) -> Result<Vec<usize>> {
        let n_splits = self.n_splits;
        if n_splits < 2 {
            return Err(Error::Parameters(format!(
                "at least two folds are required, got {}",
                n_splits
            )));
        }
        if n_splits > labels.len() {
            return Err(Error::NotEnoughSamples(format!(
                "cannot have {} folds with only {} samples",
                n_splits,
                labels.len()
            )));
        }

        // encode classes in order of first appearance
        let mut codes = HashMap::new();
        let encoded = labels
            .iter()
            .map(|label| {
                let next = codes.len();
                *codes.entry(label).or_insert(next)
            })
            .collect::<Vec<usize>>();
        let n_classes = codes.len();

        let mut counts = vec![0usize; n_classes];
        for code in &encoded {
            counts[*code] += 1;
        }

        if counts.iter().all(|c| *c < n_splits) {
            return Err(Error::NotEnoughSamples(format!(
                "{} folds exceed the number of members in each class",
                n_splits
            )));
        }
        let smallest = counts.iter().copied().min().unwrap_or(0);
        if smallest < n_splits {
            tracing::warn!(
                smallest,
                n_splits,
                "the least populated class has fewer members than folds"
            );
        }

        // deal the sorted codes round robin to count class members per fold
        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        let mut allocation = Array2::<usize>::zeros((n_splits, n_classes));
        for (pos, code) in sorted.iter().enumerate() {
            allocation[(pos % n_splits, *code)] += 1;
        }

        let mut folds_of_class = (0..n_classes)
            .map(|k| {
                allocation
                    .column(k)
                    .iter()
                    .enumerate()
                    .flat_map(|(fold, n)| std::iter::repeat(fold).take(*n))
                    .collect::<Vec<_>>()
                    .into_iter()
            })
            .collect::<Vec<_>>();

        encoded
            .iter()
            .map(|code| {
                folds_of_class[*code]
                    .next()
                    .ok_or_else(|| Error::Parameters("fold allocation exhausted".into()))
            })
            .collect()
    }

    /// Return the `(train, test)` row indices of every fold, both sorted ascending
    pub fn split<L: Label>(&self, labels: &[L]) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let test_folds = self.test_folds(labels)?;

        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<_>, Vec<_>) =
                    (0..labels.len()).partition(|idx| test_folds[*idx] == fold);
                (train, test)
            })
            .collect())
    }
}

/// Scorer returning the F1-score of the `positive` label
pub fn f1_scorer<L: Label>(positive: L) -> impl Fn(ArrayView1<L>, ArrayView1<L>) -> Result<f64> {
    move |prediction, ground_truth| f1_score(&prediction, &ground_truth, &positive)
}

/// Fit on the training rows of every fold and score the prediction of its test rows
///
/// The scorer is called with `(prediction, ground_truth)` and returns one score per fold.
pub fn cross_val_score<F, L, P, E, S>(
    params: &P,
    dataset: &Dataset<F, L>,
    folds: &StratifiedKFold,
    scorer: S,
) -> std::result::Result<Array1<f64>, E>
where
    F: Clone,
    L: Label,
    P: Fit<F, L, E>,
    P::Object: Predict<F, L>,
    E: std::error::Error + From<Error>,
    S: Fn(ArrayView1<L>, ArrayView1<L>) -> Result<f64>,
{
    let labels = dataset.targets.to_vec();
    let splits = folds.split(&labels)?;

    let mut scores = Vec::with_capacity(splits.len());
    for (fold, (train, test)) in splits.into_iter().enumerate() {
        let train = dataset.select(&train);
        let test = dataset.select(&test);

        let model = params.fit(&train)?;
        let prediction = model.predict(&test.records);
        let score = scorer(prediction.view(), test.targets())?;

        tracing::debug!(fold, score, "cross-validation fold scored");
        scores.push(score);
    }

    Ok(Array1::from(scores))
}

/// Training and test scores for increasing training set sizes
///
/// Score matrices have one row per training size and one column per fold.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LearningCurve {
    pub train_sizes: Vec<usize>,
    pub train_scores: Array2<f64>,
    pub test_scores: Array2<f64>,
}

impl LearningCurve {
    pub fn train_mean(&self) -> Array1<f64> {
        self.train_scores.mean_axis(Axis(1)).unwrap_or_default()
    }

    pub fn test_mean(&self) -> Array1<f64> {
        self.test_scores.mean_axis(Axis(1)).unwrap_or_default()
    }

    /// Population standard deviation of the training scores
    pub fn train_std(&self) -> Array1<f64> {
        self.train_scores.std_axis(Axis(1), 0.0)
    }

    pub fn test_std(&self) -> Array1<f64> {
        self.test_scores.std_axis(Axis(1), 0.0)
    }
}

/// Convert relative training sizes into absolute, de-duplicated sample counts
fn absolute_sizes(fractions: &[f64], n_max: usize) -> Result<Vec<usize>> {
    if fractions.is_empty() {
        return Err(Error::Parameters("no training sizes given".into()));
    }
    if n_max == 0 {
        return Err(Error::NotEnoughSamples("empty training folds".into()));
    }

    let mut sizes = fractions
        .iter()
        .map(|frac| {
            if *frac > 0.0 && *frac <= 1.0 {
                Ok(((frac * n_max as f64) as usize).clamp(1, n_max))
            } else {
                Err(Error::Parameters(format!(
                    "training size fraction {} should be in (0, 1]",
                    frac
                )))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let requested = sizes.len();
    sizes.sort_unstable();
    sizes.dedup();
    if sizes.len() < requested {
        tracing::warn!(
            requested,
            distinct = sizes.len(),
            "some training sizes collapsed to the same number of samples"
        );
    }

    Ok(sizes)
}

/// Score an estimator trained on growing prefixes of every fold's training rows
///
/// The largest size is the training size of the first fold. For every size and fold the model is
/// fitted on the first `size` training rows and scored on those rows and on the fold's test rows.
pub fn learning_curve<F, L, P, E, S>(
    params: &P,
    dataset: &Dataset<F, L>,
    folds: &StratifiedKFold,
    fractions: &[f64],
    scorer: S,
) -> std::result::Result<LearningCurve, E>
where
    F: Clone,
    L: Label,
    P: Fit<F, L, E>,
    P::Object: Predict<F, L>,
    E: std::error::Error + From<Error>,
    S: Fn(ArrayView1<L>, ArrayView1<L>) -> Result<f64>,
{
    let labels = dataset.targets.to_vec();
    let splits = folds.split(&labels)?;
    let n_max = splits.first().map(|(train, _)| train.len()).unwrap_or(0);
    let train_sizes = absolute_sizes(fractions, n_max)?;

    let mut train_scores = Array2::zeros((train_sizes.len(), splits.len()));
    let mut test_scores = Array2::zeros((train_sizes.len(), splits.len()));

    for (fold, (train, test)) in splits.iter().enumerate() {
        let test = dataset.select(test);

        for (row, size) in train_sizes.iter().enumerate() {
            let subset = dataset.select(&train[..*size]);
            let model = params.fit(&subset)?;

            train_scores[(row, fold)] =
                scorer(model.predict(&subset.records).view(), subset.targets())?;
            test_scores[(row, fold)] = scorer(model.predict(&test.records).view(), test.targets())?;

            tracing::debug!(
                fold,
                size,
                train = train_scores[(row, fold)],
                test = test_scores[(row, fold)],
                "learning curve point"
            );
        }
    }

    Ok(LearningCurve {
        train_sizes,
        train_scores,
        test_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, ArrayBase, Data, Ix2};

    /// Splits the first feature halfway between the largest negative and the smallest
    /// positive sample
    struct ThresholdParams;

    struct Threshold(f64);

    impl Fit<f64, usize, Error> for ThresholdParams {
        type Object = Threshold;

        fn fit(&self, dataset: &Dataset<f64, usize>) -> Result<Threshold> {
            let (mut max_neg, mut min_pos) = (f64::NEG_INFINITY, f64::INFINITY);
            for (x, t) in dataset.records.column(0).iter().zip(dataset.targets.iter()) {
                if *t == 1 {
                    min_pos = min_pos.min(*x);
                } else {
                    max_neg = max_neg.max(*x);
                }
            }

            Ok(Threshold((max_neg + min_pos) / 2.0))
        }
    }

    impl Predict<f64, usize> for Threshold {
        fn predict<D: Data<Elem = f64>>(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
            x.column(0).mapv(|v| (v >= self.0) as usize)
        }
    }

    fn separable(n: usize) -> Dataset<f64, usize> {
        let targets = (0..n).map(|i| (i >= n / 2) as usize).collect::<Array1<_>>();
        let records = Array2::from_shape_fn((n, 1), |(i, _)| (targets[i] * 10 + i % 5) as f64);

        Dataset::new(records, targets)
    }

    #[test]
    fn folds_follow_round_robin_allocation() {
        let labels = vec![0usize, 0, 0, 0, 0, 0, 1, 1, 1, 1];
        let folds = StratifiedKFold::new(3).split(&labels).unwrap();

        // sorted labels dealt over three folds: [0,0,0,0,0,0,1,1,1,1]
        // fold 0 gets positions 0,3,6,9 -> two of class 0, two of class 1
        assert_eq!(folds[0].1, vec![0, 1, 6, 7]);
        assert_eq!(folds[1].1, vec![2, 3, 8]);
        assert_eq!(folds[2].1, vec![4, 5, 9]);
        assert_eq!(folds[0].0, vec![2, 3, 4, 5, 8, 9]);
    }

    #[test]
    fn folds_partition_the_samples() {
        let labels = (0..23).map(|i| i % 3 == 0).collect::<Vec<_>>();
        let folds = StratifiedKFold::new(5).split(&labels).unwrap();

        let mut seen = folds
            .iter()
            .flat_map(|(_, test)| test.iter().copied())
            .collect::<Vec<_>>();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 23);
            let positives = test.iter().filter(|idx| labels[**idx]).count();
            assert!((1..=2).contains(&positives));
        }
    }

    #[test]
    fn invalid_number_of_folds() {
        let labels = vec![0usize, 1, 0, 1];

        assert!(StratifiedKFold::new(1).split(&labels).is_err());
        assert!(StratifiedKFold::new(5).split(&labels).is_err());
    }

    #[test]
    fn cross_validation_scores() {
        let dataset = separable(50);
        let scores =
            cross_val_score(&ThresholdParams, &dataset, &StratifiedKFold::new(5), f1_scorer(1))
                .unwrap();

        assert_eq!(scores.len(), 5);
        assert_abs_diff_eq!(scores, Array1::from_elem(5, 1.0));
    }

    #[test]
    fn learning_curve_sizes_and_shapes() {
        let dataset = separable(50);
        let fractions = Array1::linspace(0.1, 1.0, 10).to_vec();

        let curve = learning_curve(
            &ThresholdParams,
            &dataset,
            &StratifiedKFold::new(5),
            &fractions,
            f1_scorer(1),
        )
        .unwrap();

        assert_eq!(curve.train_sizes, vec![4, 8, 12, 16, 20, 24, 28, 32, 36, 40]);
        assert_eq!(curve.train_scores.dim(), (10, 5));
        assert_eq!(curve.test_scores.dim(), (10, 5));
        assert_abs_diff_eq!(curve.train_std()[9], 0.0);
    }

    #[test]
    fn duplicated_sizes_are_merged() {
        assert_eq!(absolute_sizes(&[0.1, 0.11, 1.0], 10).unwrap(), vec![1, 10]);
        assert!(absolute_sizes(&[0.0], 10).is_err());
        assert_eq!(absolute_sizes(&[0.01], 10).unwrap(), vec![1]);
    }
}
