//! Common metrics for performance evaluation of classifier
//!
//! Scoring is essential for classification tasks. This module implements the confusion matrix
//! and the scores derived from it (precision, recall, f1-score, specificity), a printable
//! classification report, the ROC curve and the area under it.
use std::collections::HashMap;
use std::fmt;

use ndarray::prelude::*;
use ndarray::Data;

use crate::dataset::{Float, Label};
use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

fn check_lengths(prediction: usize, ground_truth: usize) -> Result<()> {
    if prediction != ground_truth {
        return Err(Error::MismatchedShapes(prediction, ground_truth));
    }
    Ok(())
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

fn harmonic_mean(p: f64, r: f64) -> f64 {
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Confusion matrix for multi-class evaluation
///
/// Rows correspond to the ground truth and columns to the prediction, both indexed by the sorted
/// union of labels seen in either. The diagonal entries are correct predictions.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix<L> {
    matrix: Array2<usize>,
    members: Vec<L>,
}

impl<L> ConfusionMatrix<L> {
    /// Sorted labels indexing rows and columns
    pub fn classes(&self) -> &[L] {
        &self.members
    }

    pub fn matrix(&self) -> ArrayView2<usize> {
        self.matrix.view()
    }

    /// Number of ground truth samples per class
    pub fn support(&self) -> Array1<usize> {
        self.matrix.sum_axis(Axis(1))
    }

    /// Calculate precision for every class, zero when a class is never predicted
    pub fn precision(&self) -> Array1<f64> {
        let predicted = self.matrix.sum_axis(Axis(0));

        self.matrix
            .diag()
            .iter()
            .zip(predicted.iter())
            .map(|(a, b)| ratio(*a, *b))
            .collect()
    }

    /// Calculate recall for every class, zero when a class never occurs
    pub fn recall(&self) -> Array1<f64> {
        let support = self.support();

        self.matrix
            .diag()
            .iter()
            .zip(support.iter())
            .map(|(a, b)| ratio(*a, *b))
            .collect()
    }

    /// Return the beta=1 score for every class
    pub fn f1_score(&self) -> Array1<f64> {
        self.precision()
            .iter()
            .zip(self.recall().iter())
            .map(|(p, r)| harmonic_mean(*p, *r))
            .collect()
    }

    /// Return mean accuracy
    pub fn accuracy(&self) -> f64 {
        ratio(self.matrix.diag().sum(), self.matrix.sum())
    }
}

/// Print a confusion matrix
impl<L: fmt::Debug> fmt::Display for ConfusionMatrix<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "classes: {:?}", self.members)?;
        for row in self.matrix.rows() {
            write!(f, "|")?;
            for val in row {
                write!(f, " {:>7} |", val)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Classification functions
///
/// Contains only routine for the confusion matrix, as all other current metrices can be derived
/// from the entries in the matrix.
pub trait ToConfusionMatrix<L> {
    fn confusion_matrix<D: Data<Elem = L>>(
        &self,
        ground_truth: &ArrayBase<D, Ix1>,
    ) -> Result<ConfusionMatrix<L>>;
}

impl<L: Label, C: Data<Elem = L>> ToConfusionMatrix<L> for ArrayBase<C, Ix1> {
    fn confusion_matrix<D: Data<Elem = L>>(
        &self,
        ground_truth: &ArrayBase<D, Ix1>,
    ) -> Result<ConfusionMatrix<L>> {
        check_lengths(self.len(), ground_truth.len())?;

        let mut classes = ground_truth
            .iter()
            .chain(self.iter())
            .cloned()
            .collect::<Vec<_>>();
        classes.sort();
        classes.dedup();

        let index = classes
            .iter()
            .enumerate()
            .map(|(idx, label)| (label, idx))
            .collect::<HashMap<_, _>>();

        let mut matrix = Array2::zeros((classes.len(), classes.len()));
        for (truth, pred) in ground_truth.iter().zip(self.iter()) {
            matrix[(index[truth], index[pred])] += 1;
        }

        Ok(ConfusionMatrix {
            matrix,
            members: classes,
        })
    }
}

/// Counts of a binary task, one label is the positive class and every other label is negative
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryCounts {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl BinaryCounts {
    pub fn from_predictions<L: PartialEq, C: Data<Elem = L>, D: Data<Elem = L>>(
        prediction: &ArrayBase<C, Ix1>,
        ground_truth: &ArrayBase<D, Ix1>,
        positive: &L,
    ) -> Result<BinaryCounts> {
        check_lengths(prediction.len(), ground_truth.len())?;

        let mut counts = BinaryCounts::default();
        for (pred, truth) in prediction.iter().zip(ground_truth.iter()) {
            match (truth == positive, pred == positive) {
                (true, true) => counts.tp += 1,
                (true, false) => counts.fn_ += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
            }
        }

        Ok(counts)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// True negative rate `tn / (tn + fp)`, zero if there are no negative samples
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn f1(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }
}

/// F1-score of the positive label, zero on zero division
pub fn f1_score<L: PartialEq, C: Data<Elem = L>, D: Data<Elem = L>>(
    prediction: &ArrayBase<C, Ix1>,
    ground_truth: &ArrayBase<D, Ix1>,
    positive: &L,
) -> Result<f64> {
    BinaryCounts::from_predictions(prediction, ground_truth, positive).map(|c| c.f1())
}

/// Per-class scores with averages, printable in the familiar tabular layout
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    target_names: Vec<String>,
    precision: Array1<f64>,
    recall: Array1<f64>,
    f1: Array1<f64>,
    support: Array1<usize>,
    accuracy: f64,
    digits: usize,
}

impl ClassificationReport {
    pub fn new<L: fmt::Display>(cm: &ConfusionMatrix<L>) -> Self {
        ClassificationReport {
            target_names: cm.classes().iter().map(|x| x.to_string()).collect(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1: cm.f1_score(),
            support: cm.support(),
            accuracy: cm.accuracy(),
            digits: 4,
        }
    }

    /// Replace the class labels by human readable names
    pub fn with_target_names<I: Into<String>>(mut self, names: Vec<I>) -> Result<Self> {
        if names.len() != self.target_names.len() {
            return Err(Error::Parameters(format!(
                "{} target names given for {} classes",
                names.len(),
                self.target_names.len()
            )));
        }

        self.target_names = names.into_iter().map(|x| x.into()).collect();
        Ok(self)
    }

    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Unweighted mean of (precision, recall, f1) over the classes
    pub fn macro_avg(&self) -> (f64, f64, f64) {
        let mean = |x: &Array1<f64>| x.mean().unwrap_or(0.0);

        (mean(&self.precision), mean(&self.recall), mean(&self.f1))
    }

    /// Mean of (precision, recall, f1) weighted by class support
    pub fn weighted_avg(&self) -> (f64, f64, f64) {
        let total = self.support.sum();
        let weighted = |x: &Array1<f64>| {
            if total == 0 {
                return 0.0;
            }
            x.iter()
                .zip(self.support.iter())
                .map(|(v, s)| v * *s as f64)
                .sum::<f64>()
                / total as f64
        };

        (
            weighted(&self.precision),
            weighted(&self.recall),
            weighted(&self.f1),
        )
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let digits = self.digits;
        let width = self
            .target_names
            .iter()
            .map(|x| x.len())
            .chain([("weighted avg").len(), digits])
            .max()
            .unwrap_or(0);
        let total = self.support.sum();

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for (idx, name) in self.target_names.iter().enumerate() {
            writeln!(
                f,
                "{:>width$}  {:>9.digits$} {:>9.digits$} {:>9.digits$} {:>9}",
                name, self.precision[idx], self.recall[idx], self.f1[idx], self.support[idx]
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.digits$} {:>9}",
            "accuracy", "", "", self.accuracy, total
        )?;
        let (p, r, f1) = self.macro_avg();
        writeln!(
            f,
            "{:>width$}  {:>9.digits$} {:>9.digits$} {:>9.digits$} {:>9}",
            "macro avg", p, r, f1, total
        )?;
        let (p, r, f1) = self.weighted_avg();
        writeln!(
            f,
            "{:>width$}  {:>9.digits$} {:>9.digits$} {:>9.digits$} {:>9}",
            "weighted avg", p, r, f1, total
        )
    }
}

/// Integration using the trapezoidal rule.
fn trapezoidal<A: Float>(vals: &[(A, A)]) -> A {
    let mut prev_x = vals[0].0;
    let mut prev_y = vals[0].1;
    let mut integral = A::zero();

    for (x, y) in vals.iter().skip(1) {
        integral += (*x - prev_x) * (prev_y + *y) / A::cast(2.0);
        prev_x = *x;
        prev_y = *y;
    }
    integral
}

/// Points of a ROC curve with the score threshold belonging to each point
///
/// The first point is always `(0, 0)` with an infinite threshold.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverOperatingCharacteristic<A> {
    fpr: Vec<A>,
    tpr: Vec<A>,
    thresholds: Vec<A>,
}

impl<A: Float> ReceiverOperatingCharacteristic<A> {
    /// Return the curve as `(false positive rate, true positive rate)` pairs
    pub fn get_curve(&self) -> Vec<(A, A)> {
        self.fpr.iter().copied().zip(self.tpr.iter().copied()).collect()
    }

    pub fn false_positive_rates(&self) -> &[A] {
        &self.fpr
    }

    pub fn true_positive_rates(&self) -> &[A] {
        &self.tpr
    }

    pub fn get_thresholds(&self) -> &[A] {
        &self.thresholds
    }

    pub fn area_under_curve(&self) -> A {
        trapezoidal(&self.get_curve())
    }
}

pub trait BinaryClassification<A> {
    fn roc(&self, y: &[bool]) -> Result<ReceiverOperatingCharacteristic<A>>;
}

/// The ROC curve gives insight about the seperability of a binary classification task. This
/// functions returns the ROC curve and threshold belonging to each position on the curve.
///
/// Scores are visited from highest to lowest. Every distinct score adds one point after all
/// samples with that score were counted. Fails if `y` holds only one of the two classes.
impl<A: Float, D: Data<Elem = A>> BinaryClassification<A> for ArrayBase<D, Ix1> {
    fn roc(&self, y: &[bool]) -> Result<ReceiverOperatingCharacteristic<A>> {
        check_lengths(self.len(), y.len())?;

        let mut tuples = self
            .iter()
            .copied()
            .zip(y.iter().copied())
            .collect::<Vec<(A, bool)>>();
        tuples.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let max_tp = tuples.iter().filter(|x| x.1).count();
        let max_fp = tuples.len() - max_tp;
        if max_tp == 0 || max_fp == 0 {
            return Err(Error::SingleClass);
        }

        let mut fpr = vec![A::zero()];
        let mut tpr = vec![A::zero()];
        let mut thresholds = vec![A::infinity()];
        let (mut tp, mut fp) = (0usize, 0usize);

        for (idx, (score, truth)) in tuples.iter().enumerate() {
            if *truth {
                tp += 1;
            } else {
                fp += 1;
            }

            // emit a point once the last sample sharing this score was counted
            let last_of_score = tuples.get(idx + 1).map_or(true, |next| next.0 != *score);
            if last_of_score {
                fpr.push(A::cast(fp) / A::cast(max_fp));
                tpr.push(A::cast(tp) / A::cast(max_tp));
                thresholds.push(*score);
            }
        }

        Ok(ReceiverOperatingCharacteristic {
            fpr,
            tpr,
            thresholds,
        })
    }
}

/// ROC curve of positive-class `scores` against the boolean ground truth, see
/// [`BinaryClassification::roc`]
pub fn roc_curve<A: Float, D: Data<Elem = A>>(
    scores: &ArrayBase<D, Ix1>,
    truth: &[bool],
) -> Result<ReceiverOperatingCharacteristic<A>> {
    scores.roc(truth)
}

#[cfg(test)]
mod tests {
    use super::{
        roc_curve, BinaryClassification, BinaryCounts, ClassificationReport, ToConfusionMatrix,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, ArrayView1};
    use rand::{distributions::Uniform, rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_confusion_matrix() {
        let predicted = ArrayView1::from(&[0usize, 1, 0, 1, 0, 1]);
        let ground_truth = ArrayView1::from(&[1usize, 1, 0, 1, 0, 1]);

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        assert_eq!(cm.matrix(), array![[2usize, 0], [1, 3]]);
        assert_eq!(cm.classes(), &[0usize, 1]);
    }

    #[test]
    fn test_cm_metrices() {
        let predicted = Array1::from(vec![0usize, 1, 0, 1, 0, 1]);
        let ground_truth = Array1::from(vec![1usize, 1, 0, 1, 0, 1]);

        let x = predicted.confusion_matrix(&ground_truth).unwrap();

        assert_abs_diff_eq!(x.accuracy(), 5.0 / 6.0);
        assert_abs_diff_eq!(x.precision(), array![2. / 3., 1.0], epsilon = 1e-12);
        assert_abs_diff_eq!(x.recall(), array![1.0, 3. / 4.], epsilon = 1e-12);
        assert_abs_diff_eq!(x.f1_score(), array![4.0 / 5.0, 6.0 / 7.0], epsilon = 1e-12);
    }

    #[test]
    fn never_predicted_class_scores_zero() {
        let predicted = array![0usize, 0, 0];
        let ground_truth = array![0usize, 1, 1];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();
        assert_abs_diff_eq!(cm.precision(), array![1. / 3., 0.0], epsilon = 1e-12);
        assert_abs_diff_eq!(cm.f1_score()[1], 0.0);
    }

    #[test]
    fn mismatched_lengths() {
        let predicted = array![0usize, 1];
        let ground_truth = array![0usize];

        assert!(predicted.confusion_matrix(&ground_truth).is_err());
    }

    #[test]
    fn binary_counts_and_specificity() {
        let predicted = array![0usize, 1, 1, 0, 1, 0];
        let ground_truth = array![0usize, 0, 1, 1, 1, 0];

        let counts = BinaryCounts::from_predictions(&predicted, &ground_truth, &1).unwrap();
        assert_eq!(
            counts,
            BinaryCounts {
                tn: 2,
                fp: 1,
                fn_: 1,
                tp: 2
            }
        );
        assert_abs_diff_eq!(counts.specificity(), 2. / 3.);
        assert_abs_diff_eq!(counts.precision(), 2. / 3.);
        assert_abs_diff_eq!(counts.recall(), 2. / 3.);
    }

    #[test]
    fn specificity_without_negatives_is_zero() {
        let predicted = array![1usize, 1, 0];
        let ground_truth = array![1usize, 1, 1];

        let counts = BinaryCounts::from_predictions(&predicted, &ground_truth, &1).unwrap();
        assert_eq!(counts.tn + counts.fp, 0);
        assert_abs_diff_eq!(counts.specificity(), 0.0);
    }

    #[test]
    fn f1_zero_division() {
        let predicted = array![0usize, 0];
        let ground_truth = array![0usize, 0];

        assert_abs_diff_eq!(super::f1_score(&predicted, &ground_truth, &1).unwrap(), 0.0);
    }

    #[test]
    fn report_layout() {
        let predicted = array![0usize, 1, 0, 1, 0, 1];
        let ground_truth = array![1usize, 1, 0, 1, 0, 1];
        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        let report = ClassificationReport::new(&cm)
            .with_target_names(vec!["attack", "normal"])
            .unwrap();
        let text = report.to_string();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(
            lines[0],
            "              precision    recall  f1-score   support"
        );
        assert_eq!(
            lines[2],
            "      attack     0.6667    1.0000    0.8000         2"
        );
        assert_eq!(
            lines[5],
            "    accuracy                         0.8333         6"
        );
        assert!(lines[7].starts_with("weighted avg"));

        assert!(ClassificationReport::new(&cm)
            .with_target_names(vec!["one"])
            .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn report_is_saved_as_json() {
        let predicted = array![0usize, 1, 0, 1, 0, 1];
        let ground_truth = array![1usize, 1, 0, 1, 0, 1];
        let cm = predicted.confusion_matrix(&ground_truth).unwrap();
        let report = ClassificationReport::new(&cm);

        let json = serde_json::to_string(&report).unwrap();
        let loaded: ClassificationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.to_string(), report.to_string());

        let loaded_cm: super::ConfusionMatrix<usize> =
            serde_json::from_str(&serde_json::to_string(&cm).unwrap()).unwrap();
        assert_eq!(loaded_cm, cm);
    }

    #[test]
    fn test_roc_curve() {
        let predicted: ArrayView1<f64> = ArrayView1::from(&[0.1, 0.3, 0.5, 0.7, 0.8, 0.9]);
        let groundtruth = vec![false, true, false, true, true, true];

        let result = &[
            (0.0, 0.0),  // start
            (0.0, 0.25), // 0.9 is a true positive
            (0.0, 0.5),
            (0.0, 0.75),
            (0.5, 0.75), // 0.5 is a false positive
            (0.5, 1.0),
            (1.0, 1.0),
        ];

        let roc = predicted.roc(&groundtruth).unwrap();
        assert_eq!(roc.get_curve(), result);
        assert!(roc.get_thresholds()[0].is_infinite());
        assert_eq!(roc.get_thresholds()[1], 0.9);
        assert_abs_diff_eq!(roc.area_under_curve(), 0.875);
    }

    #[test]
    fn roc_merges_tied_scores() {
        let predicted = array![0.5, 0.5, 0.5, 0.5];
        let groundtruth = vec![true, false, true, false];

        let roc = predicted.roc(&groundtruth).unwrap();
        assert_eq!(roc.get_curve(), vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_abs_diff_eq!(roc.area_under_curve(), 0.5);
    }

    #[test]
    fn roc_requires_both_classes() {
        let predicted = array![0.1, 0.9];

        assert!(predicted.roc(&[true, true]).is_err());
    }

    #[test]
    fn test_roc_auc() {
        let predicted = Array1::<f64>::linspace(0.0, 1.0, 1000);

        let mut rng = SmallRng::seed_from_u64(42);
        let range = Uniform::new(0, 2);

        // randomly sample ground truth
        let ground_truth = (0..1000)
            .map(|_| rng.sample(&range) == 1)
            .collect::<Vec<_>>();

        // ROC Area-Under-Curve should be approximately 0.5
        let roc = roc_curve(&predicted, &ground_truth).unwrap();
        assert!((roc.area_under_curve() - 0.5).abs() < 0.06);
    }
}
