//! Datasets
//!
//! This module implements the dataset struct and the helper traits bounding its records and
//! targets.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast};
use rand::distributions::uniform::SampleUniform;
use rand::Rng;

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::iter::Sum;

use crate::error::{Error, Result};

mod split;
pub use split::stratified_split_indices;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the records of a dataset
/// and in predicted probabilities.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + SampleUniform
    + ScalarOperand
    + approx::AbsDiffEq
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}
impl Float for f64 {}

/// Discrete labels
///
/// Labels are countable, comparable, ordered and hashable. Class codes (`usize`), booleans and
/// strings are supported.
pub trait Label: PartialEq + Eq + Hash + Ord + Clone + fmt::Debug + Send + Sync {}

impl Label for bool {}
impl Label for usize {}
impl Label for String {}
impl Label for &str {}

/// A dataset of records with one target per record
///
/// Records are stored row-major with one sample per row. Feature names are optional; if none are
/// attached, generic names are generated on request.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<F, L> {
    pub records: Array2<F>,
    pub targets: Array1<L>,
    feature_names: Vec<String>,
}

impl<F, L> Dataset<F, L> {
    /// Create a new dataset from records and targets
    ///
    /// # Panics
    ///
    /// Panics if the number of records and targets differ. Use [`Dataset::try_new`] for a
    /// fallible version.
    pub fn new(records: Array2<F>, targets: Array1<L>) -> Self {
        assert_eq!(
            records.nrows(),
            targets.len(),
            "records and targets must have the same number of samples"
        );

        Dataset {
            records,
            targets,
            feature_names: Vec::new(),
        }
    }

    pub fn try_new(records: Array2<F>, targets: Array1<L>) -> Result<Self> {
        if records.nrows() != targets.len() {
            return Err(Error::MismatchedShapes(records.nrows(), targets.len()));
        }

        Ok(Dataset::new(records, targets))
    }

    /// Attach feature names, one per column
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> Self {
        let names = names.into_iter().map(|x| x.into()).collect::<Vec<_>>();
        assert_eq!(names.len(), self.records.ncols());

        self.feature_names = names;
        self
    }

    /// Return the feature names, generating `feature-i` when none are attached
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.ncols())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    pub fn records(&self) -> ArrayView2<F> {
        self.records.view()
    }

    pub fn targets(&self) -> ArrayView1<L> {
        self.targets.view()
    }

    pub fn nsamples(&self) -> usize {
        self.records.nrows()
    }

    pub fn nfeatures(&self) -> usize {
        self.records.ncols()
    }

    /// Map the targets into a new type, keeping records and feature names
    pub fn map_targets<T, G: FnMut(&L) -> T>(&self, fnc: G) -> Dataset<F, T>
    where
        F: Clone,
    {
        Dataset {
            records: self.records.clone(),
            targets: self.targets.map(fnc),
            feature_names: self.feature_names.clone(),
        }
    }
}

impl<F: Clone, L: Clone> Dataset<F, L> {
    /// Select a subset of samples by row index
    ///
    /// Indices may repeat, rows appear in the order of `indices`.
    pub fn select(&self, indices: &[usize]) -> Dataset<F, L> {
        Dataset {
            records: self.records.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Return the first `n` samples
    pub fn head(&self, n: usize) -> Dataset<F, L> {
        let n = n.min(self.targets.len());
        let indices = (0..n).collect::<Vec<_>>();

        self.select(&indices)
    }
}

impl<F: Clone, L: Label> Dataset<F, L> {
    /// Count the occurences of every label, sorted by label
    pub fn class_counts(&self) -> BTreeMap<L, usize> {
        let mut counts = BTreeMap::new();
        for label in self.targets.iter() {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }

        counts
    }

    /// Sorted, distinct labels present in the targets
    pub fn labels(&self) -> Vec<L> {
        self.class_counts().into_keys().collect()
    }

    /// Split into a training and a test partition, preserving class proportions
    ///
    /// The test partition holds `ceil(test_fraction * n)` samples. See
    /// [`stratified_split_indices`] for the allocation rules.
    pub fn stratified_split<R: Rng>(
        &self,
        test_fraction: f64,
        rng: &mut R,
    ) -> Result<(Dataset<F, L>, Dataset<F, L>)> {
        let labels = self.targets.to_vec();
        let (train, test) = stratified_split_indices(&labels, test_fraction, rng)?;

        Ok((self.select(&train), self.select(&test)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn dataset_accessors() {
        let dataset = Dataset::new(array![[1., 2.], [3., 4.], [5., 6.]], array![0usize, 1, 0])
            .with_feature_names(vec!["bytes", "packets"]);

        assert_eq!(dataset.nsamples(), 3);
        assert_eq!(dataset.nfeatures(), 2);
        assert_eq!(dataset.feature_names(), vec!["bytes", "packets"]);
        assert_eq!(dataset.labels(), vec![0, 1]);
        assert_eq!(dataset.class_counts()[&0], 2);
    }

    #[test]
    fn generated_feature_names() {
        let dataset = Dataset::new(Array2::<f64>::zeros((2, 3)), array![true, false]);

        assert_eq!(
            dataset.feature_names(),
            vec!["feature-0", "feature-1", "feature-2"]
        );
    }

    #[test]
    fn mismatched_lengths() {
        let res = Dataset::try_new(Array2::<f64>::zeros((2, 3)), array![1usize]);

        assert!(matches!(res, Err(Error::MismatchedShapes(2, 1))));
    }

    #[test]
    fn select_rows() {
        let dataset = Dataset::new(array![[1.], [2.], [3.]], array!["a", "b", "c"]);
        let selected = dataset.select(&[2, 0, 2]);

        assert_abs_diff_eq!(selected.records, array![[3.], [1.], [3.]]);
        assert_eq!(selected.targets, array!["c", "a", "c"]);
        assert_eq!(dataset.head(2).targets, array!["a", "b"]);
    }

    #[test]
    fn stratified_split_keeps_proportions() {
        let mut rng = SmallRng::seed_from_u64(42);
        let targets = (0..100).map(|i| i % 10 < 3).collect::<Array1<_>>();
        let records = Array2::from_shape_fn((100, 2), |(i, j)| (i * 2 + j) as f64);
        let dataset = Dataset::new(records, targets);

        let (train, test) = dataset.stratified_split(0.2, &mut rng).unwrap();

        assert_eq!(train.nsamples(), 80);
        assert_eq!(test.nsamples(), 20);
        assert_eq!(test.class_counts()[&true], 6);
        assert_eq!(train.class_counts()[&true], 24);

        // every row ends up in exactly one partition
        let mut firsts = train
            .records
            .column(0)
            .iter()
            .chain(test.records.column(0).iter())
            .map(|x| *x as usize)
            .collect::<Vec<_>>();
        firsts.sort_unstable();
        assert_eq!(firsts, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }
}
