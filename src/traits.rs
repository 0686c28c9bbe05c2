//! Provide traits for different classes of algorithms
//!

use crate::dataset::Dataset;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};

/// Transformation algorithms
///
/// A transformer takes a dataset and transforms it into a different one. It has no concept of
/// state and provides therefore no method to predict new data. A typical example are label
/// encoders which map categories to codes.
pub trait Transformer<R, T> {
    fn transform(&self, x: R) -> T;
}

/// Fittable algorithms
///
/// A fittable algorithm takes a dataset and creates a concept of some kind about it. For example
/// in a random forest the fitted object holds the grown trees, which can then be used to
/// predict the class of new records.
pub trait Fit<F, L, E: std::error::Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, dataset: &Dataset<F, L>) -> Result<Self::Object, E>;
}

/// Predict a label for every row of a record matrix
pub trait Predict<F, L> {
    fn predict<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array1<L>;
}

/// Predict class membership probabilities
///
/// The returned matrix has one row per record and one column per class seen during fitting, in
/// ascending order. Each row sums to one.
pub trait PredictProba<F> {
    fn predict_proba<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array2<F>;
}
