//! `ids-forest` provides the building blocks to train, tune and evaluate Random Forest
//! classifiers for network intrusion detection.
//!
//! The core crate holds everything shared by the algorithm crates:
//!
//! * [`Dataset`], a record matrix with one label per record and optional feature names,
//!   including a stratified train/test split
//! * the [`Fit`](traits::Fit), [`Predict`](traits::Predict) and
//!   [`PredictProba`](traits::PredictProba) traits, and [`ParamGuard`] to check hyperparameters
//!   before fitting
//! * classification [metrics]: confusion matrix, binary counts, classification report and ROC
//!   curves
//! * [validation]: stratified k-fold splitting, cross-validation scores and learning curves
//!
//! The Random Forest itself lives in `ids-forest-trees`, hyperparameter search in
//! `ids-forest-search`.

pub mod dataset;
pub mod error;
mod metrics_classification;
pub mod param_guard;
pub mod prelude;
pub mod traits;
pub mod validation;

pub use dataset::{Dataset, Float, Label};
pub use error::Error;
pub use param_guard::ParamGuard;

/// Common metrics functions for classification
pub mod metrics {
    pub use crate::metrics_classification::{
        f1_score, roc_curve, BinaryClassification, BinaryCounts, ClassificationReport,
        ConfusionMatrix, ReceiverOperatingCharacteristic, ToConfusionMatrix,
    };
}
