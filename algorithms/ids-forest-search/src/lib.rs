//! Hyperparameter search for Random Forest intrusion detectors
//!
//! ## The Big Picture
//!
//! A [`SearchSpace`] lists candidate values for every hyperparameter of a
//! [`RandomForestClassifier`](ids_forest_trees::RandomForestClassifier). [`RandomizedSearch`]
//! scores a uniform sample of its combinations, [`GridSearch`] scores all of them, in both cases
//! by the mean F1-score of the attack class under stratified k-fold cross-validation. The winning
//! [`HyperParameters`] are stored in a parameter file with [`report::write_parameters`] and read
//! back with [`report::read_parameters`].
//!
//! ## Example
//!
//! ```ignore
//! let wide = RandomizedSearch::new().n_iter(50).run(&SearchSpace::default(), &train)?;
//! let narrow = GridSearch::new().run(&SearchSpace::refine_around(&wide.best_params), &train)?;
//! report::write_parameters("optimize_rf_parametreleri.txt", &narrow.best_params)?;
//! ```

pub mod error;
mod params;
pub mod report;
mod search;
mod space;

pub use error::{Result, SearchError};
pub use params::{HyperParameters, ParamValue};
pub use search::{Candidate, GridSearch, RandomizedSearch, SearchResult};
pub use space::SearchSpace;

/// Hand-tuned starting point of the grid refinement
pub fn baseline() -> HyperParameters {
    use ids_forest_trees::{ClassWeight, MaxFeatures, SplitQuality};

    HyperParameters {
        bootstrap: true,
        class_weight: Some(ClassWeight::Balanced),
        criterion: SplitQuality::Entropy,
        max_depth: Some(20),
        max_features: MaxFeatures::Log2,
        min_samples_leaf: 1,
        min_samples_split: 2,
        n_estimators: 400,
    }
}
