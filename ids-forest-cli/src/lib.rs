//! Command line front end of `ids-forest`
//!
//! Two binaries share this library:
//!
//! * `optimize_parameters` tunes the forest with a randomized or a grid search and writes the
//!   best parameters to a parameter file, see [`optimize`]
//! * `train_and_evaluate` trains a forest with fixed or previously tuned parameters, prints the
//!   test metrics, cross-validates and draws the evaluation charts, see [`evaluate`]
//!
//! Both read an IoT traffic capture, subsample and clean it with `ids-forest-datasets` and
//! split it 80/20 with stratification before any fitting happens.

pub mod config;
pub mod evaluate;
pub mod logging;
pub mod optimize;
pub mod pipeline;
pub mod plots;
