//! Error definitions for hyperparameter search
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("the search space holds no combination")]
    EmptySpace,
    #[error("at least one combination has to be sampled")]
    NoIterations,
    #[error("cross-validation needs at least two folds, got {0}")]
    TooFewFolds(usize),
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed parameter file, line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error(transparent)]
    Fit(#[from] ids_forest::Error),
}
