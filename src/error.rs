//! Error types in ids-forest
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("mismatched number of samples: {0} records but {1} targets")]
    MismatchedShapes(usize, usize),
    #[error("not enough samples: {0}")]
    NotEnoughSamples(String),
    #[error("curve requires both positive and negative samples")]
    SingleClass,
}
