//! Error definitions for loading and preparing tables
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReadError>;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("required column {0:?} not found")]
    MissingColumn(String),
    #[error("no rows left after cleaning")]
    Empty,
    #[error("sample fraction should be in (0, 1], got {0}")]
    InvalidFraction(f64),
    #[error("value {value:?} in column {column:?} is not a number")]
    Parse { column: String, value: String },
    #[error("cannot encode column {column:?}: {source}")]
    Encoding {
        column: String,
        #[source]
        source: ids_forest_preprocessing::Error,
    },
    #[error(transparent)]
    Dataset(#[from] ids_forest::Error),
}
