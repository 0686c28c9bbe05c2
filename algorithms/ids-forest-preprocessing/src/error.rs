//! Error definitions for preprocessing
use thiserror::Error;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("cannot fit an encoder without values")]
    EmptyInput,
    #[error("value {0:?} was not seen while fitting the encoder")]
    UnknownLabel(String),
    #[error("code {0} is out of range for {1} classes")]
    UnknownCode(usize, usize),
}
