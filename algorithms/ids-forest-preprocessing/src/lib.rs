//! # Preprocessing
//!
//! `ids-forest-preprocessing` turns categorical columns into the integer codes the tree
//! ensembles work with.
//!
//! * [`LabelEncoder`]: maps every distinct value of a column to a code in `0..k`, codes follow
//!   the sorted order of the values and can be decoded again
pub mod error;
mod label_encoding;

pub use error::{Error, Result};
pub use label_encoding::{CategoryOrder, FittedLabelEncoder, LabelEncoder};
