mod algorithm;
mod hyperparams;
mod iter;

pub use algorithm::*;
pub use hyperparams::*;
pub use iter::*;

pub(crate) use algorithm::{argmax, encode_targets};
