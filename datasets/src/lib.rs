//! `ids-forest-datasets` loads IoT network traffic captures and prepares them for training.
//!
//! ## The Big Picture
//!
//! Captures come as delimited text files, optionally gzip compressed, with identifier columns,
//! numeric flow statistics, categorical columns and a string label. Preparation turns them into
//! an [`ids_forest::Dataset`] with named features and label codes, keeping the encoders needed
//! to decode the codes again.
//!
//! ## Current State
//!
//! * [`read_csv`] and [`write_csv`]: plain or `.gz` CSV files as [`RawTable`]s
//! * [`prepare`] and [`load_prepared`]: subsampling, cleaning and encoding
//! * [`generate::intrusion_traffic`]: synthetic captures for tests and demos
//!
//! ## Using a capture
//!
//! ```ignore
//! let config = PrepareConfig::new().seed(19);
//! let prepared = ids_forest_datasets::load_prepared("dataset.csv", &config)?;
//! let (train, test) = prepared.dataset.stratified_split(0.2, &mut rng)?;
//! ```

pub mod error;
pub mod generate;
mod prepare;
mod table;

pub use error::{ReadError, Result};
pub use prepare::{infer_kind, load_prepared, prepare, ColumnKind, PrepareConfig, PreparedData};
pub use table::{is_missing, read_csv, read_csv_from, write_csv, RawTable, NA_VALUES};
