//! Turn a raw traffic table into a numeric dataset
//!
//! Preparation subsamples the rows, drops the identifier columns and every row with a missing
//! value, and encodes all remaining columns as numbers. Numeric columns are parsed, columns of
//! `True`/`False` become `1`/`0` and any other column is label encoded. The label column is
//! always label encoded.
use std::collections::BTreeMap;
use std::path::Path;

use ids_forest::Dataset;
use ids_forest_preprocessing::{FittedLabelEncoder, LabelEncoder};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, seq::index, SeedableRng};

use crate::error::{ReadError, Result};
use crate::table::{is_missing, read_csv, RawTable};

/// How a column is turned into numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Categorical,
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Decide the kind of a column from its non-missing cells
pub fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let present = cells.filter(|cell| !is_missing(cell)).collect::<Vec<_>>();

    if present.iter().all(|cell| cell.trim().parse::<f64>().is_ok()) {
        ColumnKind::Numeric
    } else if present.iter().all(|cell| parse_bool(cell).is_some()) {
        ColumnKind::Boolean
    } else {
        ColumnKind::Categorical
    }
}

/// Settings of the preparation step
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareConfig {
    sample_fraction: f64,
    seed: u64,
    drop_columns: Vec<String>,
    label_column: String,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        PrepareConfig {
            sample_fraction: 0.1,
            seed: 42,
            drop_columns: vec!["src".into(), "dst".into(), "Protocol".into()],
            label_column: "label".into(),
        }
    }
}

impl PrepareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of rows kept by the initial subsampling
    pub fn sample_fraction(mut self, sample_fraction: f64) -> Self {
        self.sample_fraction = sample_fraction;
        self
    }

    /// Seed of the subsampling
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Columns removed before cleaning, all of them have to be present
    pub fn drop_columns<S: Into<String>>(mut self, columns: Vec<S>) -> Self {
        self.drop_columns = columns.into_iter().map(|x| x.into()).collect();
        self
    }

    pub fn label_column<S: Into<String>>(mut self, column: S) -> Self {
        self.label_column = column.into();
        self
    }

    pub fn get_sample_fraction(&self) -> f64 {
        self.sample_fraction
    }

    pub fn get_seed(&self) -> u64 {
        self.seed
    }
}

/// Numeric dataset together with the encoders needed to decode it
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Feature matrix with named features and label codes as targets
    pub dataset: Dataset<f64, usize>,
    pub label_encoder: FittedLabelEncoder,
    /// Encoders of the label-encoded feature columns, by column name
    pub feature_encoders: BTreeMap<String, FittedLabelEncoder>,
}

impl PreparedData {
    /// Original label of every class code
    pub fn class_names(&self) -> &[String] {
        self.label_encoder.classes()
    }
}

/// Number of rows kept when sampling `fraction` of `n_rows`, rounding half to even
fn sample_size(fraction: f64, n_rows: usize) -> usize {
    (fraction * n_rows as f64).round_ties_even() as usize
}

fn encode_column(name: &str, cells: &[&str]) -> Result<(FittedLabelEncoder, Array1<usize>)> {
    LabelEncoder::new()
        .fit_transform(cells)
        .map_err(|source| ReadError::Encoding {
            column: name.to_string(),
            source,
        })
}

/// Prepare a raw table for training
///
/// Column kinds are inferred on the complete table before subsampling, so a column keeps its
/// kind no matter which rows are drawn.
pub fn prepare(table: &RawTable, config: &PrepareConfig) -> Result<PreparedData> {
    let fraction = config.sample_fraction;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(ReadError::InvalidFraction(fraction));
    }

    let label_idx = table
        .column_index(&config.label_column)
        .ok_or_else(|| ReadError::MissingColumn(config.label_column.clone()))?;
    let label_name = &table.header()[label_idx];

    let kinds = (0..table.ncols())
        .map(|idx| (table.header()[idx].clone(), infer_kind(table.column(idx))))
        .collect::<BTreeMap<_, _>>();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let n_sample = sample_size(fraction, table.nrows());
    let sampled = index::sample(&mut rng, table.nrows(), n_sample).into_vec();

    let cleaned = table
        .select_rows(&sampled)
        .drop_columns(&config.drop_columns)?
        .drop_missing();

    tracing::debug!(
        sampled = n_sample,
        remaining = cleaned.nrows(),
        "dropped identifier columns and incomplete rows"
    );

    if cleaned.nrows() == 0 {
        return Err(ReadError::Empty);
    }

    let mut feature_names = Vec::new();
    let mut columns = Vec::new();
    let mut feature_encoders = BTreeMap::new();
    let mut label = None;

    for (idx, name) in cleaned.header().iter().enumerate() {
        let cells = cleaned.column(idx).collect::<Vec<_>>();

        if name == label_name {
            label = Some(encode_column(name, &cells)?);
            continue;
        }

        let values = match kinds[name] {
            ColumnKind::Numeric => cells
                .iter()
                .map(|cell| {
                    cell.trim().parse::<f64>().map_err(|_| ReadError::Parse {
                        column: name.clone(),
                        value: cell.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            ColumnKind::Boolean => cells
                .iter()
                .map(|cell| if parse_bool(cell) == Some(true) { 1.0 } else { 0.0 })
                .collect(),
            ColumnKind::Categorical => {
                let (encoder, codes) = encode_column(name, &cells)?;
                feature_encoders.insert(name.clone(), encoder);
                codes.iter().map(|code| *code as f64).collect()
            }
        };

        feature_names.push(name.clone());
        columns.push(values);
    }

    let (label_encoder, targets) =
        label.ok_or_else(|| ReadError::MissingColumn(config.label_column.clone()))?;

    let n_rows = cleaned.nrows();
    let records = Array2::from_shape_fn((n_rows, columns.len()), |(row, col)| columns[col][row]);
    let dataset = Dataset::try_new(records, targets)?.with_feature_names(feature_names);

    tracing::info!(
        rows = dataset.nsamples(),
        features = dataset.nfeatures(),
        classes = label_encoder.n_classes(),
        "prepared dataset"
    );

    Ok(PreparedData {
        dataset,
        label_encoder,
        feature_encoders,
    })
}

/// Read a CSV file and prepare it, see [`prepare`]
pub fn load_prepared<P: AsRef<Path>>(path: P, config: &PrepareConfig) -> Result<PreparedData> {
    let table = read_csv(path)?;
    prepare(&table, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv_from;

    const TRAFFIC: &str = "src,dst,Protocol,rate,service,encrypted,label\n\
                           10.0.0.1,10.0.0.9,TCP,12.5,http,True,normal\n\
                           10.0.0.2,10.0.0.9,UDP,,dns,False,attack\n\
                           10.0.0.3,10.0.0.9,TCP,80.1,mqtt,False,attack\n\
                           10.0.0.4,10.0.0.9,TCP,3.0,http,NA,normal\n\
                           10.0.0.5,10.0.0.9,UDP,95.0,dns,True,attack\n\
                           10.0.0.6,10.0.0.9,TCP,7.25,http,False,normal\n";

    fn full() -> PrepareConfig {
        PrepareConfig::new().sample_fraction(1.0)
    }

    #[test]
    fn kinds_are_inferred() {
        assert_eq!(infer_kind(["1", "2.5", "NA"].into_iter()), ColumnKind::Numeric);
        assert_eq!(infer_kind(["True", "False", ""].into_iter()), ColumnKind::Boolean);
        assert_eq!(infer_kind(["tcp", "1"].into_iter()), ColumnKind::Categorical);
    }

    #[test]
    fn identifiers_and_missing_rows_are_removed() {
        let table = read_csv_from(TRAFFIC.as_bytes()).unwrap();
        let prepared = prepare(&table, &full()).unwrap();
        let dataset = &prepared.dataset;

        assert_eq!(dataset.nsamples(), 4);
        assert_eq!(
            dataset.feature_names(),
            vec!["rate", "service", "encrypted"]
        );
        assert!(dataset.records.iter().all(|x| x.is_finite()));
        assert_eq!(prepared.class_names(), &["attack", "normal"]);
    }

    #[test]
    fn columns_are_encoded_by_kind() {
        let table = read_csv_from(TRAFFIC.as_bytes()).unwrap();
        let prepared = prepare(&table, &full()).unwrap();

        let mut rows = prepared
            .dataset
            .records
            .rows()
            .into_iter()
            .zip(prepared.dataset.targets.iter())
            .map(|(row, target)| (row.to_vec(), *target))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.0[0].total_cmp(&b.0[0]));

        let service = &prepared.feature_encoders["service"];
        assert_eq!(service.classes(), &["dns", "http", "mqtt"]);
        assert!(!prepared.feature_encoders.contains_key("encrypted"));

        assert_eq!(rows[0], (vec![7.25, 1.0, 0.0], 1));
        assert_eq!(rows[1], (vec![12.5, 1.0, 1.0], 1));
        assert_eq!(rows[2], (vec![80.1, 2.0, 0.0], 0));
        assert_eq!(rows[3], (vec![95.0, 0.0, 1.0], 0));
    }

    #[test]
    fn sampling_rounds_half_to_even() {
        assert_eq!(sample_size(0.1, 25), 2);
        assert_eq!(sample_size(0.1, 35), 4);
        assert_eq!(sample_size(0.1, 1000), 100);
    }

    #[test]
    fn sampling_is_deterministic() {
        let header = vec!["src".to_string(), "dst".into(), "Protocol".into(), "x".into(), "label".into()];
        let rows = (0..200)
            .map(|i| {
                vec![
                    "a".to_string(),
                    "b".into(),
                    "c".into(),
                    i.to_string(),
                    (i % 2).to_string(),
                ]
            })
            .collect();
        let table = RawTable::new(header, rows);
        let config = PrepareConfig::new().seed(19);

        let a = prepare(&table, &config).unwrap();
        let b = prepare(&table, &config).unwrap();
        assert_eq!(a.dataset.nsamples(), 20);
        assert_eq!(a.dataset.records, b.dataset.records);

        let c = prepare(&table, &config.clone().seed(20)).unwrap();
        assert_ne!(a.dataset.records, c.dataset.records);
    }

    #[test]
    fn missing_required_column() {
        let table = read_csv_from("src,dst,rate,label\na,b,1,x\n".as_bytes()).unwrap();

        assert!(matches!(
            prepare(&table, &full()),
            Err(ReadError::MissingColumn(name)) if name == "Protocol"
        ));
    }

    #[test]
    fn empty_after_cleaning() {
        let table =
            read_csv_from("src,dst,Protocol,rate,label\na,b,c,NA,x\na,b,c,1,\n".as_bytes()).unwrap();

        assert!(matches!(prepare(&table, &full()), Err(ReadError::Empty)));
    }

    #[test]
    fn invalid_fraction() {
        let table = read_csv_from(TRAFFIC.as_bytes()).unwrap();

        assert!(matches!(
            prepare(&table, &PrepareConfig::new().sample_fraction(0.0)),
            Err(ReadError::InvalidFraction(_))
        ));
    }
}
