//! Stages shared by both binaries: load, clean, encode and split
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use ids_forest::Dataset;
use ids_forest_datasets::{load_prepared, PrepareConfig, PreparedData};
use rand::{rngs::StdRng, SeedableRng};

/// Share of the prepared rows held out for testing
pub const TEST_FRACTION: f64 = 0.2;
/// Label code of the attack class, the positive class of every score
pub const POSITIVE_LABEL: usize = 1;

/// Prepared capture with its stratified train/test partition
#[derive(Debug, Clone)]
pub struct SplitData {
    pub prepared: PreparedData,
    pub train: Dataset<f64, usize>,
    pub test: Dataset<f64, usize>,
}

impl SplitData {
    /// Every prepared row, before splitting
    pub fn full(&self) -> &Dataset<f64, usize> {
        &self.prepared.dataset
    }
}

/// Read and prepare the capture at `path`, then split it
///
/// `sample_seed` drives the subsampling of the capture and `split_seed` the stratified split.
pub fn load_and_split(
    path: &Path,
    sample_seed: u64,
    split_seed: u64,
) -> anyhow::Result<SplitData> {
    let config = PrepareConfig::new().seed(sample_seed);
    let prepared = load_prepared(path, &config)
        .with_context(|| format!("cannot prepare the capture {}", path.display()))?;

    let (train, test) = prepared
        .dataset
        .stratified_split(TEST_FRACTION, &mut StdRng::seed_from_u64(split_seed))
        .context("cannot split the prepared capture")?;

    tracing::info!(
        train = train.nsamples(),
        test = test.nsamples(),
        "train/test split finished"
    );

    Ok(SplitData {
        prepared,
        train,
        test,
    })
}

/// Number of samples of every class code, zero for codes absent from the dataset
pub fn class_counts(dataset: &Dataset<f64, usize>, n_classes: usize) -> Vec<usize> {
    let counts: BTreeMap<usize, usize> = dataset.class_counts();
    (0..n_classes)
        .map(|code| counts.get(&code).copied().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn absent_classes_count_zero() {
        let dataset = Dataset::new(Array2::zeros((3, 1)), array![0usize, 2, 2]);

        assert_eq!(class_counts(&dataset, 3), vec![1, 0, 2]);
        assert_eq!(class_counts(&dataset, 4), vec![1, 0, 2, 0]);
    }

    #[test]
    fn missing_capture() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_and_split(&dir.path().join("absent.csv"), 42, 42).unwrap_err();

        assert!(err.to_string().contains("cannot prepare the capture"));
    }
}
