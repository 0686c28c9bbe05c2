//! Command line configuration of the two binaries
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Capture used when `--dataset` is not given
pub const DEFAULT_DATASET: &str = "./IoT-DH Dataset/Dataset/dataset.csv";
/// Parameter file written by the optimization
pub const DEFAULT_PARAMETER_FILE: &str = "optimize_rf_parametreleri.txt";
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Search strategy of the optimization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Uniform sample of the wide search space
    Random,
    /// Every combination around a baseline
    Grid,
}

/// Tune Random Forest hyperparameters on an IoT traffic capture
#[derive(Debug, Clone, Parser)]
#[command(name = "optimize_parameters", version, long_about = None)]
pub struct OptimizeArgs {
    /// CSV capture, optionally gzip compressed
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: PathBuf,

    /// Where the best parameters are written
    #[arg(short, long, default_value = DEFAULT_PARAMETER_FILE)]
    pub output: PathBuf,

    /// Search strategy, asked interactively when missing
    #[arg(short, long, value_enum)]
    pub method: Option<Method>,

    /// Parameter file used as the grid search baseline instead of the built-in one
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Number of combinations sampled by the randomized search
    #[arg(long, default_value_t = 50)]
    pub n_iter: usize,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Log every candidate and fold
    #[arg(short, long)]
    pub verbose: bool,
}

/// Train a Random Forest on an IoT traffic capture and evaluate it
#[derive(Debug, Clone, Parser)]
#[command(name = "train_and_evaluate", version, long_about = None)]
pub struct EvaluateArgs {
    /// CSV capture, optionally gzip compressed
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: PathBuf,

    /// Parameter file to train with instead of the built-in parameters
    #[arg(short, long)]
    pub params: Option<PathBuf>,

    /// Directory receiving the charts
    #[arg(short, long, default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Log every fold and learning curve point
    #[arg(short, long)]
    pub verbose: bool,
}
