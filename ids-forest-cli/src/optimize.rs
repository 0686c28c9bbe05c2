//! Hyperparameter optimization run
use std::io::{BufRead, Write};

use anyhow::Context;
use ids_forest_search::{
    baseline,
    report::{read_parameters, write_parameters},
    GridSearch, RandomizedSearch, SearchResult, SearchSpace,
};

use crate::config::{Method, OptimizeArgs};
use crate::pipeline::{self, POSITIVE_LABEL};

/// Seed of the subsampling of the capture
pub const SAMPLE_SEED: u64 = 42;
/// Seed of the train/test split
pub const SPLIT_SEED: u64 = 42;
/// Seed of the combination sampling and of every fitted forest
pub const SEARCH_SEED: u64 = 42;

/// Show the method menu and read the choice
///
/// Returns `None` for anything but `1` or `2`.
pub fn select_method<R: BufRead, W: Write>(
    mut input: R,
    output: &mut W,
) -> std::io::Result<Option<Method>> {
    writeln!(output, "\nHyperparameter optimization methods:")?;
    writeln!(output, "1. Randomized search - quick search over a wide range")?;
    writeln!(
        output,
        "2. Grid search - detailed search over a narrow range around a baseline"
    )?;
    write!(output, "Your choice (1 or 2): ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    Ok(match line.trim() {
        "1" => Some(Method::Random),
        "2" => Some(Method::Grid),
        _ => None,
    })
}

/// Search on the training partition and write the winner to the parameter file
pub fn run(args: &OptimizeArgs, method: Method) -> anyhow::Result<SearchResult> {
    let split = pipeline::load_and_split(&args.dataset, SAMPLE_SEED, SPLIT_SEED)?;

    let result = match method {
        Method::Random => {
            tracing::info!(n_iter = args.n_iter, "starting randomized search");
            RandomizedSearch::new()
                .n_iter(args.n_iter)
                .folds(args.folds)
                .seed(SEARCH_SEED)
                .forest_seed(SEARCH_SEED)
                .positive_label(POSITIVE_LABEL)
                .run(&SearchSpace::default(), &split.train)
                .context("randomized search failed")?
        }
        Method::Grid => {
            let start = match &args.baseline {
                Some(path) => read_parameters(path)
                    .with_context(|| format!("cannot read the baseline {}", path.display()))?,
                None => baseline(),
            };
            tracing::info!(baseline = %start, "starting grid search around the baseline");

            GridSearch::new()
                .folds(args.folds)
                .forest_seed(SEARCH_SEED)
                .positive_label(POSITIVE_LABEL)
                .run(&SearchSpace::refine_around(&start), &split.train)
                .context("grid search failed")?
        }
    };

    println!("\nBest parameters ({:?} search):", method);
    println!("{}", result.best_params);
    println!("Mean cross-validated F1-score: {:.4}", result.best_score);

    write_parameters(&args.output, &result.best_params)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("\nOptimization finished, parameters written to {}", args.output.display());

    Ok(result)
}
