//! Training and evaluation run
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use ids_forest::metrics::{roc_curve, BinaryCounts, ClassificationReport, ToConfusionMatrix};
use ids_forest::traits::{Fit, Predict, PredictProba};
use ids_forest::validation::{
    cross_val_score, f1_scorer, learning_curve, LearningCurve, StratifiedKFold,
};
use ids_forest::ParamGuard;
use ids_forest_search::{report::read_parameters, HyperParameters};
use ids_forest_trees::{ClassWeight, MaxFeatures, SplitQuality};
use ndarray::Array1;

use crate::config::EvaluateArgs;
use crate::pipeline::{self, class_counts, POSITIVE_LABEL};
use crate::plots::{self, PlotResult};

/// Seed of the subsampling of the capture
pub const SAMPLE_SEED: u64 = 19;
/// Seed of the train/test split
pub const SPLIT_SEED: u64 = 13;
/// Seed of the trained forest
pub const FOREST_SEED: u64 = 42;

/// Parameters found by a previous optimization, used when no parameter file is given
pub fn fixed_parameters() -> HyperParameters {
    HyperParameters {
        bootstrap: true,
        class_weight: Some(ClassWeight::Balanced),
        criterion: SplitQuality::Entropy,
        max_depth: Some(25),
        max_features: MaxFeatures::Sqrt,
        min_samples_leaf: 1,
        min_samples_split: 10,
        n_estimators: 350,
    }
}

/// Everything measured by one evaluation run
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub params: HyperParameters,
    pub report: ClassificationReport,
    /// Counts of the test predictions with attacks as the positive class
    pub counts: BinaryCounts,
    pub auc: f64,
    /// F1-score of every fold, cross-validated on the whole prepared capture
    pub cv_scores: Array1<f64>,
    /// Missing if the learning curve could not be computed
    pub learning_curve: Option<LearningCurve>,
    /// Charts written to the results directory
    pub charts: Vec<PathBuf>,
}

fn save_chart<D>(dir: &Path, name: &str, draw: D) -> anyhow::Result<PathBuf>
where
    D: FnOnce(&Path) -> PlotResult,
{
    let path = dir.join(name);
    draw(&path)
        .map_err(|err| anyhow!(err))
        .with_context(|| format!("cannot draw {}", path.display()))?;

    tracing::debug!(path = %path.display(), "chart written");
    Ok(path)
}

/// Train on the training partition, evaluate on the test partition and draw the charts
pub fn run(args: &EvaluateArgs) -> anyhow::Result<Evaluation> {
    let params = match &args.params {
        Some(path) => read_parameters(path)
            .with_context(|| format!("cannot read the parameters {}", path.display()))?,
        None => fixed_parameters(),
    };
    tracing::info!(%params, "training parameters");

    let split = pipeline::load_and_split(&args.dataset, SAMPLE_SEED, SPLIT_SEED)?;
    let encoder = &split.prepared.label_encoder;
    let n_classes = encoder.n_classes();

    println!("Train/test split finished.");
    println!("Training class counts: {:?}", class_counts(&split.train, n_classes));
    println!("Test class counts: {:?}", class_counts(&split.test, n_classes));

    let forest_params = params
        .to_forest_params::<f64>(FOREST_SEED)
        .check()
        .context("invalid training parameters")?;
    let forest = forest_params
        .fit(&split.train)
        .context("cannot train the forest")?;

    let positive = match forest.classes().iter().position(|c| *c == POSITIVE_LABEL) {
        Some(column) => column,
        None => bail!("the training partition holds no sample of the attack class"),
    };
    let prediction = forest.predict(&split.test.records);
    let scores = forest
        .predict_proba(&split.test.records)
        .column(positive)
        .to_owned();

    let cm = prediction.confusion_matrix(&split.test.targets)?;
    let target_names = cm
        .classes()
        .iter()
        .map(|code| encoder.decode(*code).map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;
    let report = ClassificationReport::new(&cm).with_target_names(target_names.clone())?;
    println!("\nClassification report:\n{}", report);

    let counts =
        BinaryCounts::from_predictions(&prediction, &split.test.targets, &POSITIVE_LABEL)?;
    println!("- Precision     : {:.4}", counts.precision());
    println!("- Recall        : {:.4}", counts.recall());
    println!("- Specificity   : {:.4}", counts.specificity());

    let truth = split
        .test
        .targets
        .iter()
        .map(|target| *target == POSITIVE_LABEL)
        .collect::<Vec<_>>();
    let roc = roc_curve(&scores, &truth).context("cannot compute the ROC curve")?;
    let auc = roc.area_under_curve();
    println!("- ROC AUC       : {:.4}", auc);

    let dir = &args.results_dir;
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let feature_names = split.full().feature_names();
    let importances = forest.feature_importances().to_vec();
    let class_names = encoder.classes().to_vec();
    let distribution = class_counts(split.full(), n_classes);

    let mut charts = vec![
        save_chart(dir, plots::CONFUSION_MATRIX, |path| {
            plots::confusion_matrix(path, &cm, &target_names)
        })?,
        save_chart(dir, plots::ROC_CURVE, |path| plots::roc_curve(path, &roc))?,
        save_chart(dir, plots::FEATURE_IMPORTANCE, |path| {
            plots::feature_importance(path, &feature_names, &importances)
        })?,
        save_chart(dir, plots::CLASS_DISTRIBUTION, |path| {
            plots::class_distribution(path, &class_names, &distribution)
        })?,
    ];
    println!("\nCharts written:");
    for chart in &charts {
        println!("- {}", chart.display());
    }

    let folds = StratifiedKFold::new(args.folds);
    let cv_scores = cross_val_score::<_, _, _, ids_forest::Error, _>(
        &forest_params,
        split.full(),
        &folds,
        f1_scorer(POSITIVE_LABEL),
    )
    .context("cross-validation failed")?;
    println!("\nCross-validated F1-scores: {}", cv_scores);
    println!(
        "Mean: {:.4}, Std: {:.4}",
        cv_scores.mean().unwrap_or(0.0),
        cv_scores.std(0.0)
    );

    let fractions = Array1::linspace(0.1, 1.0, 10).to_vec();
    let curve = learning_curve::<_, _, _, ids_forest::Error, _>(
        &forest_params,
        split.full(),
        &folds,
        &fractions,
        f1_scorer(POSITIVE_LABEL),
    )
    .map_err(anyhow::Error::from)
    .and_then(|curve| {
        let path = save_chart(dir, plots::LEARNING_CURVE, |path| {
            plots::learning_curve(path, &curve)
        })?;
        Ok((curve, path))
    });

    let learning_curve = match curve {
        Ok((curve, path)) => {
            println!("- {}", path.display());
            charts.push(path);
            Some(curve)
        }
        Err(err) => {
            tracing::error!("learning curve could not be drawn: {:#}", err);
            None
        }
    };

    Ok(Evaluation {
        params,
        report,
        counts,
        auc,
        cv_scores,
        learning_curve,
        charts,
    })
}
