//! Randomized and exhaustive search over a [`SearchSpace`]
//!
//! Every candidate is scored by the F1-score of the positive class under stratified k-fold
//! cross-validation. The forest seed is the same for every candidate, so differences in score
//! come from the hyperparameters alone.
use ids_forest::dataset::Dataset;
use ids_forest::validation::{cross_val_score, f1_scorer, StratifiedKFold};
use ids_forest::{Float, ParamGuard};
use ndarray::Array1;
use rand::{rngs::StdRng, seq::index, SeedableRng};

use crate::error::{Result, SearchError};
use crate::params::HyperParameters;
use crate::space::SearchSpace;

/// A scored combination
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub params: HyperParameters,
    pub fold_scores: Array1<f64>,
    pub mean_score: f64,
    /// Population standard deviation of the fold scores
    pub std_score: f64,
}

/// Outcome of a search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best_params: HyperParameters,
    pub best_score: f64,
    /// Every evaluated candidate, in evaluation order
    pub candidates: Vec<Candidate>,
}

impl SearchResult {
    /// Pick the candidate with the highest mean score, the earliest one on ties
    fn from_candidates(candidates: Vec<Candidate>) -> Result<Self> {
        let best = candidates
            .iter()
            .fold(None, |best: Option<&Candidate>, c| match best {
                Some(b) if b.mean_score >= c.mean_score => Some(b),
                _ => Some(c),
            })
            .ok_or(SearchError::EmptySpace)?;

        Ok(SearchResult {
            best_params: best.params,
            best_score: best.mean_score,
            candidates: candidates.clone(),
        })
    }
}

/// Cross-validation settings shared by both searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scoring {
    folds: usize,
    forest_seed: u64,
    positive_label: usize,
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring {
            folds: 5,
            forest_seed: 42,
            positive_label: 1,
        }
    }
}

impl Scoring {
    fn check(&self) -> Result<()> {
        if self.folds < 2 {
            return Err(SearchError::TooFewFolds(self.folds));
        }
        Ok(())
    }

    fn evaluate<F: Float>(
        &self,
        params: HyperParameters,
        dataset: &Dataset<F, usize>,
    ) -> Result<Candidate> {
        let forest = params.to_forest_params::<F>(self.forest_seed);
        let fold_scores = cross_val_score::<_, _, _, ids_forest::Error, _>(
            &forest,
            dataset,
            &StratifiedKFold::new(self.folds),
            f1_scorer(self.positive_label),
        )?;

        let mean_score = fold_scores.mean().unwrap_or(0.0);
        let std_score = fold_scores.std(0.0);

        tracing::debug!(%params, mean_score, std_score, "candidate scored");

        Ok(Candidate {
            params,
            fold_scores,
            mean_score,
            std_score,
        })
    }

    fn evaluate_all<F: Float>(
        &self,
        combinations: Vec<HyperParameters>,
        dataset: &Dataset<F, usize>,
    ) -> Result<SearchResult> {
        tracing::info!(
            candidates = combinations.len(),
            folds = self.folds,
            fits = combinations.len() * self.folds,
            "fitting {} folds for each of {} candidates",
            self.folds,
            combinations.len()
        );

        let candidates = combinations
            .into_iter()
            .map(|params| self.evaluate(params, dataset))
            .collect::<Result<Vec<_>>>()?;

        let result = SearchResult::from_candidates(candidates)?;
        tracing::info!(
            best_score = result.best_score,
            best = %result.best_params,
            "search finished"
        );

        Ok(result)
    }
}

/// Evaluate a uniform sample of combinations drawn without replacement
///
/// ```rust
/// use ids_forest::Dataset;
/// use ids_forest_search::{HyperParameters, RandomizedSearch, SearchSpace};
/// use ndarray::{Array1, Array2};
///
/// let records = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
/// let targets = Array1::from_shape_fn(40, |i| usize::from(i >= 20));
/// let dataset = Dataset::new(records, targets);
///
/// let params = HyperParameters { n_estimators: 5, ..Default::default() };
/// let result = RandomizedSearch::new()
///     .run(&SearchSpace::single(&params), &dataset)
///     .unwrap();
///
/// assert_eq!(result.best_params, params);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomizedSearch {
    n_iter: usize,
    seed: u64,
    scoring: Scoring,
}

impl Default for RandomizedSearch {
    fn default() -> Self {
        RandomizedSearch {
            n_iter: 50,
            seed: 42,
            scoring: Scoring::default(),
        }
    }
}

impl RandomizedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sampled combinations, capped at the size of the space and at least one
    pub fn n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Number of cross-validation folds
    pub fn folds(mut self, folds: usize) -> Self {
        self.scoring.folds = folds;
        self
    }

    /// Seed of the combination sampling
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seed of every fitted forest
    pub fn forest_seed(mut self, forest_seed: u64) -> Self {
        self.scoring.forest_seed = forest_seed;
        self
    }

    /// Label whose F1-score is maximized
    pub fn positive_label(mut self, positive_label: usize) -> Self {
        self.scoring.positive_label = positive_label;
        self
    }

    pub fn run<F: Float>(
        &self,
        space: &SearchSpace,
        dataset: &Dataset<F, usize>,
    ) -> Result<SearchResult> {
        self.check_ref()?;
        if space.is_empty() {
            return Err(SearchError::EmptySpace);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let amount = self.n_iter.min(space.len());
        let combinations = index::sample(&mut rng, space.len(), amount)
            .into_iter()
            .filter_map(|idx| space.get(idx))
            .collect();

        self.scoring.evaluate_all(combinations, dataset)
    }
}

impl ParamGuard for RandomizedSearch {
    type Checked = RandomizedSearch;
    type Error = SearchError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.n_iter == 0 {
            return Err(SearchError::NoIterations);
        }
        self.scoring.check()?;
        Ok(self)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self)
    }
}

/// Evaluate every combination of a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSearch {
    scoring: Scoring,
}

impl GridSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cross-validation folds
    pub fn folds(mut self, folds: usize) -> Self {
        self.scoring.folds = folds;
        self
    }

    /// Seed of every fitted forest
    pub fn forest_seed(mut self, forest_seed: u64) -> Self {
        self.scoring.forest_seed = forest_seed;
        self
    }

    /// Label whose F1-score is maximized
    pub fn positive_label(mut self, positive_label: usize) -> Self {
        self.scoring.positive_label = positive_label;
        self
    }

    pub fn run<F: Float>(
        &self,
        space: &SearchSpace,
        dataset: &Dataset<F, usize>,
    ) -> Result<SearchResult> {
        self.check_ref()?;
        if space.is_empty() {
            return Err(SearchError::EmptySpace);
        }

        self.scoring.evaluate_all(space.iter().collect(), dataset)
    }
}

impl ParamGuard for GridSearch {
    type Checked = GridSearch;
    type Error = SearchError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        self.scoring.check()?;
        Ok(self)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self)
    }
}
