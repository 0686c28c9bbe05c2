//! Discrete hyperparameter spaces
use ids_forest_trees::{ClassWeight, MaxFeatures, SplitQuality};

use crate::params::HyperParameters;

/// Explicit candidate values for every hyperparameter
///
/// Combinations are numbered in mixed radix over the parameter names in reverse alphabetical
/// order, so `n_estimators` varies fastest and `bootstrap` slowest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpace {
    pub bootstrap: Vec<bool>,
    pub class_weight: Vec<Option<ClassWeight>>,
    pub criterion: Vec<SplitQuality>,
    pub max_depth: Vec<Option<usize>>,
    pub max_features: Vec<MaxFeatures>,
    pub min_samples_leaf: Vec<usize>,
    pub min_samples_split: Vec<usize>,
    pub n_estimators: Vec<usize>,
}

/// The wide space explored by the randomized search
impl Default for SearchSpace {
    fn default() -> Self {
        SearchSpace {
            bootstrap: vec![true],
            class_weight: vec![Some(ClassWeight::Balanced)],
            criterion: vec![SplitQuality::Gini, SplitQuality::Entropy],
            max_depth: vec![Some(10), Some(15), Some(20), Some(25), Some(30), None],
            max_features: vec![MaxFeatures::Sqrt, MaxFeatures::Log2],
            min_samples_leaf: vec![1, 2, 4],
            min_samples_split: vec![2, 5, 10, 16],
            n_estimators: vec![100, 200, 300, 400, 500],
        }
    }
}

impl SearchSpace {
    /// Space holding exactly one combination
    pub fn single(params: &HyperParameters) -> Self {
        SearchSpace {
            bootstrap: vec![params.bootstrap],
            class_weight: vec![params.class_weight],
            criterion: vec![params.criterion],
            max_depth: vec![params.max_depth],
            max_features: vec![params.max_features],
            min_samples_leaf: vec![params.min_samples_leaf],
            min_samples_split: vec![params.min_samples_split],
            n_estimators: vec![params.n_estimators],
        }
    }

    /// Narrow grid around a baseline
    ///
    /// Varies `n_estimators` by 50 in both directions, and tries a larger `min_samples_split`
    /// (+4) and `min_samples_leaf` (+1). Tree counts below one are left out, every other value is
    /// taken from the baseline.
    pub fn refine_around(baseline: &HyperParameters) -> Self {
        let n = baseline.n_estimators;
        let n_estimators = [n.checked_sub(50), Some(n), Some(n + 50)]
            .into_iter()
            .flatten()
            .filter(|x| *x >= 1)
            .collect();

        SearchSpace {
            n_estimators,
            min_samples_split: vec![baseline.min_samples_split, baseline.min_samples_split + 4],
            min_samples_leaf: vec![baseline.min_samples_leaf, baseline.min_samples_leaf + 1],
            ..SearchSpace::single(baseline)
        }
    }

    fn radices(&self) -> [usize; 8] {
        [
            self.n_estimators.len(),
            self.min_samples_split.len(),
            self.min_samples_leaf.len(),
            self.max_features.len(),
            self.max_depth.len(),
            self.criterion.len(),
            self.class_weight.len(),
            self.bootstrap.len(),
        ]
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        self.radices().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a combination number, `None` if it is out of range
    pub fn get(&self, index: usize) -> Option<HyperParameters> {
        if index >= self.len() {
            return None;
        }

        let mut digits = [0usize; 8];
        let mut rest = index;
        for (digit, radix) in digits.iter_mut().zip(self.radices()) {
            *digit = rest % radix;
            rest /= radix;
        }

        Some(HyperParameters {
            n_estimators: self.n_estimators[digits[0]],
            min_samples_split: self.min_samples_split[digits[1]],
            min_samples_leaf: self.min_samples_leaf[digits[2]],
            max_features: self.max_features[digits[3]],
            max_depth: self.max_depth[digits[4]],
            criterion: self.criterion[digits[5]],
            class_weight: self.class_weight[digits[6]],
            bootstrap: self.bootstrap[digits[7]],
        })
    }

    /// Iterate over every combination in numbering order
    pub fn iter(&self) -> impl Iterator<Item = HyperParameters> + '_ {
        (0..self.len()).filter_map(move |idx| self.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> HyperParameters {
        HyperParameters {
            bootstrap: true,
            class_weight: Some(ClassWeight::Balanced),
            criterion: SplitQuality::Entropy,
            max_depth: Some(20),
            max_features: MaxFeatures::Log2,
            min_samples_leaf: 1,
            min_samples_split: 2,
            n_estimators: 400,
        }
    }

    #[test]
    fn default_space_size() {
        assert_eq!(SearchSpace::default().len(), 5 * 6 * 4 * 3 * 2 * 2);
    }

    #[test]
    fn n_estimators_varies_fastest() {
        let space = SearchSpace::default();

        let first = space.get(0).unwrap();
        let second = space.get(1).unwrap();
        assert_eq!(first.n_estimators, 100);
        assert_eq!(second.n_estimators, 200);
        assert_eq!(second.min_samples_split, first.min_samples_split);

        let wrapped = space.get(5).unwrap();
        assert_eq!(wrapped.n_estimators, 100);
        assert_eq!(wrapped.min_samples_split, 5);

        let last = space.get(space.len() - 1).unwrap();
        assert_eq!(last.criterion, SplitQuality::Entropy);
        assert_eq!(last.max_depth, None);
        assert!(space.get(space.len()).is_none());
    }

    #[test]
    fn iteration_visits_distinct_combinations() {
        let space = SearchSpace::refine_around(&baseline());
        let mut all = space.iter().collect::<Vec<_>>();
        assert_eq!(all.len(), 12);

        all.sort_by_key(|p| (p.n_estimators, p.min_samples_split, p.min_samples_leaf));
        all.dedup();
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn refinement_around_baseline() {
        let space = SearchSpace::refine_around(&baseline());

        assert_eq!(space.n_estimators, vec![350, 400, 450]);
        assert_eq!(space.max_depth, vec![Some(20)]);
        assert_eq!(space.min_samples_split, vec![2, 6]);
        assert_eq!(space.min_samples_leaf, vec![1, 2]);
        assert_eq!(space.max_features, vec![MaxFeatures::Log2]);
        assert_eq!(space.criterion, vec![SplitQuality::Entropy]);
    }

    #[test]
    fn refinement_keeps_unbounded_depth() {
        let params = HyperParameters {
            max_depth: None,
            ..baseline()
        };

        assert_eq!(SearchSpace::refine_around(&params).max_depth, vec![None]);
    }

    #[test]
    fn refinement_drops_empty_forests() {
        let params = HyperParameters {
            n_estimators: 30,
            ..baseline()
        };
        assert_eq!(SearchSpace::refine_around(&params).n_estimators, vec![30, 80]);

        let params = HyperParameters {
            n_estimators: 50,
            ..baseline()
        };
        assert_eq!(SearchSpace::refine_around(&params).n_estimators, vec![50, 100]);
    }

    #[test]
    fn single_combination() {
        let space = SearchSpace::single(&baseline());

        assert_eq!(space.len(), 1);
        assert_eq!(space.get(0), Some(baseline()));
    }
}
