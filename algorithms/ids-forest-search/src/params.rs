use std::fmt;

use ids_forest::Float;
use ids_forest_trees::{
    ClassWeight, MaxFeatures, RandomForestClassifier, RandomForestParams, SplitQuality,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A value of a hyperparameter as written in the parameter file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(usize),
    Bool(bool),
    Str(&'static str),
    None,
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Int(x) => write!(f, "{}", x),
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::Str(x) => write!(f, "'{}'", x),
            ParamValue::None => write!(f, "None"),
        }
    }
}

pub(crate) fn criterion_name(criterion: SplitQuality) -> &'static str {
    match criterion {
        SplitQuality::Gini => "gini",
        SplitQuality::Entropy => "entropy",
    }
}

pub(crate) fn max_features_value(max_features: MaxFeatures) -> ParamValue {
    match max_features {
        MaxFeatures::Sqrt => ParamValue::Str("sqrt"),
        MaxFeatures::Log2 => ParamValue::Str("log2"),
        MaxFeatures::All => ParamValue::None,
    }
}

/// One combination of random forest hyperparameters
///
/// The default holds the usual library defaults: 100 unbounded trees grown with Gini impurity,
/// `sqrt` candidate features, bootstrapping and no class weights.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HyperParameters {
    pub bootstrap: bool,
    pub class_weight: Option<ClassWeight>,
    pub criterion: SplitQuality,
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    pub n_estimators: usize,
}

impl Default for HyperParameters {
    fn default() -> Self {
        HyperParameters {
            bootstrap: true,
            class_weight: None,
            criterion: SplitQuality::Gini,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            min_samples_leaf: 1,
            min_samples_split: 2,
            n_estimators: 100,
        }
    }
}

impl HyperParameters {
    /// Name and value of every hyperparameter, sorted by name
    pub fn entries(&self) -> Vec<(&'static str, ParamValue)> {
        vec![
            ("bootstrap", ParamValue::Bool(self.bootstrap)),
            (
                "class_weight",
                match self.class_weight {
                    Some(ClassWeight::Balanced) => ParamValue::Str("balanced"),
                    None => ParamValue::None,
                },
            ),
            ("criterion", ParamValue::Str(criterion_name(self.criterion))),
            (
                "max_depth",
                self.max_depth.map_or(ParamValue::None, ParamValue::Int),
            ),
            ("max_features", max_features_value(self.max_features)),
            ("min_samples_leaf", ParamValue::Int(self.min_samples_leaf)),
            ("min_samples_split", ParamValue::Int(self.min_samples_split)),
            ("n_estimators", ParamValue::Int(self.n_estimators)),
        ]
    }

    /// Unchecked forest hyperparameters, trees seeded from `seed`
    pub fn to_forest_params<F: Float>(&self, seed: u64) -> RandomForestParams<F> {
        RandomForestClassifier::params()
            .n_estimators(self.n_estimators)
            .split_quality(self.criterion)
            .max_depth(self.max_depth)
            .min_samples_split(self.min_samples_split)
            .min_samples_leaf(self.min_samples_leaf)
            .max_features(self.max_features)
            .bootstrap(self.bootstrap)
            .class_weight(self.class_weight)
            .seed(seed)
    }
}

/// Prints `name=value` pairs in alphabetical order
impl fmt::Display for HyperParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries = self
            .entries()
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>();

        write!(f, "{{{}}}", entries.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ids_forest::ParamGuard;

    #[test]
    fn parameter_file_literals() {
        assert_eq!(ParamValue::Int(25).to_string(), "25");
        assert_eq!(ParamValue::Bool(true).to_string(), "True");
        assert_eq!(ParamValue::Str("log2").to_string(), "'log2'");
        assert_eq!(ParamValue::None.to_string(), "None");
    }

    #[test]
    fn entries_are_sorted() {
        let params = HyperParameters::default();
        let names = params.entries().iter().map(|x| x.0).collect::<Vec<_>>();

        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(
            params.to_string(),
            "{bootstrap=True, class_weight=None, criterion='gini', max_depth=None, \
             max_features='sqrt', min_samples_leaf=1, min_samples_split=2, n_estimators=100}"
        );
    }

    #[test]
    fn forest_params_carry_every_value() {
        let params = HyperParameters {
            bootstrap: false,
            class_weight: Some(ClassWeight::Balanced),
            criterion: SplitQuality::Entropy,
            max_depth: Some(25),
            max_features: MaxFeatures::Log2,
            min_samples_leaf: 2,
            min_samples_split: 10,
            n_estimators: 350,
        };

        let forest = params.to_forest_params::<f64>(42).check().unwrap();
        let tree = forest.tree_params();

        assert_eq!(forest.n_estimators(), 350);
        assert!(!forest.bootstrap());
        assert_eq!(forest.class_weight(), Some(ClassWeight::Balanced));
        assert_eq!(forest.seed(), 42);
        assert_eq!(tree.split_quality(), SplitQuality::Entropy);
        assert_eq!(tree.max_depth(), Some(25));
        assert_eq!(tree.max_features(), MaxFeatures::Log2);
        assert_eq!(tree.min_samples_leaf(), 2);
        assert_eq!(tree.min_samples_split(), 10);
    }
}
