//! Parameter files
//!
//! The best hyperparameters of a search are stored as a constructor call that can be pasted into
//! a training script:
//!
//! ```text
//! # Best Random Forest parameters found by hyperparameter optimization
//! # These parameters can be passed to the training pipeline
//!
//! RandomForestClassifier(
//!     bootstrap=True,
//!     ...
//!     n_estimators=400,
//!     random_state=42,
//!     n_jobs=-1
//! )
//! ```
use std::fs;
use std::path::Path;

use ids_forest_trees::{ClassWeight, MaxFeatures, SplitQuality};

use crate::error::{Result, SearchError};
use crate::params::HyperParameters;

const HEADER: &str = "# Best Random Forest parameters found by hyperparameter optimization\n\
                      # These parameters can be passed to the training pipeline\n";
const CONSTRUCTOR: &str = "RandomForestClassifier(";

/// Render the parameter file for `params`
pub fn render_parameters(params: &HyperParameters) -> String {
    let mut out = format!("{}\n{}\n", HEADER, CONSTRUCTOR);
    for (name, value) in params.entries() {
        out.push_str(&format!("    {}={},\n", name, value));
    }
    out.push_str("    random_state=42,\n    n_jobs=-1\n)\n");

    out
}

/// Write the parameter file for `params` to `path`, replacing any existing file
pub fn write_parameters<P: AsRef<Path>>(path: P, params: &HyperParameters) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, render_parameters(params)).map_err(|source| SearchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), "wrote parameter file");
    Ok(())
}

/// A literal on the right hand side of `name=value`
#[derive(Debug, PartialEq)]
enum Literal<'a> {
    Int(i64),
    Bool(bool),
    Str(&'a str),
    None,
}

fn parse_literal(text: &str) -> Option<Literal<'_>> {
    let quoted = |q: char| {
        text.strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
            .map(Literal::Str)
    };

    match text {
        "True" => Some(Literal::Bool(true)),
        "False" => Some(Literal::Bool(false)),
        "None" => Some(Literal::None),
        _ => quoted('\'')
            .or_else(|| quoted('"'))
            .or_else(|| text.parse().ok().map(Literal::Int)),
    }
}

fn count(literal: &Literal) -> Option<usize> {
    match literal {
        Literal::Int(x) => usize::try_from(*x).ok(),
        _ => None,
    }
}

fn assign(
    params: &mut HyperParameters,
    name: &str,
    literal: &Literal,
) -> std::result::Result<(), String> {
    let invalid = || format!("invalid value {:?} for {}", literal, name);

    match name {
        "bootstrap" => match literal {
            Literal::Bool(x) => params.bootstrap = *x,
            _ => return Err(invalid()),
        },
        "class_weight" => {
            params.class_weight = match literal {
                Literal::Str("balanced") => Some(ClassWeight::Balanced),
                Literal::None => None,
                _ => return Err(invalid()),
            }
        }
        "criterion" => {
            params.criterion = match literal {
                Literal::Str("gini") => SplitQuality::Gini,
                Literal::Str("entropy") => SplitQuality::Entropy,
                _ => return Err(invalid()),
            }
        }
        "max_depth" => {
            params.max_depth = match literal {
                Literal::None => None,
                other => Some(count(other).ok_or_else(invalid)?),
            }
        }
        "max_features" => {
            params.max_features = match literal {
                Literal::Str("sqrt") => MaxFeatures::Sqrt,
                Literal::Str("log2") => MaxFeatures::Log2,
                Literal::None => MaxFeatures::All,
                _ => return Err(invalid()),
            }
        }
        "min_samples_leaf" => params.min_samples_leaf = count(literal).ok_or_else(invalid)?,
        "min_samples_split" => params.min_samples_split = count(literal).ok_or_else(invalid)?,
        "n_estimators" => params.n_estimators = count(literal).ok_or_else(invalid)?,
        // run settings, not hyperparameters
        "random_state" | "n_jobs" => {}
        _ => return Err(format!("unknown parameter {}", name)),
    }

    Ok(())
}

/// Parse the contents of a parameter file
///
/// Parameters missing from the file keep their default value.
pub fn parse_parameters(text: &str) -> Result<HyperParameters> {
    let mut params = HyperParameters::default();
    let mut opened = false;
    let mut closed = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let malformed = |reason: String| SearchError::Malformed { line, reason };
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if closed {
            return Err(malformed("content after the closing parenthesis".into()));
        }

        match trimmed {
            CONSTRUCTOR if !opened => opened = true,
            ")" if opened => closed = true,
            _ if !opened => return Err(malformed(format!("expected `{}`", CONSTRUCTOR))),
            _ => {
                let assignment = trimmed.trim_end_matches(',');
                let (name, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| malformed(format!("expected name=value, got `{}`", trimmed)))?;
                let literal = parse_literal(value.trim())
                    .ok_or_else(|| malformed(format!("cannot read value `{}`", value.trim())))?;

                assign(&mut params, name.trim(), &literal).map_err(malformed)?;
            }
        }
    }

    if !closed {
        return Err(SearchError::Malformed {
            line: text.lines().count(),
            reason: "missing closing parenthesis".into(),
        });
    }

    Ok(params)
}

/// Read a parameter file written by [`write_parameters`]
pub fn read_parameters<P: AsRef<Path>>(path: P) -> Result<HyperParameters> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SearchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_parameters(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuned() -> HyperParameters {
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
    fn rendered_layout() {
        let expected = "# Best Random Forest parameters found by hyperparameter optimization\n\
                        # These parameters can be passed to the training pipeline\n\
                        \n\
                        RandomForestClassifier(\n    \
                        bootstrap=True,\n    \
                        class_weight='balanced',\n    \
                        criterion='entropy',\n    \
                        max_depth=20,\n    \
                        max_features='log2',\n    \
                        min_samples_leaf=1,\n    \
                        min_samples_split=2,\n    \
                        n_estimators=400,\n    \
                        random_state=42,\n    \
                        n_jobs=-1\n\
                        )\n";

        assert_eq!(render_parameters(&tuned()), expected);
    }

    #[test]
    fn unbounded_values_are_none() {
        let params = HyperParameters {
            max_depth: None,
            class_weight: None,
            max_features: MaxFeatures::All,
            ..tuned()
        };
        let text = render_parameters(&params);

        assert!(text.contains("    max_depth=None,\n"));
        assert!(text.contains("    class_weight=None,\n"));
        assert!(text.contains("    max_features=None,\n"));
        assert_eq!(parse_parameters(&text).unwrap(), params);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("optimize_rf_parametreleri.txt");

        write_parameters(&path, &tuned()).unwrap();
        assert_eq!(read_parameters(&path).unwrap(), tuned());
    }

    #[test]
    fn missing_entries_keep_defaults() {
        let params =
            parse_parameters("RandomForestClassifier(\n    n_estimators=350,\n    max_depth=25\n)")
                .unwrap();

        assert_eq!(params.n_estimators, 350);
        assert_eq!(params.max_depth, Some(25));
        assert_eq!(params.criterion, SplitQuality::Gini);
        assert!(params.bootstrap);
    }

    #[test]
    fn double_quotes_are_accepted() {
        let params =
            parse_parameters("RandomForestClassifier(\n criterion=\"entropy\",\n)").unwrap();

        assert_eq!(params.criterion, SplitQuality::Entropy);
    }

    #[test]
    fn malformed_files() {
        let cases = [
            ("n_estimators=10\n", 1),
            ("RandomForestClassifier(\n    n_estimators=ten,\n)", 2),
            ("RandomForestClassifier(\n    n_estimators=-5,\n)", 2),
            ("RandomForestClassifier(\n    criterion='mse',\n)", 2),
            ("RandomForestClassifier(\n    oob_score=True,\n)", 2),
            ("RandomForestClassifier(\n    bootstrap\n)", 2),
            ("RandomForestClassifier(\n    bootstrap=True,\n", 2),
            ("RandomForestClassifier(\n)\nn_jobs=1", 3),
        ];

        for (text, expected) in cases {
            match parse_parameters(text) {
                Err(SearchError::Malformed { line, .. }) => assert_eq!(line, expected, "{}", text),
                other => panic!("{:?} for {}", other, text),
            }
        }
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            read_parameters(dir.path().join("absent.txt")),
            Err(SearchError::Io { .. })
        ));
    }
}
