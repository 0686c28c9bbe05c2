//! Label encoding of categorical values
use std::collections::HashMap;

use ids_forest::traits::Transformer;
use ndarray::Array1;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Order in which distinct values receive their codes
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CategoryOrder {
    /// Numeric order if every value parses as a number, byte-wise string order otherwise
    ///
    /// In numeric order values are compared as numbers, so `"1"` and `"1.0"` are one class
    /// spelled `"1"`.
    #[default]
    Auto,
    /// Byte-wise string order
    Lexical,
}

/// Maps the distinct values of a column to the codes `0..k`
///
/// ### Example
///
/// ```rust
/// use ids_forest_preprocessing::LabelEncoder;
///
/// let encoder = LabelEncoder::new().fit(&["udp", "tcp", "icmp", "tcp"]).unwrap();
///
/// assert_eq!(encoder.classes(), &["icmp", "tcp", "udp"]);
/// assert_eq!(encoder.transform(&["tcp", "udp"]).unwrap().to_vec(), vec![1, 2]);
/// assert_eq!(encoder.decode(0).unwrap(), "icmp");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LabelEncoder {
    order: CategoryOrder,
}

impl LabelEncoder {
    pub fn new() -> Self {
        LabelEncoder::default()
    }

    pub fn order(mut self, order: CategoryOrder) -> Self {
        self.order = order;
        self
    }

    /// Collect and sort the distinct values
    pub fn fit<S: AsRef<str>>(&self, values: &[S]) -> Result<FittedLabelEncoder> {
        if values.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut classes = values
            .iter()
            .map(|x| x.as_ref().to_string())
            .collect::<Vec<_>>();
        classes.sort();
        classes.dedup();

        let numbers = match self.order {
            CategoryOrder::Auto => classes
                .iter()
                .map(|x| parse_number(x))
                .collect::<Option<Vec<_>>>(),
            CategoryOrder::Lexical => None,
        };

        let Some(numbers) = numbers else {
            let index = classes
                .iter()
                .enumerate()
                .map(|(code, class)| (class.clone(), code))
                .collect();

            return Ok(FittedLabelEncoder {
                classes,
                index,
                numeric: false,
            });
        };

        let mut pairs = numbers.into_iter().zip(classes).collect::<Vec<_>>();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        // spellings of the same number share the code of the first one
        let mut classes: Vec<String> = Vec::new();
        let mut index = HashMap::new();
        let mut last = None;
        for (number, spelling) in pairs {
            if last != Some(number) {
                classes.push(spelling.clone());
                last = Some(number);
            }
            index.insert(spelling, classes.len() - 1);
        }

        Ok(FittedLabelEncoder {
            classes,
            index,
            numeric: true,
        })
    }

    /// Fit on the values and encode them in one go
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        values: &[S],
    ) -> Result<(FittedLabelEncoder, Array1<usize>)> {
        let encoder = self.fit(values)?;
        let codes = encoder.transform(values)?;

        Ok((encoder, codes))
    }
}

/// Label encoder holding the sorted distinct values seen while fitting
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedLabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
    numeric: bool,
}

impl FittedLabelEncoder {
    /// Distinct values, the position of a value is its code
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Code of a value, numeric classes also match other spellings of the same number
    pub fn encode(&self, value: &str) -> Result<usize> {
        if let Some(code) = self.index.get(value) {
            return Ok(*code);
        }

        let number = parse_number(value).filter(|_| self.numeric);
        number
            .and_then(|number| {
                self.classes
                    .iter()
                    .position(|class| parse_number(class) == Some(number))
            })
            .ok_or_else(|| Error::UnknownLabel(value.to_string()))
    }

    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(|x| x.as_str())
            .ok_or(Error::UnknownCode(code, self.classes.len()))
    }

    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> Result<Array1<usize>> {
        values.iter().map(|x| self.encode(x.as_ref())).collect()
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|code| self.decode(*code).map(|x| x.to_string()))
            .collect()
    }
}

impl<S: AsRef<str>> Transformer<&[S], Result<Array1<usize>>> for FittedLabelEncoder {
    fn transform(&self, x: &[S]) -> Result<Array1<usize>> {
        FittedLabelEncoder::transform(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_values() {
        let values = ["normal", "ddos", "scan", "ddos", "normal"];
        let (encoder, codes) = LabelEncoder::new().fit_transform(&values).unwrap();

        assert_eq!(encoder.classes(), &["ddos", "normal", "scan"]);
        assert_eq!(codes.to_vec(), vec![1, 0, 2, 0, 1]);
    }

    #[test]
    fn encoding_is_a_bijection() {
        let values = ["b", "a", "c", "a", "B", "", "c"];
        let (encoder, codes) = LabelEncoder::new().fit_transform(&values).unwrap();

        assert_eq!(encoder.n_classes(), 5);
        let decoded = encoder.inverse_transform(codes.as_slice().unwrap()).unwrap();
        assert_eq!(decoded, values);

        for code in 0..encoder.n_classes() {
            assert_eq!(encoder.encode(encoder.decode(code).unwrap()).unwrap(), code);
        }
    }

    #[test]
    fn numeric_values_sort_as_numbers() {
        let values = ["10", "9", "1", "9"];

        let encoder = LabelEncoder::new().fit(&values).unwrap();
        assert_eq!(encoder.classes(), &["1", "9", "10"]);

        let encoder = LabelEncoder::new()
            .order(CategoryOrder::Lexical)
            .fit(&values)
            .unwrap();
        assert_eq!(encoder.classes(), &["1", "10", "9"]);
    }

    #[test]
    fn numeric_spellings_share_a_code() {
        let values = ["1.0", "0", "1", "2.50", "2.5", "0.0"];
        let (encoder, codes) = LabelEncoder::new().fit_transform(&values).unwrap();

        assert_eq!(encoder.classes(), &["0", "1", "2.5"]);
        assert_eq!(codes.to_vec(), vec![1, 0, 1, 2, 2, 0]);
        assert_eq!(encoder.encode("1.00").unwrap(), 1);
        assert!(encoder.encode("3").is_err());

        let lexical = LabelEncoder::new()
            .order(CategoryOrder::Lexical)
            .fit(&values)
            .unwrap();
        assert_eq!(lexical.n_classes(), 6);
        assert!(lexical.encode("1.00").is_err());
    }

    #[test]
    fn unknown_values_and_codes() {
        let encoder = LabelEncoder::new().fit(&["tcp", "udp"]).unwrap();

        assert_eq!(
            encoder.encode("icmp"),
            Err(Error::UnknownLabel("icmp".into()))
        );
        assert_eq!(encoder.decode(2), Err(Error::UnknownCode(2, 2)));
        assert!(encoder.transform(&["tcp", "icmp"]).is_err());
    }

    #[test]
    fn transformer_trait() {
        let encoder = LabelEncoder::new().fit(&["x", "y"]).unwrap();
        let values: &[&str] = &["y", "x"];

        let codes = Transformer::transform(&encoder, values).unwrap();
        assert_eq!(codes.to_vec(), vec![1, 0]);
    }

    #[test]
    fn empty_input() {
        let values: [&str; 0] = [];
        assert_eq!(LabelEncoder::new().fit(&values), Err(Error::EmptyInput));
    }
}
