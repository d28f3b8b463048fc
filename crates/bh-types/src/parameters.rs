use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::SearchSpaceError;

/// A single parameter dimension of a search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Human-readable parameter name (e.g. "Num_disc_1").
    pub name: String,
    pub kind: ParameterKind,
}

/// Describes the domain of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Finite set of numeric values.
    NumericalDiscrete { values: Vec<f64> },
    /// Finite set of labels, encoded one-hot.
    Categorical { values: Vec<String> },
    /// Continuous range [low, high].
    NumericalContinuous { low: f64, high: f64 },
}

impl ParameterDef {
    pub fn numerical_discrete(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::NumericalDiscrete { values },
        }
    }

    pub fn categorical<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Categorical {
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn numerical_continuous(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::NumericalContinuous { low, high },
        }
    }

    pub fn is_discrete(&self) -> bool {
        !matches!(self.kind, ParameterKind::NumericalContinuous { .. })
    }

    pub fn is_numerical(&self) -> bool {
        !matches!(self.kind, ParameterKind::Categorical { .. })
    }

    /// Reject empty value sets, duplicate values, and inverted or non-finite bounds.
    pub fn validate(&self) -> Result<(), SearchSpaceError> {
        let invalid = |message: &str| SearchSpaceError::InvalidParameter {
            name: self.name.clone(),
            message: message.to_string(),
        };
        match &self.kind {
            ParameterKind::NumericalDiscrete { values } => {
                if values.is_empty() {
                    return Err(invalid("no values"));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(invalid("values must be finite"));
                }
                let mut sorted = values.clone();
                sorted.sort_by(f64::total_cmp);
                if sorted.windows(2).any(|w| w[0] == w[1]) {
                    return Err(invalid("duplicate values"));
                }
            }
            ParameterKind::Categorical { values } => {
                if values.is_empty() {
                    return Err(invalid("no values"));
                }
                let mut sorted = values.clone();
                sorted.sort();
                sorted.dedup();
                if sorted.len() != values.len() {
                    return Err(invalid("duplicate values"));
                }
            }
            ParameterKind::NumericalContinuous { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(invalid("bounds must be finite and ordered"));
                }
            }
        }
        Ok(())
    }

    /// Numerical (low, high) bounds; `None` for categorical parameters.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match &self.kind {
            ParameterKind::NumericalDiscrete { values } => {
                let low = values.iter().copied().fold(f64::INFINITY, f64::min);
                let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                Some((low, high))
            }
            ParameterKind::NumericalContinuous { low, high } => Some((*low, *high)),
            ParameterKind::Categorical { .. } => None,
        }
    }

    /// Every value of a discrete parameter; empty for continuous ones.
    pub fn discrete_values(&self) -> Vec<ParameterValue> {
        match &self.kind {
            ParameterKind::NumericalDiscrete { values } => {
                values.iter().copied().map(ParameterValue::Float).collect()
            }
            ParameterKind::Categorical { values } => values
                .iter()
                .cloned()
                .map(ParameterValue::Categorical)
                .collect(),
            ParameterKind::NumericalContinuous { .. } => Vec::new(),
        }
    }

    /// Whether `value` belongs to this parameter's domain.
    pub fn contains(&self, value: &ParameterValue) -> bool {
        match (&self.kind, value) {
            (ParameterKind::NumericalDiscrete { values }, ParameterValue::Float(v)) => {
                values.iter().any(|x| (x - v).abs() <= 1e-12)
            }
            (ParameterKind::Categorical { values }, ParameterValue::Categorical(v)) => {
                values.contains(v)
            }
            (ParameterKind::NumericalContinuous { low, high }, ParameterValue::Float(v)) => {
                *v >= *low && *v <= *high
            }
            _ => false,
        }
    }
}

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f64),
    Categorical(String),
}

impl ParameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Categorical(_) => None,
        }
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Categorical(v) => write!(f, "{v}"),
        }
    }
}

/// A point of the search space, keyed by parameter name.
pub type Point = BTreeMap<String, ParameterValue>;
