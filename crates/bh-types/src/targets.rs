use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{BhError, BhResult, MeasurementError};

/// Whether a target is maximized, minimized, or matched to the middle of its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    Max,
    Min,
    Match(MatchShape),
}

/// Shape of the desirability curve for match targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchShape {
    Bell,
    Triangular,
}

/// A measured quantity the campaign optimizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub mode: TargetMode,
    /// Optional (low, high) bounds. Required for match targets and for
    /// every target of a multi-target objective.
    pub bounds: Option<(f64, f64)>,
}

impl Target {
    pub fn new(name: impl Into<String>, mode: TargetMode) -> Self {
        Self {
            name: name.into(),
            mode,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.bounds = Some((low, high));
        self
    }

    pub fn validate(&self) -> BhResult<()> {
        if let Some((low, high)) = self.bounds {
            if !low.is_finite() || !high.is_finite() || low >= high {
                return Err(BhError::Validation(format!(
                    "target {} has invalid bounds ({low}, {high})",
                    self.name
                )));
            }
        }
        if matches!(self.mode, TargetMode::Match(_)) && self.bounds.is_none() {
            return Err(BhError::Validation(format!(
                "match target {} requires bounds",
                self.name
            )));
        }
        Ok(())
    }

    /// Raw value mapped to a "higher is better" score.
    ///
    /// Bounded targets are scaled to [0, 1]; unbounded max/min targets keep
    /// their raw (possibly negated) value.
    pub fn transform(&self, value: f64) -> f64 {
        match (self.mode, self.bounds) {
            (TargetMode::Max, None) => value,
            (TargetMode::Min, None) => -value,
            (TargetMode::Max, Some((low, high))) => ((value - low) / (high - low)).clamp(0.0, 1.0),
            (TargetMode::Min, Some((low, high))) => ((high - value) / (high - low)).clamp(0.0, 1.0),
            (TargetMode::Match(shape), Some((low, high))) => {
                let center = 0.5 * (low + high);
                let half_width = 0.5 * (high - low);
                match shape {
                    MatchShape::Bell => {
                        let z = (value - center) / half_width;
                        (-0.5 * z * z).exp()
                    }
                    MatchShape::Triangular => {
                        (1.0 - (value - center).abs() / half_width).max(0.0)
                    }
                }
            }
            // Rejected by `validate`.
            (TargetMode::Match(_), None) => 0.0,
        }
    }
}

/// Combines one or more targets into a single scalar to maximize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    targets: Vec<Target>,
}

impl Objective {
    pub fn new(targets: Vec<Target>) -> BhResult<Self> {
        if targets.is_empty() {
            return Err(BhError::Config("objective needs at least one target".into()));
        }
        for target in &targets {
            target.validate()?;
        }
        if targets.len() > 1 {
            if let Some(unbounded) = targets.iter().find(|t| t.bounds.is_none()) {
                return Err(BhError::Config(format!(
                    "multi-target objective requires bounded targets, {} is unbounded",
                    unbounded.name
                )));
            }
        }
        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Score a measurement; higher is better.
    ///
    /// A single target is scored by its own transform; several targets are
    /// combined as the geometric mean of their desirabilities.
    pub fn score(&self, values: &BTreeMap<String, f64>) -> Result<f64, MeasurementError> {
        let mut transformed = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let value = *values
                .get(&target.name)
                .ok_or_else(|| MeasurementError::MissingTarget {
                    target: target.name.clone(),
                })?;
            if !value.is_finite() {
                return Err(MeasurementError::NonFinite {
                    target: target.name.clone(),
                    value,
                });
            }
            transformed.push(target.transform(value));
        }

        if let [single] = transformed.as_slice() {
            return Ok(*single);
        }
        let log_sum: f64 = transformed.iter().map(|d| d.max(1e-12).ln()).sum();
        Ok((log_sum / transformed.len() as f64).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn single_max_and_min() {
        let max = Objective::new(vec![Target::new("y", TargetMode::Max)]).unwrap();
        assert_eq!(max.score(&values(&[("y", 4.0)])).unwrap(), 4.0);

        let min = Objective::new(vec![Target::new("y", TargetMode::Min)]).unwrap();
        assert_eq!(min.score(&values(&[("y", 4.0)])).unwrap(), -4.0);
    }

    #[test]
    fn match_peaks_at_center() {
        for shape in [MatchShape::Bell, MatchShape::Triangular] {
            let target = Target::new("y", TargetMode::Match(shape)).with_bounds(0.0, 100.0);
            assert!((target.transform(50.0) - 1.0).abs() < 1e-12);
            assert!(target.transform(10.0) < target.transform(40.0));
        }
    }

    #[test]
    fn match_without_bounds_is_rejected() {
        let target = Target::new("y", TargetMode::Match(MatchShape::Bell));
        assert!(Objective::new(vec![target]).is_err());
    }

    #[test]
    fn multi_target_requires_bounds() {
        let result = Objective::new(vec![
            Target::new("a", TargetMode::Max).with_bounds(0.0, 1.0),
            Target::new("b", TargetMode::Min),
        ]);
        assert!(matches!(result, Err(BhError::Config(_))));
    }

    #[test]
    fn desirability_is_geometric_mean() {
        let objective = Objective::new(vec![
            Target::new("a", TargetMode::Max).with_bounds(0.0, 100.0),
            Target::new("b", TargetMode::Min).with_bounds(0.0, 100.0),
        ])
        .unwrap();
        let score = objective
            .score(&values(&[("a", 100.0), ("b", 75.0)]))
            .unwrap();
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn missing_or_non_finite_values_fail() {
        let objective = Objective::new(vec![Target::new("y", TargetMode::Max)]).unwrap();
        assert_eq!(
            objective.score(&values(&[("z", 1.0)])),
            Err(MeasurementError::MissingTarget { target: "y".into() })
        );
        assert!(matches!(
            objective.score(&values(&[("y", f64::NAN)])),
            Err(MeasurementError::NonFinite { .. })
        ));
    }
}
