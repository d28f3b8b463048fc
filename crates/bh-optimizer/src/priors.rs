//! Hyperparameter priors for surrogate kernels.

use serde::{Deserialize, Serialize};

use bh_types::SurrogateError;

/// Prior distribution over a positive kernel hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Prior {
    Gamma { concentration: f64, rate: f64 },
    HalfCauchy { scale: f64 },
    HalfNormal { scale: f64 },
    LogNormal { loc: f64, scale: f64 },
    Normal { loc: f64, scale: f64 },
    SmoothedBox { a: f64, b: f64, sigma: f64 },
}

impl Prior {
    pub fn gamma(concentration: f64, rate: f64) -> Self {
        Self::Gamma { concentration, rate }
    }

    pub fn half_cauchy(scale: f64) -> Self {
        Self::HalfCauchy { scale }
    }

    pub fn half_normal(scale: f64) -> Self {
        Self::HalfNormal { scale }
    }

    pub fn log_normal(loc: f64, scale: f64) -> Self {
        Self::LogNormal { loc, scale }
    }

    pub fn normal(loc: f64, scale: f64) -> Self {
        Self::Normal { loc, scale }
    }

    pub fn smoothed_box(a: f64, b: f64, sigma: f64) -> Self {
        Self::SmoothedBox { a, b, sigma }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gamma { .. } => "GammaPrior",
            Self::HalfCauchy { .. } => "HalfCauchyPrior",
            Self::HalfNormal { .. } => "HalfNormalPrior",
            Self::LogNormal { .. } => "LogNormalPrior",
            Self::Normal { .. } => "NormalPrior",
            Self::SmoothedBox { .. } => "SmoothedBoxPrior",
        }
    }

    pub fn validate(&self) -> Result<(), SurrogateError> {
        let invalid = |message: &str| SurrogateError::InvalidPrior {
            prior: self.name().to_string(),
            message: message.to_string(),
        };
        let positive = |x: f64| x.is_finite() && x > 0.0;
        match *self {
            Self::Gamma { concentration, rate } => {
                if !positive(concentration) || !positive(rate) {
                    return Err(invalid("concentration and rate must be positive"));
                }
            }
            Self::HalfCauchy { scale } | Self::HalfNormal { scale } => {
                if !positive(scale) {
                    return Err(invalid("scale must be positive"));
                }
            }
            Self::LogNormal { loc, scale } | Self::Normal { loc, scale } => {
                if !loc.is_finite() || !positive(scale) {
                    return Err(invalid("loc must be finite and scale positive"));
                }
            }
            Self::SmoothedBox { a, b, sigma } => {
                if !a.is_finite() || !b.is_finite() || a >= b || !positive(sigma) {
                    return Err(invalid("requires a < b and positive sigma"));
                }
            }
        }
        Ok(())
    }

    /// Starting value for the hyperparameter this prior governs.
    ///
    /// Uses the mode where it is positive, otherwise a positive typical value.
    pub fn initial_value(&self) -> f64 {
        let value = match *self {
            Self::Gamma { concentration, rate } if concentration >= 1.0 => {
                (concentration - 1.0) / rate
            }
            Self::Gamma { concentration, rate } => concentration / rate,
            Self::HalfCauchy { scale } => scale,
            Self::HalfNormal { scale } => scale * (2.0 / std::f64::consts::PI).sqrt(),
            Self::LogNormal { loc, scale } => (loc - scale * scale).exp(),
            Self::Normal { loc, scale } => {
                if loc > 0.0 {
                    loc
                } else {
                    scale
                }
            }
            Self::SmoothedBox { a, b, .. } => 0.5 * (a + b),
        };
        value.max(1e-3)
    }
}

impl std::fmt::Display for Prior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gamma { concentration, rate } => write!(f, "Gamma({concentration},{rate})"),
            Self::HalfCauchy { scale } => write!(f, "HalfCauchy({scale})"),
            Self::HalfNormal { scale } => write!(f, "HalfNormal({scale})"),
            Self::LogNormal { loc, scale } => write!(f, "LogNormal({loc},{scale})"),
            Self::Normal { loc, scale } => write!(f, "Normal({loc},{scale})"),
            Self::SmoothedBox { a, b, sigma } => write!(f, "SmoothedBox({a},{b},{sigma})"),
        }
    }
}
