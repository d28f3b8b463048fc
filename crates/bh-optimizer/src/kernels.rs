//! Covariance kernels for the Gaussian-process surrogate.

use serde::{Deserialize, Serialize};

use bh_types::SurrogateError;

use crate::priors::Prior;

/// Default Matern smoothness.
pub const DEFAULT_NU: f64 = 2.5;

/// Covariance function over encoded feature vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    Matern {
        nu: f64,
        lengthscale_prior: Option<Prior>,
    },
    Scale {
        base_kernel: Box<Kernel>,
        outputscale_prior: Option<Prior>,
    },
}

impl Default for Kernel {
    fn default() -> Self {
        Self::Scale {
            base_kernel: Box::new(Self::matern(Some(Prior::gamma(3.0, 6.0)))),
            outputscale_prior: Some(Prior::gamma(2.0, 0.15)),
        }
    }
}

impl Kernel {
    pub fn matern(lengthscale_prior: Option<Prior>) -> Self {
        Self::Matern {
            nu: DEFAULT_NU,
            lengthscale_prior,
        }
    }

    pub fn scale(base_kernel: Kernel, outputscale_prior: Option<Prior>) -> Self {
        Self::Scale {
            base_kernel: Box::new(base_kernel),
            outputscale_prior,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Matern { .. } => "MaternKernel",
            Self::Scale { .. } => "ScaleKernel",
        }
    }

    pub fn validate(&self) -> Result<(), SurrogateError> {
        match self {
            Self::Matern {
                nu,
                lengthscale_prior,
            } => {
                if ![0.5, 1.5, 2.5].contains(nu) {
                    return Err(SurrogateError::Numerical {
                        surrogate: self.name().to_string(),
                        message: format!("unsupported nu {nu}, expected 0.5, 1.5 or 2.5"),
                    });
                }
                lengthscale_prior.as_ref().map_or(Ok(()), Prior::validate)
            }
            Self::Scale {
                base_kernel,
                outputscale_prior,
            } => {
                base_kernel.validate()?;
                outputscale_prior.as_ref().map_or(Ok(()), Prior::validate)
            }
        }
    }

    /// Covariance between two feature vectors of equal length.
    pub fn evaluate(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            Self::Matern {
                nu,
                lengthscale_prior,
            } => {
                let lengthscale = lengthscale_prior.map_or(1.0, |p| p.initial_value());
                let dist = x
                    .iter()
                    .zip(y)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt()
                    / lengthscale;
                matern(*nu, dist)
            }
            Self::Scale {
                base_kernel,
                outputscale_prior,
            } => {
                let outputscale = outputscale_prior.map_or(1.0, |p| p.initial_value());
                outputscale * base_kernel.evaluate(x, y)
            }
        }
    }
}

/// Compact label, e.g. `Scale(Matern(Gamma(3,1)),HalfNormal(2))`.
impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prior = |p: &Option<Prior>| p.map_or_else(|| "-".to_string(), |p| p.to_string());
        match self {
            Self::Matern {
                lengthscale_prior, ..
            } => write!(f, "Matern({})", prior(lengthscale_prior)),
            Self::Scale {
                base_kernel,
                outputscale_prior,
            } => write!(f, "Scale({},{})", base_kernel, prior(outputscale_prior)),
        }
    }
}

fn matern(nu: f64, dist: f64) -> f64 {
    if nu <= 0.5 {
        (-dist).exp()
    } else if nu <= 1.5 {
        let s = 3f64.sqrt() * dist;
        (1.0 + s) * (-s).exp()
    } else {
        let s = 5f64.sqrt() * dist;
        (1.0 + s + s * s / 3.0) * (-s).exp()
    }
}
