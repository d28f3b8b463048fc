//! Surrogate models fitted to observed (features, score) pairs.

use nalgebra as na;
use serde::{Deserialize, Serialize};

use bh_types::SurrogateError;

use crate::kernels::Kernel;

/// Predictive distribution at a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posterior {
    pub mean: f64,
    pub variance: f64,
}

impl Posterior {
    pub fn std_dev(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }
}

/// Common trait for all surrogate models.
pub trait Surrogate: Send {
    fn name(&self) -> &'static str;

    /// Fit to encoded features `x` and scores `y` (higher is better).
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), SurrogateError>;

    fn posterior(&self, x: &[f64]) -> Result<Posterior, SurrogateError>;
}

/// Serializable surrogate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurrogateConfig {
    GaussianProcess { kernel: Kernel },
    BayesianLinear,
    MeanPrediction,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self::GaussianProcess {
            kernel: Kernel::default(),
        }
    }
}

impl SurrogateConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GaussianProcess { .. } => "GaussianProcessSurrogate",
            Self::BayesianLinear => "BayesianLinearSurrogate",
            Self::MeanPrediction => "MeanPredictionSurrogate",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::GaussianProcess { .. } => "GP",
            Self::BayesianLinear => "BL",
            Self::MeanPrediction => "MP",
        }
    }

    pub fn build(&self) -> Result<Box<dyn Surrogate>, SurrogateError> {
        Ok(match self {
            Self::GaussianProcess { kernel } => {
                kernel.validate()?;
                Box::new(GaussianProcessSurrogate::new(kernel.clone()))
            }
            Self::BayesianLinear => Box::new(BayesianLinearSurrogate::default()),
            Self::MeanPrediction => Box::new(MeanPredictionSurrogate::default()),
        })
    }
}

/// Mean and standard deviation used to standardize training scores.
#[derive(Debug, Clone, Copy)]
struct Standardizer {
    mean: f64,
    std: f64,
}

impl Standardizer {
    fn fit(y: &[f64]) -> Self {
        let n = y.len() as f64;
        let mean = y.iter().sum::<f64>() / n;
        let var = y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std = if var.sqrt() > 1e-9 { var.sqrt() } else { 1.0 };
        Self { mean, std }
    }

    fn apply(&self, y: &[f64]) -> Vec<f64> {
        y.iter().map(|v| (v - self.mean) / self.std).collect()
    }

    fn restore(&self, posterior: Posterior) -> Posterior {
        Posterior {
            mean: posterior.mean * self.std + self.mean,
            variance: posterior.variance * self.std * self.std,
        }
    }
}

fn numerical(surrogate: &str, message: &str) -> SurrogateError {
    SurrogateError::Numerical {
        surrogate: surrogate.to_string(),
        message: message.to_string(),
    }
}

fn check_training_data(name: &str, x: &[Vec<f64>], y: &[f64]) -> Result<(), SurrogateError> {
    if x.is_empty() || x.len() != y.len() {
        return Err(SurrogateError::EmptyTrainingData {
            surrogate: name.to_string(),
        });
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(numerical(name, "non-finite training score"));
    }
    Ok(())
}

// ---- Gaussian process ----

const GP_NOISE: f64 = 1e-4;

#[derive(Debug)]
struct GpState {
    x: Vec<Vec<f64>>,
    lower: na::DMatrix<f64>,
    alpha: na::DVector<f64>,
    scaler: Standardizer,
}

/// Exact Gaussian-process regression with fixed hyperparameters taken from
/// the kernel priors.
#[derive(Debug)]
pub struct GaussianProcessSurrogate {
    kernel: Kernel,
    state: Option<GpState>,
}

impl GaussianProcessSurrogate {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            state: None,
        }
    }
}

impl Surrogate for GaussianProcessSurrogate {
    fn name(&self) -> &'static str {
        "GaussianProcessSurrogate"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), SurrogateError> {
        check_training_data(self.name(), x, y)?;
        let scaler = Standardizer::fit(y);
        let y_std = na::DVector::from_vec(scaler.apply(y));

        let n = x.len();
        let gram = na::DMatrix::from_fn(n, n, |i, j| self.kernel.evaluate(&x[i], &x[j]));

        // Duplicate inputs make the Gram matrix singular; escalate jitter.
        let mut jitter = GP_NOISE;
        let cholesky = loop {
            let noisy = &gram + na::DMatrix::identity(n, n) * jitter;
            if let Some(cholesky) = noisy.cholesky() {
                break cholesky;
            }
            jitter *= 10.0;
            if jitter > 1.0 {
                return Err(numerical(self.name(), "kernel matrix is not positive definite"));
            }
        };

        let alpha = cholesky.solve(&y_std);
        self.state = Some(GpState {
            x: x.to_vec(),
            lower: cholesky.l(),
            alpha,
            scaler,
        });
        Ok(())
    }

    fn posterior(&self, x: &[f64]) -> Result<Posterior, SurrogateError> {
        let state = self.state.as_ref().ok_or_else(|| SurrogateError::NotFitted {
            surrogate: self.name().to_string(),
        })?;
        let k_star = na::DVector::from_iterator(
            state.x.len(),
            state.x.iter().map(|xi| self.kernel.evaluate(xi, x)),
        );
        let mean = k_star.dot(&state.alpha);
        let v = state
            .lower
            .solve_lower_triangular(&k_star)
            .ok_or_else(|| numerical(self.name(), "singular Cholesky factor"))?;
        let variance = (self.kernel.evaluate(x, x) - v.dot(&v)).max(1e-12);
        Ok(state.scaler.restore(Posterior { mean, variance }))
    }
}

// ---- Bayesian linear regression ----

#[derive(Debug)]
struct LinearState {
    lower: na::DMatrix<f64>,
    weights: na::DVector<f64>,
    scaler: Standardizer,
}

/// Bayesian linear regression with an isotropic Gaussian weight prior.
#[derive(Debug)]
pub struct BayesianLinearSurrogate {
    /// Prior precision of the weights.
    alpha: f64,
    /// Observation noise precision.
    beta: f64,
    state: Option<LinearState>,
}

impl Default for BayesianLinearSurrogate {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 25.0,
            state: None,
        }
    }
}

/// Feature vector with a leading bias term.
fn with_bias(x: &[f64]) -> na::DVector<f64> {
    na::DVector::from_iterator(x.len() + 1, std::iter::once(1.0).chain(x.iter().copied()))
}

impl Surrogate for BayesianLinearSurrogate {
    fn name(&self) -> &'static str {
        "BayesianLinearSurrogate"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), SurrogateError> {
        check_training_data(self.name(), x, y)?;
        let scaler = Standardizer::fit(y);
        let y_std = na::DVector::from_vec(scaler.apply(y));
        let d = x[0].len() + 1;
        let phi = na::DMatrix::from_fn(x.len(), d, |i, j| if j == 0 { 1.0 } else { x[i][j - 1] });

        let phi_t = phi.transpose();
        let precision = &phi_t * &phi * self.beta + na::DMatrix::identity(d, d) * self.alpha;
        let rhs = &phi_t * y_std * self.beta;

        let cholesky = precision
            .cholesky()
            .ok_or_else(|| numerical(self.name(), "posterior precision is not positive definite"))?;
        let weights = cholesky.solve(&rhs);
        self.state = Some(LinearState {
            lower: cholesky.l(),
            weights,
            scaler,
        });
        Ok(())
    }

    fn posterior(&self, x: &[f64]) -> Result<Posterior, SurrogateError> {
        let state = self.state.as_ref().ok_or_else(|| SurrogateError::NotFitted {
            surrogate: self.name().to_string(),
        })?;
        let phi = with_bias(x);
        if phi.len() != state.weights.len() {
            return Err(numerical(self.name(), "feature dimension changed since fit"));
        }
        let v = state
            .lower
            .solve_lower_triangular(&phi)
            .ok_or_else(|| numerical(self.name(), "singular Cholesky factor"))?;
        let posterior = Posterior {
            mean: phi.dot(&state.weights),
            variance: 1.0 / self.beta + v.dot(&v),
        };
        Ok(state.scaler.restore(posterior))
    }
}

// ---- Mean prediction ----

/// Predicts the training mean everywhere; useful as a baseline.
#[derive(Debug, Default)]
pub struct MeanPredictionSurrogate {
    fitted: Option<Posterior>,
}

impl Surrogate for MeanPredictionSurrogate {
    fn name(&self) -> &'static str {
        "MeanPredictionSurrogate"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), SurrogateError> {
        check_training_data(self.name(), x, y)?;
        let scaler = Standardizer::fit(y);
        self.fitted = Some(Posterior {
            mean: scaler.mean,
            variance: scaler.std * scaler.std,
        });
        Ok(())
    }

    fn posterior(&self, _x: &[f64]) -> Result<Posterior, SurrogateError> {
        self.fitted.ok_or_else(|| SurrogateError::NotFitted {
            surrogate: self.name().to_string(),
        })
    }
}
