//! Acquisition functions scoring candidate points from a surrogate posterior.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stats::{normal_cdf, normal_pdf};
use crate::surrogates::Posterior;

/// Number of posterior samples drawn by Monte-Carlo acquisition functions.
pub const MC_SAMPLES: usize = 128;

/// Scoring function balancing exploration and exploitation.
///
/// `Q*` variants estimate their value by Monte-Carlo sampling; the others are
/// closed-form and only support recommending one point per batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AcquisitionFunction {
    PosteriorMean,
    ExpectedImprovement,
    LogExpectedImprovement,
    ProbabilityOfImprovement,
    UpperConfidenceBound { beta: f64 },
    QExpectedImprovement,
    QLogExpectedImprovement,
    QNoisyExpectedImprovement,
    QProbabilityOfImprovement,
    QUpperConfidenceBound { beta: f64 },
    QSimpleRegret,
}

impl Default for AcquisitionFunction {
    fn default() -> Self {
        Self::QExpectedImprovement
    }
}

impl AcquisitionFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PosteriorMean => "PosteriorMean",
            Self::ExpectedImprovement => "ExpectedImprovement",
            Self::LogExpectedImprovement => "LogExpectedImprovement",
            Self::ProbabilityOfImprovement => "ProbabilityOfImprovement",
            Self::UpperConfidenceBound { .. } => "UpperConfidenceBound",
            Self::QExpectedImprovement => "qExpectedImprovement",
            Self::QLogExpectedImprovement => "qLogExpectedImprovement",
            Self::QNoisyExpectedImprovement => "qNoisyExpectedImprovement",
            Self::QProbabilityOfImprovement => "qProbabilityOfImprovement",
            Self::QUpperConfidenceBound { .. } => "qUpperConfidenceBound",
            Self::QSimpleRegret => "qSimpleRegret",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::PosteriorMean => "PM",
            Self::ExpectedImprovement => "EI",
            Self::LogExpectedImprovement => "LogEI",
            Self::ProbabilityOfImprovement => "PI",
            Self::UpperConfidenceBound { .. } => "UCB",
            Self::QExpectedImprovement => "qEI",
            Self::QLogExpectedImprovement => "qLogEI",
            Self::QNoisyExpectedImprovement => "qNEI",
            Self::QProbabilityOfImprovement => "qPI",
            Self::QUpperConfidenceBound { .. } => "qUCB",
            Self::QSimpleRegret => "qSR",
        }
    }

    pub fn is_mc(&self) -> bool {
        match self {
            Self::PosteriorMean
            | Self::ExpectedImprovement
            | Self::LogExpectedImprovement
            | Self::ProbabilityOfImprovement
            | Self::UpperConfidenceBound { .. } => false,
            Self::QExpectedImprovement
            | Self::QLogExpectedImprovement
            | Self::QNoisyExpectedImprovement
            | Self::QProbabilityOfImprovement
            | Self::QUpperConfidenceBound { .. }
            | Self::QSimpleRegret => true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::UpperConfidenceBound { beta } | Self::QUpperConfidenceBound { beta }
                if !beta.is_finite() || *beta < 0.0 =>
            {
                Err(format!("{}: beta must be non-negative, got {beta}", self.name()))
            }
            _ => Ok(()),
        }
    }

    /// Score a candidate given its posterior and the best score observed so far.
    pub fn score<R: Rng + ?Sized>(&self, posterior: Posterior, incumbent: f64, rng: &mut R) -> f64 {
        let mean = posterior.mean;
        let sigma = posterior.std_dev().max(1e-12);
        match *self {
            Self::PosteriorMean => mean,
            Self::ExpectedImprovement => expected_improvement(mean, sigma, incumbent),
            Self::LogExpectedImprovement => {
                expected_improvement(mean, sigma, incumbent).max(1e-300).ln()
            }
            Self::ProbabilityOfImprovement => normal_cdf((mean - incumbent) / sigma),
            Self::UpperConfidenceBound { beta } => mean + beta.sqrt() * sigma,
            Self::QExpectedImprovement | Self::QNoisyExpectedImprovement => {
                mc_mean(rng, |s| (mean + sigma * s - incumbent).max(0.0))
            }
            Self::QLogExpectedImprovement => {
                mc_mean(rng, |s| (mean + sigma * s - incumbent).max(0.0))
                    .max(1e-300)
                    .ln()
            }
            Self::QProbabilityOfImprovement => {
                mc_mean(rng, |s| if mean + sigma * s > incumbent { 1.0 } else { 0.0 })
            }
            Self::QUpperConfidenceBound { beta } => {
                let factor = (beta * std::f64::consts::PI / 2.0).sqrt();
                mc_mean(rng, |s| mean + factor * (sigma * s).abs())
            }
            Self::QSimpleRegret => mc_mean(rng, |s| mean + sigma * s),
        }
    }
}

fn expected_improvement(mean: f64, sigma: f64, incumbent: f64) -> f64 {
    let z = (mean - incumbent) / sigma;
    (mean - incumbent) * normal_cdf(z) + sigma * normal_pdf(z)
}

/// Average of `f` over standard-normal draws.
fn mc_mean<R: Rng + ?Sized>(rng: &mut R, f: impl Fn(f64) -> f64) -> f64 {
    let total: f64 = (0..MC_SAMPLES).map(|_| f(standard_normal(rng))).sum();
    total / MC_SAMPLES as f64
}

// Box-Muller transform.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn all() -> Vec<AcquisitionFunction> {
        vec![
            AcquisitionFunction::PosteriorMean,
            AcquisitionFunction::ExpectedImprovement,
            AcquisitionFunction::LogExpectedImprovement,
            AcquisitionFunction::ProbabilityOfImprovement,
            AcquisitionFunction::UpperConfidenceBound { beta: 0.2 },
            AcquisitionFunction::QExpectedImprovement,
            AcquisitionFunction::QLogExpectedImprovement,
            AcquisitionFunction::QNoisyExpectedImprovement,
            AcquisitionFunction::QProbabilityOfImprovement,
            AcquisitionFunction::QUpperConfidenceBound { beta: 0.2 },
            AcquisitionFunction::QSimpleRegret,
        ]
    }

    #[test]
    fn abbreviations_are_unique() {
        let mut abbreviations: Vec<_> = all().iter().map(|a| a.abbreviation()).collect();
        abbreviations.sort();
        abbreviations.dedup();
        assert_eq!(abbreviations.len(), all().len());
    }

    #[test]
    fn mc_flag_matches_q_prefix() {
        for acqf in all() {
            assert_eq!(acqf.is_mc(), acqf.abbreviation().starts_with('q'), "{acqf:?}");
        }
    }

    #[test]
    fn scores_are_finite_and_prefer_higher_means() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let good = Posterior { mean: 2.0, variance: 0.25 };
        let bad = Posterior { mean: -2.0, variance: 0.25 };
        for acqf in all() {
            let g = acqf.score(good, 0.0, &mut rng);
            let b = acqf.score(bad, 0.0, &mut rng);
            assert!(g.is_finite() && b.is_finite(), "{acqf:?}");
            assert!(g > b, "{acqf:?}: {g} <= {b}");
        }
    }

    #[test]
    fn analytic_ei_matches_closed_form_at_zero_gap() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let ei = AcquisitionFunction::ExpectedImprovement.score(
            Posterior { mean: 1.0, variance: 1.0 },
            1.0,
            &mut rng,
        );
        assert!((ei - normal_pdf(0.0)).abs() < 1e-9);
    }

    #[test]
    fn negative_beta_is_invalid() {
        assert!(AcquisitionFunction::UpperConfidenceBound { beta: -1.0 }
            .validate()
            .is_err());
        assert!(AcquisitionFunction::QExpectedImprovement.validate().is_ok());
    }
}
