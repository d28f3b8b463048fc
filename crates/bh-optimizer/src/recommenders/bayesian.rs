//! Surrogate-driven recommendation.

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bh_types::{BhResult, Point, RecommenderError, SearchSpaceType};

use crate::acquisition::AcquisitionFunction;
use crate::surrogates::SurrogateConfig;

use super::{
    available_candidates, ensure_compatible, farthest_point_indices, training_data,
    RecommendContext, Recommender,
};

/// Continuous samples scored per pure-continuous recommendation step.
const CONTINUOUS_SAMPLES: usize = 64;
/// Continuous samples paired with each discrete candidate in hybrid spaces.
const HYBRID_CONTINUOUS_SAMPLES: usize = 8;

/// How the discrete part of a hybrid space is subsampled before optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HybridSampler {
    /// Use every discrete candidate.
    None,
    /// Farthest-point subsample.
    Farthest,
    /// Uniform random subsample.
    Random,
}

impl HybridSampler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Farthest => "Farthest",
            Self::Random => "Random",
        }
    }
}

/// Configuration of [`SequentialGreedyRecommender`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialGreedyConfig {
    pub surrogate: SurrogateConfig,
    pub acquisition: AcquisitionFunction,
    pub hybrid_sampler: HybridSampler,
    /// Fraction of discrete candidates kept by the hybrid sampler.
    pub sampling_percentage: f64,
}

impl Default for SequentialGreedyConfig {
    fn default() -> Self {
        Self {
            surrogate: SurrogateConfig::default(),
            acquisition: AcquisitionFunction::default(),
            hybrid_sampler: HybridSampler::None,
            sampling_percentage: 1.0,
        }
    }
}

impl SequentialGreedyConfig {
    pub fn with_surrogate(mut self, surrogate: SurrogateConfig) -> Self {
        self.surrogate = surrogate;
        self
    }

    pub fn with_acquisition(mut self, acquisition: AcquisitionFunction) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn with_hybrid_sampling(mut self, sampler: HybridSampler, percentage: f64) -> Self {
        self.hybrid_sampler = sampler;
        self.sampling_percentage = percentage;
        self
    }

    pub fn label(&self) -> String {
        match self.hybrid_sampler {
            HybridSampler::None if self.sampling_percentage == 1.0 => "SG".to_string(),
            sampler => format!("SG[{}:{}]", sampler.as_str(), self.sampling_percentage),
        }
    }

    pub fn validate(&self) -> BhResult<()> {
        let invalid = |message: String| RecommenderError::InvalidConfig { message };
        let pct = self.sampling_percentage;
        if !pct.is_finite() || !(0.0..=1.0).contains(&pct) {
            return Err(invalid(format!("sampling percentage {pct} is outside [0, 1]")).into());
        }
        if self.hybrid_sampler != HybridSampler::None && pct == 0.0 {
            return Err(invalid(format!(
                "{} sampling with percentage 0 keeps no candidates",
                self.hybrid_sampler.as_str()
            ))
            .into());
        }
        self.acquisition.validate().map_err(invalid)?;
        self.surrogate.build()?;
        Ok(())
    }
}

/// Greedy batch construction: each pick maximizes the acquisition function,
/// then is added to the training data at its posterior mean before the next
/// pick.
#[derive(Debug, Clone)]
pub struct SequentialGreedyRecommender {
    config: SequentialGreedyConfig,
}

impl SequentialGreedyRecommender {
    pub fn new(config: SequentialGreedyConfig) -> BhResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    fn candidate_pool(
        &self,
        ctx: &RecommendContext<'_>,
        space_type: SearchSpaceType,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        let continuous = ctx.space.continuous_subspace();
        match space_type {
            SearchSpaceType::Discrete => {
                let pool = available_candidates(ctx)?;
                if pool.len() < batch_size {
                    return Err(RecommenderError::ExhaustedCandidates {
                        requested: batch_size,
                        available: pool.len(),
                    }
                    .into());
                }
                Ok(pool)
            }
            SearchSpaceType::Continuous => Ok((0..CONTINUOUS_SAMPLES)
                .map(|_| continuous.sample_continuous(rng))
                .collect()),
            SearchSpaceType::Hybrid | SearchSpaceType::Either => {
                let discrete = self.sample_discrete(ctx, available_candidates(ctx)?, rng)?;
                let mut pool = Vec::with_capacity(discrete.len() * HYBRID_CONTINUOUS_SAMPLES);
                for point in discrete {
                    for _ in 0..HYBRID_CONTINUOUS_SAMPLES {
                        let mut combined = point.clone();
                        combined.extend(continuous.sample_continuous(rng));
                        pool.push(combined);
                    }
                }
                Ok(pool)
            }
        }
    }

    fn sample_discrete(
        &self,
        ctx: &RecommendContext<'_>,
        candidates: Vec<Point>,
        rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        let keep = ((self.config.sampling_percentage * candidates.len() as f64).ceil() as usize)
            .clamp(1, candidates.len().max(1));
        Ok(match self.config.hybrid_sampler {
            HybridSampler::None => candidates,
            HybridSampler::Random => candidates.choose_multiple(rng, keep).cloned().collect(),
            HybridSampler::Farthest => {
                let discrete = ctx.space.discrete_subspace();
                let encoded = candidates
                    .iter()
                    .map(|c| discrete.encode(c))
                    .collect::<Result<Vec<_>, _>>()?;
                farthest_point_indices(&encoded, keep, &[])
                    .into_iter()
                    .map(|i| candidates[i].clone())
                    .collect()
            }
        })
    }
}

impl Recommender for SequentialGreedyRecommender {
    fn name(&self) -> &'static str {
        "SequentialGreedyRecommender"
    }

    fn compatibility(&self) -> SearchSpaceType {
        SearchSpaceType::Hybrid
    }

    fn recommend(
        &mut self,
        ctx: &RecommendContext<'_>,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        let space_type = ensure_compatible(self.name(), self.compatibility(), ctx.space)?;
        let acquisition = self.config.acquisition;
        if !acquisition.is_mc() && batch_size > 1 {
            return Err(RecommenderError::IncompatibleAcquisitionFunction {
                acquisition: acquisition.abbreviation().to_string(),
                batch_size,
            }
            .into());
        }
        if ctx.measurements.is_empty() {
            return Err(RecommenderError::NoTrainingData {
                recommender: self.name().to_string(),
            }
            .into());
        }

        let (mut x, mut y) = training_data(ctx)?;
        let pool = self.candidate_pool(ctx, space_type, batch_size, rng)?;
        let encoded = pool
            .iter()
            .map(|p| ctx.space.encode(p))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            candidates = pool.len(),
            training_points = x.len(),
            acquisition = acquisition.abbreviation(),
            "sequential greedy optimization"
        );

        let mut surrogate = self.config.surrogate.build()?;
        let mut chosen: Vec<usize> = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            surrogate.fit(&x, &y)?;
            let incumbent = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let mut best: Option<(usize, f64, f64)> = None;
            for (i, features) in encoded.iter().enumerate() {
                if chosen.contains(&i) {
                    continue;
                }
                let posterior = surrogate.posterior(features)?;
                let score = acquisition.score(posterior, incumbent, &mut *rng);
                let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
                if best.map_or(true, |(_, s, _)| score > s) {
                    best = Some((i, score, posterior.mean));
                }
            }

            let (idx, _, fantasy) = best.ok_or(RecommenderError::ExhaustedCandidates {
                requested: batch_size,
                available: chosen.len(),
            })?;
            chosen.push(idx);
            x.push(encoded[idx].clone());
            y.push(fantasy);
        }

        Ok(chosen.into_iter().map(|i| pool[i].clone()).collect())
    }
}
