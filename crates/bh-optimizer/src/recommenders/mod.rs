//! Recommenders: policies producing the next batch of points to evaluate.
//!
//! Pure recommenders either ignore the data ([`nonpredictive`]), consult a
//! surrogate ([`bayesian`]) or combine sub-recommenders per subspace
//! ([`naive`]). Meta recommenders ([`meta`]) pick a pure recommender for each
//! batch.

pub mod bayesian;
pub mod meta;
pub mod naive;
pub mod nonpredictive;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use bh_types::{
    BhResult, Measurement, Objective, Point, RecommenderError, SearchSpaceType,
};

use crate::search::SearchSpace;

pub use bayesian::{HybridSampler, SequentialGreedyConfig, SequentialGreedyRecommender};
pub use meta::{
    SequenceMode, SequentialMetaRecommender, StreamingSequentialMetaRecommender,
    TwoPhaseMetaRecommender,
};
pub use naive::NaiveHybridSpaceRecommender;
pub use nonpredictive::{FpsRecommender, KMeansClusteringRecommender, RandomRecommender};

/// Everything a recommender may look at when producing a batch.
#[derive(Debug, Clone, Copy)]
pub struct RecommendContext<'a> {
    pub space: &'a SearchSpace,
    pub objective: &'a Objective,
    pub measurements: &'a [Measurement],
    /// Whether already measured discrete candidates may be recommended again.
    pub allow_repeated: bool,
}

impl<'a> RecommendContext<'a> {
    /// Same data, restricted to `space`.
    pub fn with_space<'b>(&self, space: &'b SearchSpace) -> RecommendContext<'b>
    where
        'a: 'b,
    {
        RecommendContext {
            space,
            objective: self.objective,
            measurements: self.measurements,
            allow_repeated: self.allow_repeated,
        }
    }
}

/// Common trait for all recommenders.
pub trait Recommender: Send {
    fn name(&self) -> &'static str;

    /// Search-space types this recommender can operate on.
    fn compatibility(&self) -> SearchSpaceType;

    /// Produce exactly `batch_size` points of `ctx.space`.
    fn recommend(
        &mut self,
        ctx: &RecommendContext<'_>,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>>;
}

/// Coarse role of a recommender, used for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommenderFamily {
    NonPredictive,
    Bayesian,
    Composite,
    Meta,
}

/// Serializable recommender configuration.
///
/// Configurations nest: meta recommenders and the naive hybrid recommender
/// hold the configurations of their parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecommenderConfig {
    Random,
    Fps,
    KMeansClustering {
        max_iterations: usize,
    },
    SequentialGreedy(SequentialGreedyConfig),
    NaiveHybrid {
        disc_recommender: Box<RecommenderConfig>,
        cont_recommender: Box<RecommenderConfig>,
    },
    TwoPhase {
        initial_recommender: Box<RecommenderConfig>,
        recommender: Box<RecommenderConfig>,
        /// Number of measurements after which the second phase starts.
        switch_after: usize,
    },
    Sequential {
        recommenders: Vec<RecommenderConfig>,
        mode: SequenceMode,
    },
    StreamingSequential {
        recommenders: Vec<RecommenderConfig>,
        /// Restart from the first recommender once the list is used up.
        cycle: bool,
    },
}

impl RecommenderConfig {
    pub fn sequential_greedy() -> Self {
        Self::SequentialGreedy(SequentialGreedyConfig::default())
    }

    pub fn kmeans() -> Self {
        Self::KMeansClustering { max_iterations: 20 }
    }

    pub fn naive_hybrid(disc: RecommenderConfig, cont: RecommenderConfig) -> Self {
        Self::NaiveHybrid {
            disc_recommender: Box::new(disc),
            cont_recommender: Box::new(cont),
        }
    }

    /// Random initial phase followed by `recommender` once data is available.
    pub fn two_phase(recommender: RecommenderConfig) -> Self {
        Self::TwoPhase {
            initial_recommender: Box::new(Self::Random),
            recommender: Box::new(recommender),
            switch_after: 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Random => "RandomRecommender",
            Self::Fps => "FPSRecommender",
            Self::KMeansClustering { .. } => "KMeansClusteringRecommender",
            Self::SequentialGreedy(_) => "SequentialGreedyRecommender",
            Self::NaiveHybrid { .. } => "NaiveHybridSpaceRecommender",
            Self::TwoPhase { .. } => "TwoPhaseMetaRecommender",
            Self::Sequential { .. } => "SequentialMetaRecommender",
            Self::StreamingSequential { .. } => "StreamingSequentialMetaRecommender",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Random => "RR",
            Self::Fps => "FPS",
            Self::KMeansClustering { .. } => "KM",
            Self::SequentialGreedy(_) => "SG",
            Self::NaiveHybrid { .. } => "NH",
            Self::TwoPhase { .. } => "TwoPhase",
            Self::Sequential { .. } => "Seq",
            Self::StreamingSequential { .. } => "Stream",
        }
    }

    /// Compact, recursive label used in scenario identifiers.
    pub fn label(&self) -> String {
        let join = |configs: &[RecommenderConfig]| {
            configs
                .iter()
                .map(RecommenderConfig::label)
                .collect::<Vec<_>>()
                .join(",")
        };
        match self {
            Self::SequentialGreedy(config) => config.label(),
            Self::NaiveHybrid {
                disc_recommender,
                cont_recommender,
            } => format!("NH({},{})", disc_recommender.label(), cont_recommender.label()),
            Self::TwoPhase {
                initial_recommender,
                recommender,
                ..
            } => format!("TwoPhase({},{})", initial_recommender.label(), recommender.label()),
            Self::Sequential { recommenders, .. } => format!("Seq({})", join(recommenders)),
            Self::StreamingSequential { recommenders, .. } => {
                format!("Stream({})", join(recommenders))
            }
            other => other.abbreviation().to_string(),
        }
    }

    pub fn family(&self) -> RecommenderFamily {
        match self {
            Self::Random | Self::Fps | Self::KMeansClustering { .. } => {
                RecommenderFamily::NonPredictive
            }
            Self::SequentialGreedy(_) => RecommenderFamily::Bayesian,
            Self::NaiveHybrid { .. } => RecommenderFamily::Composite,
            Self::TwoPhase { .. } | Self::Sequential { .. } | Self::StreamingSequential { .. } => {
                RecommenderFamily::Meta
            }
        }
    }

    /// Declared compatibility of a pure recommender; for composites the
    /// widest type any of them could claim (use [`Self::supports`] to check).
    pub fn compatibility(&self) -> SearchSpaceType {
        match self {
            Self::Random => SearchSpaceType::Hybrid,
            Self::Fps | Self::KMeansClustering { .. } => SearchSpaceType::Discrete,
            Self::SequentialGreedy(_) => SearchSpaceType::Hybrid,
            Self::NaiveHybrid { .. }
            | Self::TwoPhase { .. }
            | Self::Sequential { .. }
            | Self::StreamingSequential { .. } => SearchSpaceType::Hybrid,
        }
    }

    /// Whether this configuration, including every nested part, can operate
    /// on a space of type `space`.
    pub fn supports(&self, space: SearchSpaceType) -> bool {
        match self {
            Self::Random
            | Self::Fps
            | Self::KMeansClustering { .. }
            | Self::SequentialGreedy(_) => {
                self.compatibility().supports(space)
            }
            Self::NaiveHybrid {
                disc_recommender,
                cont_recommender,
            } => match space {
                SearchSpaceType::Discrete => disc_recommender.supports(SearchSpaceType::Discrete),
                SearchSpaceType::Continuous => {
                    cont_recommender.supports(SearchSpaceType::Continuous)
                }
                SearchSpaceType::Hybrid => {
                    disc_recommender.supports(SearchSpaceType::Discrete)
                        && cont_recommender.supports(SearchSpaceType::Continuous)
                }
                SearchSpaceType::Either => false,
            },
            Self::TwoPhase {
                initial_recommender,
                recommender,
                ..
            } => initial_recommender.supports(space) && recommender.supports(space),
            Self::Sequential { recommenders, .. }
            | Self::StreamingSequential { recommenders, .. } => {
                !recommenders.is_empty() && recommenders.iter().all(|r| r.supports(space))
            }
        }
    }

    /// Validate and instantiate.
    pub fn build(&self) -> BhResult<Box<dyn Recommender>> {
        Ok(match self {
            Self::Random => Box::new(RandomRecommender),
            Self::Fps => Box::new(FpsRecommender),
            Self::KMeansClustering { max_iterations } => {
                Box::new(KMeansClusteringRecommender::new(*max_iterations)?)
            }
            Self::SequentialGreedy(config) => {
                Box::new(SequentialGreedyRecommender::new(config.clone())?)
            }
            Self::NaiveHybrid {
                disc_recommender,
                cont_recommender,
            } => Box::new(NaiveHybridSpaceRecommender::from_configs(
                disc_recommender,
                cont_recommender,
            )?),
            Self::TwoPhase {
                initial_recommender,
                recommender,
                switch_after,
            } => Box::new(TwoPhaseMetaRecommender::new(
                initial_recommender.build()?,
                recommender.build()?,
                *switch_after,
            )),
            Self::Sequential { recommenders, mode } => {
                let built = recommenders
                    .iter()
                    .map(RecommenderConfig::build)
                    .collect::<BhResult<Vec<_>>>()?;
                Box::new(SequentialMetaRecommender::new(built, *mode)?)
            }
            Self::StreamingSequential { recommenders, cycle } => {
                Box::new(StreamingSequentialMetaRecommender::from_configs(
                    recommenders.clone(),
                    *cycle,
                )?)
            }
        })
    }
}

/// Fail unless a recommender declaring `compatibility` can run on `space`.
pub(crate) fn ensure_compatible(
    name: &str,
    compatibility: SearchSpaceType,
    space: &SearchSpace,
) -> BhResult<SearchSpaceType> {
    let space_type = space.space_type()?;
    if !compatibility.supports(space_type) {
        return Err(RecommenderError::IncompatibleSearchSpace {
            recommender: name.to_string(),
            space: space_type,
        }
        .into());
    }
    Ok(space_type)
}

/// Discrete candidates of `ctx.space`, without already measured ones when the
/// space is purely discrete and repeats are not allowed.
pub(crate) fn available_candidates(ctx: &RecommendContext<'_>) -> BhResult<Vec<Point>> {
    let candidates = ctx.space.discrete_candidates();
    if ctx.allow_repeated || ctx.space.space_type()? != SearchSpaceType::Discrete {
        return Ok(candidates);
    }
    let measured: Vec<Point> = ctx
        .measurements
        .iter()
        .map(|m| ctx.space.project(&m.point))
        .collect();
    Ok(candidates
        .into_iter()
        .filter(|c| !measured.contains(c))
        .collect())
}

/// Encoded measurement features and their objective scores.
pub(crate) fn training_data(ctx: &RecommendContext<'_>) -> BhResult<(Vec<Vec<f64>>, Vec<f64>)> {
    let mut x = Vec::with_capacity(ctx.measurements.len());
    let mut y = Vec::with_capacity(ctx.measurements.len());
    for measurement in ctx.measurements {
        x.push(ctx.space.encode(&measurement.point)?);
        y.push(ctx.objective.score(&measurement.values)?);
    }
    Ok((x, y))
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Greedy farthest-point selection of `k` indices from `points`.
///
/// The first pick is the point farthest from `anchors`, or the first point if
/// there are no anchors.
pub(crate) fn farthest_point_indices(
    points: &[Vec<f64>],
    k: usize,
    anchors: &[Vec<f64>],
) -> Vec<usize> {
    let mut min_dist: Vec<f64> = points
        .iter()
        .map(|p| {
            anchors
                .iter()
                .map(|a| squared_distance(p, a))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    let mut chosen = Vec::with_capacity(k.min(points.len()));
    while chosen.len() < k.min(points.len()) {
        let next = if chosen.is_empty() && anchors.is_empty() {
            0
        } else {
            min_dist
                .iter()
                .enumerate()
                .filter(|(i, _)| !chosen.contains(i))
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0)
        };
        chosen.push(next);
        for (i, p) in points.iter().enumerate() {
            min_dist[i] = min_dist[i].min(squared_distance(p, &points[next]));
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farthest_points_spread_out() {
        let points: Vec<Vec<f64>> = (0..11).map(|i| vec![i as f64 / 10.0]).collect();
        let chosen = farthest_point_indices(&points, 3, &[]);
        assert_eq!(chosen, vec![0, 10, 5]);
    }

    #[test]
    fn farthest_points_avoid_anchors() {
        let points: Vec<Vec<f64>> = (0..11).map(|i| vec![i as f64 / 10.0]).collect();
        let chosen = farthest_point_indices(&points, 1, &[vec![0.0]]);
        assert_eq!(chosen, vec![10]);
    }

    #[test]
    fn naive_hybrid_support_follows_parts() {
        let naive = RecommenderConfig::naive_hybrid(
            RecommenderConfig::Fps,
            RecommenderConfig::sequential_greedy(),
        );
        assert!(naive.supports(SearchSpaceType::Hybrid));
        assert!(naive.supports(SearchSpaceType::Discrete));
        assert!(naive.supports(SearchSpaceType::Continuous));

        let broken = RecommenderConfig::naive_hybrid(
            RecommenderConfig::sequential_greedy(),
            RecommenderConfig::Fps,
        );
        assert!(!broken.supports(SearchSpaceType::Hybrid));
    }

    #[test]
    fn two_phase_support_is_intersection() {
        let wrapped = RecommenderConfig::two_phase(RecommenderConfig::Fps);
        assert!(wrapped.supports(SearchSpaceType::Discrete));
        assert!(!wrapped.supports(SearchSpaceType::Continuous));
        assert_eq!(wrapped.family(), RecommenderFamily::Meta);
        assert_eq!(wrapped.label(), "TwoPhase(RR,FPS)");
    }

    #[test]
    fn configs_round_trip_through_json() {
        let config = RecommenderConfig::two_phase(RecommenderConfig::naive_hybrid(
            RecommenderConfig::kmeans(),
            RecommenderConfig::sequential_greedy(),
        ));
        let json = serde_json::to_string(&config).unwrap();
        let back: RecommenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
