//! # bh-optimizer
//!
//! Compact Bayesian-optimization stack for BayHarness.
//!
//! Provides search spaces, priors and kernels, surrogate models, acquisition
//! functions, pure and meta recommenders, the ask/observe [`Campaign`], and an
//! explicit [`Registry`] of every concrete variant.

pub mod acquisition;
pub mod campaign;
pub mod kernels;
pub mod priors;
pub mod recommenders;
pub mod registry;
pub mod search;
mod stats;
pub mod surrogates;

pub use acquisition::AcquisitionFunction;
pub use campaign::{Campaign, CampaignId};
pub use kernels::Kernel;
pub use priors::Prior;
pub use recommenders::{
    FpsRecommender, HybridSampler, KMeansClusteringRecommender, NaiveHybridSpaceRecommender,
    RandomRecommender, RecommendContext, Recommender, RecommenderConfig, RecommenderFamily,
    SequenceMode, SequentialGreedyConfig, SequentialGreedyRecommender, SequentialMetaRecommender,
    StreamingSequentialMetaRecommender, TwoPhaseMetaRecommender,
};
pub use registry::{registry, Category, Family, Registry, VariantConfig, VariantDescriptor};
pub use search::{ParameterBounds, SearchSpace};
pub use surrogates::{
    BayesianLinearSurrogate, GaussianProcessSurrogate, MeanPredictionSurrogate, Posterior,
    Surrogate, SurrogateConfig,
};
