//! Explicit registry of every concrete variant the library offers.
//!
//! Each capability (surrogates, recommenders, acquisition functions) keeps an
//! ordered, append-only list of [`VariantDescriptor`]s. Registration order is
//! the enumeration order, so anything derived from the registry (such as test
//! identifiers) is stable between runs.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use bh_types::{config_error, BhError, BhResult, SearchSpaceType};

use crate::acquisition::AcquisitionFunction;
use crate::recommenders::{RecommenderConfig, RecommenderFamily, SequenceMode};
use crate::surrogates::SurrogateConfig;

/// Concrete kind of a registered variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Surrogate,
    NonPredictive,
    Bayesian,
    Composite,
    Meta,
    Acquisition,
}

impl From<RecommenderFamily> for Family {
    fn from(family: RecommenderFamily) -> Self {
        match family {
            RecommenderFamily::NonPredictive => Self::NonPredictive,
            RecommenderFamily::Bayesian => Self::Bayesian,
            RecommenderFamily::Composite => Self::Composite,
            RecommenderFamily::Meta => Self::Meta,
        }
    }
}

/// Abstract capability; a category covers one or more families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Surrogate,
    PureRecommender,
    NonPredictiveRecommender,
    BayesianRecommender,
    MetaRecommender,
    AcquisitionFunction,
}

impl Category {
    pub fn includes(self, family: Family) -> bool {
        match self {
            Self::Surrogate => family == Family::Surrogate,
            Self::PureRecommender => matches!(
                family,
                Family::NonPredictive | Family::Bayesian | Family::Composite
            ),
            Self::NonPredictiveRecommender => family == Family::NonPredictive,
            Self::BayesianRecommender => family == Family::Bayesian,
            Self::MetaRecommender => family == Family::Meta,
            Self::AcquisitionFunction => family == Family::Acquisition,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Surrogate => "Surrogate",
            Self::PureRecommender => "PureRecommender",
            Self::NonPredictiveRecommender => "NonPredictiveRecommender",
            Self::BayesianRecommender => "BayesianRecommender",
            Self::MetaRecommender => "MetaRecommender",
            Self::AcquisitionFunction => "AcquisitionFunction",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered variant and the factory for its default configuration.
#[derive(Debug, Clone)]
pub struct VariantDescriptor<C> {
    pub name: &'static str,
    pub abbreviation: &'static str,
    pub family: Family,
    /// Declared search-space compatibility; `None` for non-recommenders.
    pub compatibility: Option<SearchSpaceType>,
    pub is_mc: bool,
    pub factory: fn() -> BhResult<C>,
}

/// Configuration types that can be held in the registry.
pub trait VariantConfig: Clone + Sized {
    /// Descriptors of this configuration type in `registry`.
    fn descriptors(registry: &Registry) -> &[VariantDescriptor<Self>];

    /// Validate by instantiating once.
    fn check(&self) -> BhResult<()>;
}

impl VariantConfig for SurrogateConfig {
    fn descriptors(registry: &Registry) -> &[VariantDescriptor<Self>] {
        &registry.surrogates
    }

    fn check(&self) -> BhResult<()> {
        self.build()?;
        Ok(())
    }
}

impl VariantConfig for RecommenderConfig {
    fn descriptors(registry: &Registry) -> &[VariantDescriptor<Self>] {
        &registry.recommenders
    }

    fn check(&self) -> BhResult<()> {
        self.build()?;
        Ok(())
    }
}

impl VariantConfig for AcquisitionFunction {
    fn descriptors(registry: &Registry) -> &[VariantDescriptor<Self>] {
        &registry.acquisition_functions
    }

    fn check(&self) -> BhResult<()> {
        self.validate().map_err(BhError::Config)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    surrogates: Vec<VariantDescriptor<SurrogateConfig>>,
    recommenders: Vec<VariantDescriptor<RecommenderConfig>>,
    acquisition_functions: Vec<VariantDescriptor<AcquisitionFunction>>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every variant this crate implements.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.surrogates = builtin_surrogates();
        registry.recommenders = builtin_recommenders();
        registry.acquisition_functions = builtin_acquisition_functions();
        registry
    }

    pub fn surrogates(&self) -> &[VariantDescriptor<SurrogateConfig>] {
        &self.surrogates
    }

    pub fn recommenders(&self) -> &[VariantDescriptor<RecommenderConfig>] {
        &self.recommenders
    }

    pub fn acquisition_functions(&self) -> &[VariantDescriptor<AcquisitionFunction>] {
        &self.acquisition_functions
    }

    pub fn register_surrogate(
        &mut self,
        descriptor: VariantDescriptor<SurrogateConfig>,
    ) -> BhResult<()> {
        push_unique(&mut self.surrogates, descriptor)
    }

    pub fn register_recommender(
        &mut self,
        descriptor: VariantDescriptor<RecommenderConfig>,
    ) -> BhResult<()> {
        push_unique(&mut self.recommenders, descriptor)
    }

    pub fn register_acquisition_function(
        &mut self,
        descriptor: VariantDescriptor<AcquisitionFunction>,
    ) -> BhResult<()> {
        push_unique(&mut self.acquisition_functions, descriptor)
    }

    /// Number of variants in `category`.
    pub fn count(&self, category: Category) -> usize {
        fn matching<C>(descriptors: &[VariantDescriptor<C>], category: Category) -> usize {
            descriptors.iter().filter(|d| category.includes(d.family)).count()
        }
        matching(&self.surrogates, category)
            + matching(&self.recommenders, category)
            + matching(&self.acquisition_functions, category)
    }
}

fn push_unique<C>(
    list: &mut Vec<VariantDescriptor<C>>,
    descriptor: VariantDescriptor<C>,
) -> BhResult<()> {
    if list.iter().any(|d| d.name == descriptor.name) {
        return Err(config_error!("variant {} is already registered", descriptor.name));
    }
    debug!(variant = descriptor.name, family = ?descriptor.family, "registered variant");
    list.push(descriptor);
    Ok(())
}

static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

/// Process-wide registry, populated with the builtin variants on first access.
pub fn registry() -> &'static RwLock<Registry> {
    REGISTRY.get_or_init(|| RwLock::new(Registry::builtin()))
}

pub fn register_surrogate(descriptor: VariantDescriptor<SurrogateConfig>) -> BhResult<()> {
    registry().write().register_surrogate(descriptor)
}

pub fn register_recommender(descriptor: VariantDescriptor<RecommenderConfig>) -> BhResult<()> {
    registry().write().register_recommender(descriptor)
}

pub fn register_acquisition_function(
    descriptor: VariantDescriptor<AcquisitionFunction>,
) -> BhResult<()> {
    registry().write().register_acquisition_function(descriptor)
}

// ---- builtin variants ----

fn surrogate(factory: fn() -> BhResult<SurrogateConfig>) -> VariantDescriptor<SurrogateConfig> {
    // Builtin factories never fail.
    let (name, abbreviation) = match factory() {
        Ok(config) => (config.name(), config.abbreviation()),
        Err(_) => ("", ""),
    };
    VariantDescriptor {
        name,
        abbreviation,
        family: Family::Surrogate,
        compatibility: None,
        is_mc: false,
        factory,
    }
}

fn builtin_surrogates() -> Vec<VariantDescriptor<SurrogateConfig>> {
    vec![
        surrogate(|| Ok(SurrogateConfig::default())),
        surrogate(|| Ok(SurrogateConfig::BayesianLinear)),
        surrogate(|| Ok(SurrogateConfig::MeanPrediction)),
    ]
}

fn recommender(
    factory: fn() -> BhResult<RecommenderConfig>,
) -> VariantDescriptor<RecommenderConfig> {
    let (name, abbreviation, family, compatibility) = match factory() {
        Ok(config) => (
            config.name(),
            config.abbreviation(),
            config.family().into(),
            Some(config.compatibility()),
        ),
        Err(_) => ("", "", Family::Meta, None),
    };
    VariantDescriptor {
        name,
        abbreviation,
        family,
        compatibility,
        is_mc: false,
        factory,
    }
}

fn builtin_recommenders() -> Vec<VariantDescriptor<RecommenderConfig>> {
    vec![
        recommender(|| Ok(RecommenderConfig::Random)),
        recommender(|| Ok(RecommenderConfig::Fps)),
        recommender(|| Ok(RecommenderConfig::kmeans())),
        recommender(|| Ok(RecommenderConfig::sequential_greedy())),
        recommender(|| {
            Ok(RecommenderConfig::naive_hybrid(
                RecommenderConfig::sequential_greedy(),
                RecommenderConfig::sequential_greedy(),
            ))
        }),
        recommender(|| Ok(RecommenderConfig::two_phase(RecommenderConfig::sequential_greedy()))),
        recommender(|| {
            Ok(RecommenderConfig::Sequential {
                recommenders: vec![
                    RecommenderConfig::Random,
                    RecommenderConfig::sequential_greedy(),
                ],
                mode: SequenceMode::ReuseLast,
            })
        }),
        recommender(|| {
            Ok(RecommenderConfig::StreamingSequential {
                recommenders: vec![
                    RecommenderConfig::Random,
                    RecommenderConfig::sequential_greedy(),
                ],
                cycle: true,
            })
        }),
    ]
}

fn acquisition(
    function: AcquisitionFunction,
    factory: fn() -> BhResult<AcquisitionFunction>,
) -> VariantDescriptor<AcquisitionFunction> {
    VariantDescriptor {
        name: function.name(),
        abbreviation: function.abbreviation(),
        family: Family::Acquisition,
        compatibility: None,
        is_mc: function.is_mc(),
        factory,
    }
}

/// Exploration weight used by the default UCB variants.
pub const DEFAULT_UCB_BETA: f64 = 0.2;

fn builtin_acquisition_functions() -> Vec<VariantDescriptor<AcquisitionFunction>> {
    use AcquisitionFunction as A;
    vec![
        acquisition(A::PosteriorMean, || Ok(A::PosteriorMean)),
        acquisition(A::ExpectedImprovement, || Ok(A::ExpectedImprovement)),
        acquisition(A::LogExpectedImprovement, || Ok(A::LogExpectedImprovement)),
        acquisition(A::ProbabilityOfImprovement, || Ok(A::ProbabilityOfImprovement)),
        acquisition(
            A::UpperConfidenceBound { beta: DEFAULT_UCB_BETA },
            || Ok(A::UpperConfidenceBound { beta: DEFAULT_UCB_BETA }),
        ),
        acquisition(A::QExpectedImprovement, || Ok(A::QExpectedImprovement)),
        acquisition(A::QLogExpectedImprovement, || Ok(A::QLogExpectedImprovement)),
        acquisition(A::QNoisyExpectedImprovement, || Ok(A::QNoisyExpectedImprovement)),
        acquisition(A::QProbabilityOfImprovement, || Ok(A::QProbabilityOfImprovement)),
        acquisition(
            A::QUpperConfidenceBound { beta: DEFAULT_UCB_BETA },
            || Ok(A::QUpperConfidenceBound { beta: DEFAULT_UCB_BETA }),
        ),
        acquisition(A::QSimpleRegret, || Ok(A::QSimpleRegret)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_counts_per_category() {
        let registry = Registry::builtin();
        assert_eq!(registry.count(Category::Surrogate), 3);
        assert_eq!(registry.count(Category::AcquisitionFunction), 11);
        assert_eq!(registry.count(Category::NonPredictiveRecommender), 3);
        assert_eq!(registry.count(Category::BayesianRecommender), 1);
        assert_eq!(registry.count(Category::PureRecommender), 5);
        assert_eq!(registry.count(Category::MetaRecommender), 3);
    }

    #[test]
    fn builtin_metadata_matches_configs() {
        let registry = Registry::builtin();
        let fps = &registry.recommenders()[1];
        assert_eq!(fps.name, "FPSRecommender");
        assert_eq!(fps.compatibility, Some(SearchSpaceType::Discrete));

        let mc: Vec<_> = registry
            .acquisition_functions()
            .iter()
            .filter(|d| d.is_mc)
            .map(|d| d.abbreviation)
            .collect();
        assert_eq!(mc, vec!["qEI", "qLogEI", "qNEI", "qPI", "qUCB", "qSR"]);
    }

    #[test]
    fn every_builtin_factory_checks() {
        let registry = Registry::builtin();
        for d in registry.surrogates() {
            (d.factory)().unwrap().check().unwrap();
        }
        for d in registry.recommenders() {
            (d.factory)().unwrap().check().unwrap();
        }
        for d in registry.acquisition_functions() {
            (d.factory)().unwrap().check().unwrap();
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = Registry::builtin();
        let duplicate = registry.recommenders()[0].clone();
        assert!(registry.register_recommender(duplicate).is_err());
        assert_eq!(registry.recommenders().len(), 8);
    }

    #[test]
    fn pure_recommender_covers_three_families() {
        assert!(Category::PureRecommender.includes(Family::Composite));
        assert!(!Category::PureRecommender.includes(Family::Meta));
        assert!(!Category::Surrogate.includes(Family::Acquisition));
    }
}
