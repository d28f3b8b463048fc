//! Builds scenario groups from catalog entries and the fixed composition tables.

use std::collections::HashSet;

use tracing::debug;

use bh_optimizer::recommenders::{HybridSampler, SequentialGreedyConfig};
use bh_optimizer::{Kernel, Prior, RecommenderConfig, SurrogateConfig};
use bh_types::SearchSpaceType;

use crate::catalog::{Catalog, Predicate};
use crate::config::HarnessConfig;
use crate::errors::CatalogError;
use crate::fixtures::{DEFAULT_PARAMETERS, DEFAULT_TARGETS};
use crate::scenario::{Scenario, ScenarioGroup};

pub const CONTINUOUS_PARAMETERS: [&str; 2] = ["Conti_finite1", "Conti_finite2"];

pub const HYBRID_PARAMETERS: [&str; 5] = [
    "Categorical_1",
    "SomeSetting",
    "Num_disc_1",
    "Conti_finite1",
    "Conti_finite2",
];

/// (sampler, fraction) pairs for the sequential greedy hybrid sampler.
pub const SAMPLING_STRATEGIES: [(HybridSampler, f64); 6] = [
    (HybridSampler::None, 0.0),
    (HybridSampler::None, 1.0),
    (HybridSampler::Farthest, 0.2),
    (HybridSampler::Farthest, 0.5),
    (HybridSampler::Random, 0.2),
    (HybridSampler::Random, 0.5),
];

pub const TARGET_SETS: [&[&str]; 5] = [
    &["Target_max"],
    &["Target_min"],
    &["Target_match_bell"],
    &["Target_match_triangular"],
    &["Target_max_bounded", "Target_min_bounded"],
];

pub fn priors() -> Vec<Prior> {
    vec![
        Prior::gamma(3.0, 1.0),
        Prior::half_cauchy(2.0),
        Prior::half_normal(2.0),
        Prior::log_normal(1.0, 2.0),
        Prior::normal(1.0, 2.0),
        Prior::smoothed_box(0.0, 3.0, 0.1),
    ]
}

/// One Matern kernel per prior, used as the lengthscale prior.
pub fn base_kernels() -> Vec<Kernel> {
    priors().into_iter().map(|p| Kernel::matern(Some(p))).collect()
}

/// Every base kernel scaled with every prior as outputscale prior.
pub fn scale_kernels() -> Vec<Kernel> {
    base_kernels()
        .into_iter()
        .flat_map(|base| {
            priors()
                .into_iter()
                .map(move |q| Kernel::scale(base.clone(), Some(q)))
        })
        .collect()
}

pub fn all_kernels() -> Vec<Kernel> {
    let mut kernels = base_kernels();
    kernels.extend(scale_kernels());
    kernels
}

pub fn sampling_configs() -> Vec<SequentialGreedyConfig> {
    SAMPLING_STRATEGIES
        .iter()
        .map(|&(sampler, fraction)| {
            SequentialGreedyConfig::default().with_hybrid_sampling(sampler, fraction)
        })
        .collect()
}

/// Turns catalog entries into scenarios.
#[derive(Debug, Clone)]
pub struct Composer {
    catalog: Catalog,
    config: HarnessConfig,
}

impl Composer {
    pub fn new(catalog: Catalog, config: HarnessConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Wrap a bare recommender so its first batch comes from random sampling.
    pub fn wrap(&self, recommender: RecommenderConfig) -> RecommenderConfig {
        if self.config.two_phase_wrapping {
            RecommenderConfig::two_phase(recommender)
        } else {
            recommender
        }
    }

    /// Scenarios of every group, in group order.
    pub fn all(&self) -> Result<Vec<Scenario>, CatalogError> {
        let mut scenarios = Vec::new();
        for group in ScenarioGroup::ALL {
            scenarios.extend(self.group(group)?);
        }
        Ok(scenarios)
    }

    pub fn group(&self, group: ScenarioGroup) -> Result<Vec<Scenario>, CatalogError> {
        let scenarios = match group {
            ScenarioGroup::McAcquisitionFunction => self.acquisition_scenarios(group, true)?,
            ScenarioGroup::NonMcAcquisitionFunction => self.acquisition_scenarios(group, false)?,
            ScenarioGroup::Prior => priors()
                .into_iter()
                .map(|prior| {
                    let surrogate = SurrogateConfig::GaussianProcess {
                        kernel: Kernel::matern(Some(prior)),
                    };
                    self.bayesian(group, &prior.to_string(), surrogate)
                })
                .collect(),
            ScenarioGroup::Kernel => all_kernels()
                .into_iter()
                .map(|kernel| {
                    let label = kernel.to_string();
                    self.bayesian(group, &label, SurrogateConfig::GaussianProcess { kernel })
                })
                .collect(),
            ScenarioGroup::SurrogateModel => self
                .catalog
                .surrogates(&Predicate::All)?
                .into_iter()
                .map(|entry| self.bayesian(group, entry.abbreviation, entry.config))
                .collect(),
            ScenarioGroup::InitialRecommender => self
                .catalog
                .non_predictive_recommenders(&Predicate::All)?
                .into_iter()
                .map(|entry| {
                    let label = entry.config.label();
                    self.default_scenario(group, &label, entry.config)
                })
                .collect(),
            ScenarioGroup::Targets => TARGET_SETS
                .iter()
                .map(|targets| {
                    let recommender = self.wrap(RecommenderConfig::sequential_greedy());
                    let label = targets.join("+");
                    self.scenario(group, &label, &DEFAULT_PARAMETERS, targets, recommender)
                })
                .collect(),
            ScenarioGroup::RecommenderDiscrete => self.space_scenarios(
                group,
                &DEFAULT_PARAMETERS,
                self.recommenders_for(SearchSpaceType::Discrete)?,
            ),
            ScenarioGroup::RecommenderContinuous => self.space_scenarios(
                group,
                &CONTINUOUS_PARAMETERS,
                self.recommenders_for(SearchSpaceType::Continuous)?,
            ),
            ScenarioGroup::RecommenderHybrid => {
                self.space_scenarios(group, &HYBRID_PARAMETERS, self.hybrid_recommenders()?)
            }
            ScenarioGroup::MetaRecommenders => self
                .catalog
                .meta_recommenders(&Predicate::All)?
                .into_iter()
                .map(|entry| {
                    let label = entry.config.label();
                    self.default_scenario(group, &label, entry.config)
                })
                .collect(),
        };
        debug!(%group, count = scenarios.len(), "composed scenario group");
        Ok(scenarios)
    }

    fn scenario(
        &self,
        group: ScenarioGroup,
        abbreviation: &str,
        parameters: &[&str],
        targets: &[&str],
        recommender: RecommenderConfig,
    ) -> Scenario {
        let batch_size = match group {
            ScenarioGroup::NonMcAcquisitionFunction => 1,
            _ => self.config.default_batch_size,
        };
        Scenario::new(
            group,
            abbreviation,
            self.config.default_iterations,
            batch_size,
            parameters,
            targets,
            recommender,
        )
    }

    fn default_scenario(
        &self,
        group: ScenarioGroup,
        abbreviation: &str,
        recommender: RecommenderConfig,
    ) -> Scenario {
        self.scenario(group, abbreviation, &DEFAULT_PARAMETERS, &DEFAULT_TARGETS, recommender)
    }

    /// Wrapped sequential greedy scenario on the default fixtures.
    fn bayesian(
        &self,
        group: ScenarioGroup,
        abbreviation: &str,
        surrogate: SurrogateConfig,
    ) -> Scenario {
        let config = SequentialGreedyConfig::default().with_surrogate(surrogate);
        let recommender = self.wrap(RecommenderConfig::SequentialGreedy(config));
        self.default_scenario(group, abbreviation, recommender)
    }

    fn acquisition_scenarios(
        &self,
        group: ScenarioGroup,
        mc: bool,
    ) -> Result<Vec<Scenario>, CatalogError> {
        Ok(self
            .catalog
            .acquisition_functions(&Predicate::Mc(mc))?
            .into_iter()
            .map(|entry| {
                let config = SequentialGreedyConfig::default().with_acquisition(entry.config);
                let recommender = self.wrap(RecommenderConfig::SequentialGreedy(config));
                self.default_scenario(group, entry.abbreviation, recommender)
            })
            .collect())
    }

    /// Pure recommenders whose declared compatibility supports `space`.
    fn recommenders_for(
        &self,
        space: SearchSpaceType,
    ) -> Result<Vec<RecommenderConfig>, CatalogError> {
        Ok(self
            .catalog
            .pure_recommenders(&Predicate::CompatibleWith(space))?
            .into_iter()
            .map(|entry| entry.config)
            .collect())
    }

    /// Hybrid-capable pure recommenders, the sequential greedy sampling table,
    /// and every discrete-capable non-predictive or Bayesian recommender paired
    /// with a sequential greedy recommender for the continuous part.
    fn hybrid_recommenders(&self) -> Result<Vec<RecommenderConfig>, CatalogError> {
        let mut recommenders: Vec<RecommenderConfig> = self
            .catalog
            .pure_recommenders(&Predicate::CompatibilityIs(SearchSpaceType::Hybrid))?
            .into_iter()
            .map(|entry| entry.config)
            .collect();
        recommenders.extend(
            sampling_configs()
                .into_iter()
                .map(RecommenderConfig::SequentialGreedy),
        );

        let discrete = Predicate::CompatibleWith(SearchSpaceType::Discrete);
        let parts = self
            .catalog
            .non_predictive_recommenders(&discrete)?
            .into_iter()
            .chain(self.catalog.bayesian_recommenders(&discrete)?);
        recommenders.extend(parts.map(|entry| {
            RecommenderConfig::naive_hybrid(entry.config, RecommenderConfig::sequential_greedy())
        }));
        Ok(recommenders)
    }

    /// One wrapped scenario per recommender; duplicates by label are dropped.
    fn space_scenarios(
        &self,
        group: ScenarioGroup,
        parameters: &[&str],
        recommenders: Vec<RecommenderConfig>,
    ) -> Vec<Scenario> {
        let mut seen = HashSet::new();
        recommenders
            .into_iter()
            .filter(|r| seen.insert(r.label()))
            .map(|r| {
                let label = r.label();
                self.scenario(group, &label, parameters, &DEFAULT_TARGETS, self.wrap(r))
            })
            .collect()
    }
}
