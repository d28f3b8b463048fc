//! Scenario records: one recommender configuration exercised on one fixture setup.

use serde::{Deserialize, Serialize};

use bh_optimizer::{RecommenderConfig, SearchSpace};
use bh_types::{BhResult, Objective, SearchSpaceType};

use crate::fixtures;

/// Named families of scenarios, each produced by its own generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioGroup {
    McAcquisitionFunction,
    NonMcAcquisitionFunction,
    Prior,
    Kernel,
    SurrogateModel,
    InitialRecommender,
    Targets,
    RecommenderDiscrete,
    RecommenderContinuous,
    RecommenderHybrid,
    MetaRecommenders,
}

impl ScenarioGroup {
    pub const ALL: [ScenarioGroup; 11] = [
        Self::McAcquisitionFunction,
        Self::NonMcAcquisitionFunction,
        Self::Prior,
        Self::Kernel,
        Self::SurrogateModel,
        Self::InitialRecommender,
        Self::Targets,
        Self::RecommenderDiscrete,
        Self::RecommenderContinuous,
        Self::RecommenderHybrid,
        Self::MetaRecommenders,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::McAcquisitionFunction => "McAcquisitionFunction",
            Self::NonMcAcquisitionFunction => "NonMcAcquisitionFunction",
            Self::Prior => "Prior",
            Self::Kernel => "Kernel",
            Self::SurrogateModel => "SurrogateModel",
            Self::InitialRecommender => "InitialRecommender",
            Self::Targets => "Targets",
            Self::RecommenderDiscrete => "RecommenderDiscrete",
            Self::RecommenderContinuous => "RecommenderContinuous",
            Self::RecommenderHybrid => "RecommenderHybrid",
            Self::MetaRecommenders => "MetaRecommenders",
        }
    }

    pub fn is_slow(self) -> bool {
        !matches!(self, Self::MetaRecommenders)
    }
}

impl std::fmt::Display for ScenarioGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// `<group>[<abbreviation>-i<n>-b<batch>]`, unique within a matrix.
    pub id: String,
    pub group: ScenarioGroup,
    pub slow: bool,
    pub n_iterations: usize,
    pub batch_size: usize,
    pub parameter_names: Vec<String>,
    pub target_names: Vec<String>,
    pub recommender: RecommenderConfig,
}

impl Scenario {
    pub fn new(
        group: ScenarioGroup,
        abbreviation: &str,
        n_iterations: usize,
        batch_size: usize,
        parameter_names: &[&str],
        target_names: &[&str],
        recommender: RecommenderConfig,
    ) -> Self {
        Self {
            id: scenario_id(group, abbreviation, n_iterations, batch_size),
            group,
            slow: group.is_slow(),
            n_iterations,
            batch_size,
            parameter_names: parameter_names.iter().map(|s| s.to_string()).collect(),
            target_names: target_names.iter().map(|s| s.to_string()).collect(),
            recommender,
        }
    }

    pub fn search_space(&self) -> BhResult<SearchSpace> {
        fixtures::search_space(&self.parameter_names)
    }

    pub fn objective(&self) -> BhResult<Objective> {
        fixtures::objective(&self.target_names)
    }

    pub fn space_type(&self) -> BhResult<SearchSpaceType> {
        Ok(self.search_space()?.space_type()?)
    }
}

pub fn scenario_id(
    group: ScenarioGroup,
    abbreviation: &str,
    n_iterations: usize,
    batch_size: usize,
) -> String {
    format!("{group}[{abbreviation}-i{n_iterations}-b{batch_size}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_format() {
        let scenario = Scenario::new(
            ScenarioGroup::MetaRecommenders,
            "Seq(RR,SG)",
            3,
            3,
            &fixtures::DEFAULT_PARAMETERS,
            &fixtures::DEFAULT_TARGETS,
            RecommenderConfig::Random,
        );
        assert_eq!(scenario.id, "MetaRecommenders[Seq(RR,SG)-i3-b3]");
        assert!(!scenario.slow);
        assert_eq!(scenario.space_type().unwrap(), SearchSpaceType::Discrete);
    }

    #[test]
    fn only_meta_group_is_fast() {
        let fast: Vec<_> = ScenarioGroup::ALL.iter().filter(|g| !g.is_slow()).collect();
        assert_eq!(fast, vec![&ScenarioGroup::MetaRecommenders]);
    }
}
