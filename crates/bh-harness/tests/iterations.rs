//! Scenario matrix: every recommender, surrogate, acquisition function, kernel,
//! prior and target configuration runs a few ask/observe rounds.
//!
//! Slow groups honour `BH_HARNESS_SKIP_SLOW`; `RUST_LOG` controls tracing output.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use bh_harness::catalog::{Catalog, Predicate};
use bh_harness::fixtures;
use bh_harness::{run_iterations, run_matrix, Composer, HarnessConfig, ScenarioGroup};
use bh_optimizer::{Campaign, RecommenderConfig, Registry};
use bh_types::SearchSpaceType;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> HarnessConfig {
    HarnessConfig::from_env().expect("valid BH_HARNESS_* environment")
}

fn composer() -> Composer {
    Composer::new(Catalog::new(Registry::builtin()), config())
}

fn run_group(group: ScenarioGroup) {
    init_tracing();
    let composer = composer();
    let scenarios = composer.group(group).expect("catalog builds");
    assert!(!scenarios.is_empty(), "{group} composed no scenarios");

    let report = run_matrix(&scenarios, composer.config());
    assert!(
        report.is_success(),
        "{} of {} {group} scenarios failed:\n{}",
        report.failures().len(),
        scenarios.len(),
        report.failure_summary()
    );
    for outcome in report.outcomes.iter().filter(|o| o.passed()) {
        if let bh_harness::ScenarioStatus::Passed(iterations) = &outcome.status {
            let scenario = scenarios.iter().find(|s| s.id == outcome.id).unwrap();
            assert_eq!(iterations.rounds, scenario.n_iterations);
            assert!(iterations
                .candidates_per_round
                .iter()
                .all(|&n| n == scenario.batch_size));
        }
    }
}

#[test]
fn mc_acquisition_functions() {
    run_group(ScenarioGroup::McAcquisitionFunction);
}

#[test]
fn non_mc_acquisition_functions() {
    run_group(ScenarioGroup::NonMcAcquisitionFunction);
}

#[test]
fn priors() {
    run_group(ScenarioGroup::Prior);
}

#[test]
fn kernels() {
    run_group(ScenarioGroup::Kernel);
}

#[test]
fn surrogate_models() {
    run_group(ScenarioGroup::SurrogateModel);
}

#[test]
fn initial_recommenders() {
    run_group(ScenarioGroup::InitialRecommender);
}

#[test]
fn targets() {
    run_group(ScenarioGroup::Targets);
}

#[test]
fn recommenders_discrete() {
    run_group(ScenarioGroup::RecommenderDiscrete);
}

#[test]
fn recommenders_continuous() {
    run_group(ScenarioGroup::RecommenderContinuous);
}

#[test]
fn recommenders_hybrid() {
    run_group(ScenarioGroup::RecommenderHybrid);
}

#[test]
fn meta_recommenders() {
    run_group(ScenarioGroup::MetaRecommenders);
}

#[test]
fn every_scenario_supports_its_search_space() {
    let scenarios = composer().all().unwrap();
    for scenario in &scenarios {
        let space_type = scenario.space_type().unwrap();
        assert!(
            scenario.recommender.supports(space_type),
            "{} does not support {space_type}",
            scenario.id
        );
    }
}

#[test]
fn scenario_ids_are_unique_and_stable() {
    let first: Vec<String> = composer().all().unwrap().into_iter().map(|s| s.id).collect();
    let second: Vec<String> = composer().all().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(first, second);
    let unique: HashSet<&String> = first.iter().collect();
    assert_eq!(unique.len(), first.len());
}

#[test]
fn catalog_is_idempotent() {
    let catalog = Catalog::global();
    let a = catalog.pure_recommenders(&Predicate::All).unwrap();
    let b = catalog.pure_recommenders(&Predicate::All).unwrap();
    assert_eq!(a, b);
    let c = catalog.acquisition_functions(&Predicate::Mc(true)).unwrap();
    let d = catalog.acquisition_functions(&Predicate::Mc(true)).unwrap();
    assert_eq!(c, d);
}

#[test]
fn end_to_end_discrete_campaign() {
    init_tracing();
    let space = fixtures::search_space(&fixtures::DEFAULT_PARAMETERS).unwrap();
    assert_eq!(space.space_type().unwrap(), SearchSpaceType::Discrete);
    let objective = fixtures::objective(&["Target_max"]).unwrap();
    let recommender = RecommenderConfig::two_phase(RecommenderConfig::sequential_greedy());
    let mut campaign = Campaign::new(space, objective, recommender, 2024).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let report = run_iterations(&mut campaign, 3, 2, &mut rng).unwrap();
    assert_eq!(report.rounds, 3);
    assert_eq!(report.candidates_per_round, vec![2, 2, 2]);
    assert_eq!(campaign.measurements().len(), 6);
    assert_eq!(campaign.n_batches_done(), 3);
}
