//! Runs scenarios: a fixed number of ask/observe rounds per scenario, and whole
//! matrices with per-scenario isolation.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use bh_optimizer::Campaign;
use bh_types::BhResult;

use crate::config::HarnessConfig;
use crate::errors::IterationError;
use crate::fixtures;
use crate::scenario::{Scenario, ScenarioGroup};

/// What happened during [`run_iterations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationReport {
    pub rounds: usize,
    /// Number of candidates recommended in each round.
    pub candidates_per_round: Vec<usize>,
    pub total_measurements: usize,
}

/// Drive `campaign` through `n_iterations` rounds of `batch_size` points each,
/// answering every recommendation with fake measurements drawn from `rng`.
pub fn run_iterations<R: Rng + ?Sized>(
    campaign: &mut Campaign,
    n_iterations: usize,
    batch_size: usize,
    rng: &mut R,
) -> Result<IterationReport, IterationError> {
    let mut candidates_per_round = Vec::with_capacity(n_iterations);
    for round in 1..=n_iterations {
        let points = campaign
            .recommend(batch_size)
            .map_err(|source| IterationError::Recommend { round, source })?;
        if points.len() != batch_size {
            return Err(IterationError::BatchSizeMismatch {
                round,
                expected: batch_size,
                actual: points.len(),
            });
        }
        candidates_per_round.push(points.len());

        let measurements =
            fixtures::fake_measurements(points, campaign.objective(), round, &mut *rng);
        campaign
            .add_measurements(measurements)
            .map_err(|source| IterationError::Measure { round, source })?;
        debug!(round, batch_size, total = campaign.measurements().len(), "round complete");
    }

    Ok(IterationReport {
        rounds: n_iterations,
        candidates_per_round,
        total_measurements: campaign.measurements().len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenarioStatus {
    Passed(IterationReport),
    /// Campaign construction or an iteration failed.
    Failed { error: String },
    Panicked { message: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub id: String,
    pub group: ScenarioGroup,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed(_))
    }

    pub fn failed(&self) -> bool {
        matches!(
            self.status,
            ScenarioStatus::Failed { .. } | ScenarioStatus::Panicked { .. }
        )
    }

    pub fn skipped(&self) -> bool {
        matches!(self.status, ScenarioStatus::Skipped { .. })
    }

    fn skip(scenario: &Scenario, reason: &str) -> Self {
        Self {
            id: scenario.id.clone(),
            group: scenario.group,
            status: ScenarioStatus::Skipped {
                reason: reason.to_string(),
            },
            duration_ms: 0,
        }
    }
}

/// Seed for one scenario: the base seed mixed with an FNV-1a hash of its id,
/// so results do not depend on which other scenarios run.
pub fn scenario_seed(base: u64, id: &str) -> u64 {
    let hash = id.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    base ^ hash
}

/// Build the scenario's campaign from fixtures and run it, turning errors and
/// panics into a [`ScenarioOutcome`].
pub fn run_scenario(scenario: &Scenario, config: &HarnessConfig) -> ScenarioOutcome {
    info!(scenario = %scenario.id, "scenario started");
    let started = Instant::now();
    let seed = scenario_seed(config.seed, &scenario.id);

    let result = panic::catch_unwind(AssertUnwindSafe(|| execute(scenario, seed)));
    let status = match result {
        Ok(Ok(report)) => ScenarioStatus::Passed(report),
        Ok(Err(error)) => {
            warn!(scenario = %scenario.id, %error, "scenario failed");
            ScenarioStatus::Failed { error }
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(scenario = %scenario.id, %message, "scenario panicked");
            ScenarioStatus::Panicked { message }
        }
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    info!(
        scenario = %scenario.id,
        passed = matches!(status, ScenarioStatus::Passed(_)),
        duration_ms,
        "scenario finished"
    );
    ScenarioOutcome {
        id: scenario.id.clone(),
        group: scenario.group,
        status,
        duration_ms,
    }
}

fn execute(scenario: &Scenario, seed: u64) -> Result<IterationReport, String> {
    let space = scenario.search_space().map_err(|e| e.to_string())?;
    let objective = scenario.objective().map_err(|e| e.to_string())?;
    let mut campaign = Campaign::new(space, objective, scenario.recommender.clone(), seed)
        .map_err(|e| e.to_string())?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    run_iterations(&mut campaign, scenario.n_iterations, scenario.batch_size, &mut rng)
        .map_err(|e| e.to_string())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Outcomes of a matrix run, in scenario order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixReport {
    pub outcomes: Vec<ScenarioOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MatrixReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.skipped()).count()
    }

    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes.iter().filter(|o| o.failed()).collect()
    }

    pub fn failing_ids(&self) -> Vec<&str> {
        self.failures().into_iter().map(|o| o.id.as_str()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn to_json(&self) -> BhResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One line per failure: `<id>: <error>`.
    pub fn failure_summary(&self) -> String {
        self.failures()
            .iter()
            .map(|o| match &o.status {
                ScenarioStatus::Failed { error } => format!("{}: {}", o.id, error),
                ScenarioStatus::Panicked { message } => format!("{}: panicked: {}", o.id, message),
                _ => o.id.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run `scenarios` one after another. A failing scenario never stops the rest.
pub fn run_matrix(scenarios: &[Scenario], config: &HarnessConfig) -> MatrixReport {
    let started_at = Utc::now();
    let outcomes: Vec<ScenarioOutcome> = scenarios
        .iter()
        .map(|scenario| {
            if !config.selects(&scenario.id) {
                ScenarioOutcome::skip(scenario, "filtered")
            } else if scenario.slow && config.skip_slow {
                ScenarioOutcome::skip(scenario, "slow")
            } else {
                run_scenario(scenario, config)
            }
        })
        .collect();

    let report = MatrixReport {
        outcomes,
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        total = report.outcomes.len(),
        passed = report.passed(),
        failed = report.failures().len(),
        skipped = report.skipped(),
        "matrix finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use bh_optimizer::RecommenderConfig;
    use crate::fixtures::{DEFAULT_PARAMETERS, DEFAULT_TARGETS};

    fn scenario(group: ScenarioGroup, recommender: RecommenderConfig) -> Scenario {
        let label = recommender.label();
        Scenario::new(group, &label, 2, 2, &DEFAULT_PARAMETERS, &DEFAULT_TARGETS, recommender)
    }

    #[test]
    fn bare_bayesian_recommender_fails_in_first_round() {
        let scenario = scenario(
            ScenarioGroup::RecommenderDiscrete,
            RecommenderConfig::sequential_greedy(),
        );
        let outcome = run_scenario(&scenario, &HarnessConfig::default());
        match outcome.status {
            ScenarioStatus::Failed { error } => {
                assert!(error.starts_with("Round 1"), "{error}");
                assert!(error.contains("training data"), "{error}");
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn failures_do_not_stop_the_matrix() {
        let scenarios = vec![
            scenario(ScenarioGroup::RecommenderDiscrete, RecommenderConfig::sequential_greedy()),
            scenario(
                ScenarioGroup::MetaRecommenders,
                RecommenderConfig::two_phase(RecommenderConfig::Fps),
            ),
        ];
        let report = run_matrix(&scenarios, &HarnessConfig::default());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failing_ids(), vec!["RecommenderDiscrete[SG-i2-b2]"]);
        assert_eq!(report.passed(), 1);
        assert!(report.failure_summary().contains("RecommenderDiscrete[SG-i2-b2]: Round 1"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["outcomes"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn skip_slow_and_filter() {
        let scenarios = vec![
            scenario(ScenarioGroup::Kernel, RecommenderConfig::Random),
            scenario(ScenarioGroup::MetaRecommenders, RecommenderConfig::Random),
            scenario(ScenarioGroup::MetaRecommenders, RecommenderConfig::Fps),
        ];
        let config = HarnessConfig::default().with_skip_slow(true).with_filter("RR");
        let report = run_matrix(&scenarios, &config);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.passed(), 1);
        assert!(report.outcomes[1].passed());
    }

    #[test]
    fn scenario_seed_depends_on_id() {
        assert_eq!(scenario_seed(1, "a"), scenario_seed(1, "a"));
        assert_ne!(scenario_seed(1, "a"), scenario_seed(1, "b"));
        assert_ne!(scenario_seed(1, "a"), scenario_seed(2, "a"));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload = panic::catch_unwind(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 1");
        let payload = panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
