//! # bh-harness
//!
//! Combinatorial scenario-matrix regression harness for the BayHarness
//! optimization stack.
//!
//! The [`Catalog`] enumerates registered variants per capability, the
//! [`Composer`] nests them into [`Scenario`]s grouped by [`ScenarioGroup`], and
//! the runner drives each scenario through a few ask/observe rounds against a
//! fresh [`bh_optimizer::Campaign`].

pub mod catalog;
pub mod composer;
pub mod config;
pub mod errors;
pub mod fixtures;
pub mod runner;
pub mod scenario;

pub use catalog::{Catalog, CatalogEntry, Predicate};
pub use composer::Composer;
pub use config::HarnessConfig;
pub use errors::{CatalogError, IterationError};
pub use runner::{
    run_iterations, run_matrix, run_scenario, IterationReport, MatrixReport, ScenarioOutcome,
    ScenarioStatus,
};
pub use scenario::{Scenario, ScenarioGroup};
