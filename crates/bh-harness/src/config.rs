//! Harness configuration, optionally read from `BH_HARNESS_*` environment variables.

use serde::{Deserialize, Serialize};

use bh_types::{config_error, BhResult};

pub const ENV_SEED: &str = "BH_HARNESS_SEED";
pub const ENV_SKIP_SLOW: &str = "BH_HARNESS_SKIP_SLOW";
pub const ENV_TWO_PHASE: &str = "BH_HARNESS_TWO_PHASE";
pub const ENV_FILTER: &str = "BH_HARNESS_FILTER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Base seed; each scenario derives its own seed from this and its id.
    pub seed: u64,

    /// Skip scenarios marked slow.
    pub skip_slow: bool,

    /// Wrap every bare recommender under test as `TwoPhase(Random, recommender)`
    /// so that data-hungry recommenders see measurements from round two on.
    pub two_phase_wrapping: bool,

    pub default_iterations: usize,
    pub default_batch_size: usize,

    /// Only run scenarios whose id contains this substring.
    pub filter: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            skip_slow: false,
            two_phase_wrapping: true,
            default_iterations: 3,
            default_batch_size: 3,
            filter: None,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> BhResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> BhResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_SEED) {
            config.seed = raw
                .trim()
                .parse()
                .map_err(|e| config_error!("{ENV_SEED}={raw}: {e}"))?;
        }
        if let Some(raw) = lookup(ENV_SKIP_SLOW) {
            config.skip_slow = parse_flag(ENV_SKIP_SLOW, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TWO_PHASE) {
            config.two_phase_wrapping = parse_flag(ENV_TWO_PHASE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FILTER) {
            let raw = raw.trim();
            if !raw.is_empty() {
                config.filter = Some(raw.to_string());
            }
        }
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_skip_slow(mut self, skip: bool) -> Self {
        self.skip_slow = skip;
        self
    }

    pub fn with_two_phase_wrapping(mut self, wrap: bool) -> Self {
        self.two_phase_wrapping = wrap;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.default_iterations = n;
        self
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.default_batch_size = n;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Whether `id` passes the configured filter.
    pub fn selects(&self, id: &str) -> bool {
        self.filter.as_deref().map_or(true, |f| id.contains(f))
    }
}

fn parse_flag(key: &str, raw: &str) -> BhResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(config_error!("{key}: expected a boolean, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = HarnessConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.seed, 1337);
        assert!(config.two_phase_wrapping);
        assert_eq!((config.default_iterations, config.default_batch_size), (3, 3));
    }

    #[test]
    fn environment_overrides() {
        let config = HarnessConfig::from_lookup(lookup(&[
            (ENV_SEED, "42"),
            (ENV_SKIP_SLOW, "yes"),
            (ENV_TWO_PHASE, "0"),
            (ENV_FILTER, "Kernel"),
        ]))
        .unwrap();
        assert_eq!(config.seed, 42);
        assert!(config.skip_slow);
        assert!(!config.two_phase_wrapping);
        assert!(config.selects("Kernel[Matern(-)-i3-b3]"));
        assert!(!config.selects("Prior[Gamma(3,1)-i3-b3]"));
    }

    #[test]
    fn malformed_values_are_config_errors() {
        assert!(HarnessConfig::from_lookup(lookup(&[(ENV_SEED, "abc")])).is_err());
        assert!(HarnessConfig::from_lookup(lookup(&[(ENV_SKIP_SLOW, "maybe")])).is_err());
    }

    #[test]
    fn serializes_to_json() {
        let config = HarnessConfig::default().with_filter("Meta").with_seed(7);
        let json = serde_json::to_string(&config).unwrap();
        let back: HarnessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
