use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bh_harness::{run_matrix, Catalog, Composer, HarnessConfig};

/// Runs the scenario matrix.
///
/// Configuration comes from the `BH_HARNESS_*` variables; a positional FILTER
/// overrides `BH_HARNESS_FILTER`.
#[derive(Parser, Debug)]
#[command(name = "bh-matrix", about = "Run the BayHarness scenario matrix")]
struct Args {
    /// Print the selected scenario ids without running them
    #[arg(long)]
    list: bool,

    /// Print the full matrix report as JSON
    #[arg(long)]
    json: bool,

    /// Only run scenarios whose id contains this substring
    filter: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = HarnessConfig::from_env().context("reading harness configuration")?;
    if let Some(filter) = args.filter {
        config = config.with_filter(filter);
    }

    let composer = Composer::new(Catalog::global(), config.clone());
    let scenarios = composer.all().context("composing scenarios")?;
    info!(scenarios = scenarios.len(), seed = config.seed, "scenario matrix composed");

    if args.list {
        for scenario in scenarios.iter().filter(|s| config.selects(&s.id)) {
            println!("{}", scenario.id);
        }
        return Ok(());
    }

    let report = run_matrix(&scenarios, &config);
    if args.json {
        println!("{}", report.to_json()?);
    }
    println!(
        "{} passed, {} failed, {} skipped",
        report.passed(),
        report.failures().len(),
        report.skipped()
    );
    if !report.is_success() {
        eprintln!("{}", report.failure_summary());
        bail!("{} scenario(s) failed", report.failures().len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_filter() {
        let args = Args::try_parse_from(["bh-matrix", "--list", "Kernel"]).unwrap();
        assert!(args.list);
        assert!(!args.json);
        assert_eq!(args.filter.as_deref(), Some("Kernel"));

        let args = Args::try_parse_from(["bh-matrix", "--json"]).unwrap();
        assert!(args.json);
        assert_eq!(args.filter, None);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Args::try_parse_from(["bh-matrix", "--verbose"]).is_err());
    }
}
