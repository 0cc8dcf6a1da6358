// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Sweep Driver
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! `ssvk`: run one experiment over a range of problem sizes, write the
//! result table (CSV + JSON) and figures, print a summary.
//!
//! Exit codes: 0 success, 1 invalid arguments, 2 all samples failed,
//! 3 partial success (timeouts, numerical breakdowns, cancellation).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueHint};
use tracing_subscriber::EnvFilter;

use ssvk_orchestrator::{
    parse_n_range, ExperimentKind, Orchestrator, SweepPlan, SweepReport, EXIT_ALL_FAILED,
    EXIT_INVALID_ARGUMENTS,
};
use ssvk_types::{SsvkConfig, SsvkError, SsvkResult};

const ENV_OUT_DIR: &str = "SSVK_OUT_DIR";
const ENV_SEED: &str = "SSVK_SEED";

#[derive(Parser, Debug)]
#[command(
    name = "ssvk",
    version,
    about = "Spectral/statistical validation sweeps"
)]
struct Cli {
    /// Experiment id: sat-gap, critical-instant, gue-surmise, geometric
    #[arg(long)]
    experiment: ExperimentKind,

    /// Problem sizes as A:B:step (inclusive)
    #[arg(long = "n-range", value_name = "A:B:STEP")]
    n_range: String,

    /// Samples per problem size
    #[arg(long, value_name = "K", default_value_t = 1)]
    samples: usize,

    /// Master seed (overridden by SSVK_SEED)
    #[arg(long, value_name = "S")]
    seed: Option<u64>,

    /// Output directory (overridden by SSVK_OUT_DIR)
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    out: Option<PathBuf>,

    /// Worker threads across sweep samples
    #[arg(long, value_name = "P", default_value_t = 1)]
    parallel: usize,

    /// Per-sample timeout in seconds
    #[arg(long, value_name = "SEC")]
    timeout: Option<f64>,

    /// JSON configuration file applied before the flags
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Skip PNG figures
    #[arg(long)]
    no_figures: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Config file, then flags, then environment.
fn resolve_config<F>(cli: &Cli, env: F) -> SsvkResult<SsvkConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                SsvkError::Config(format!("cannot read config {}: {e}", path.display()))
            })?;
            SsvkConfig::from_json(&text)?
        }
        None => SsvkConfig::default(),
    };

    if let Some(seed) = cli.seed {
        cfg.seed = Some(seed);
    }
    if let Some(out) = &cli.out {
        cfg.out_dir = out.clone();
    }
    if let Some(secs) = cli.timeout {
        if !(secs.is_finite() && secs >= 0.0) {
            return Err(SsvkError::InvalidParameters(format!(
                "--timeout must be finite and >= 0, got {secs}"
            )));
        }
        cfg.sample_timeout_ms = (secs * 1000.0).round() as u64;
    }
    if cli.no_figures {
        cfg.emit_figures = false;
    }

    if let Some(dir) = env(ENV_OUT_DIR).filter(|d| !d.trim().is_empty()) {
        cfg.out_dir = PathBuf::from(dir);
    }
    if let Some(raw) = env(ENV_SEED).filter(|s| !s.trim().is_empty()) {
        let seed = raw.trim().parse::<u64>().map_err(|e| {
            SsvkError::InvalidParameters(format!("{ENV_SEED}={raw:?} is not a u64: {e}"))
        })?;
        cfg.seed = Some(seed);
    }
    cfg.validate()?;
    Ok(cfg)
}

fn plan_from(cli: &Cli) -> SsvkResult<SweepPlan> {
    let plan = SweepPlan::new(cli.experiment, parse_n_range(&cli.n_range)?, cli.samples)
        .with_parallel(cli.parallel);
    plan.validate()?;
    Ok(plan)
}

fn print_report(report: &SweepReport) {
    println!(
        "run {}  experiment {}  seed {}",
        report.run_id, report.experiment, report.seed
    );
    let gaps = report.table.gap_rows();
    if !gaps.is_empty() {
        println!("{:>8} {:>14} {:>8} {:>7}", "N", "mean gap", "samples", "failed");
        for row in &gaps {
            let mean = row
                .mean_gap
                .map_or_else(|| "-".to_string(), |g| format!("{g:.6e}"));
            println!(
                "{:>8} {:>14} {:>8} {:>7}",
                row.n,
                mean,
                row.gaps.len(),
                row.failed
            );
        }
    }
    println!("{}", report.summary);
}

fn run(cli: &Cli) -> SsvkResult<i32> {
    let cfg = resolve_config(cli, |key| std::env::var(key).ok())?;
    let plan = plan_from(cli)?;
    let orchestrator = Orchestrator::new(cfg)?;

    let mut report = orchestrator.run(&plan)?;
    orchestrator.persist(&mut report)?;
    print_report(&report);
    Ok(report.exit_code())
}

/// Exit code for a run that never produced a table.
fn exit_code_for(e: &SsvkError) -> i32 {
    match e {
        SsvkError::InvalidParameters(_) | SsvkError::Config(_) => EXIT_INVALID_ARGUMENTS,
        _ => EXIT_ALL_FAILED,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                EXIT_INVALID_ARGUMENTS
            } else {
                0
            };
            let _ = e.print();
            return ExitCode::from(code as u8);
        }
    };
    init_tracing(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            eprintln!("ssvk: {e}");
            exit_code_for(&e)
        }
    };
    ExitCode::from(code as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["ssvk"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_flags_layer_over_defaults() {
        let c = cli(&[
            "--experiment",
            "sat-gap",
            "--n-range",
            "4:12:4",
            "--samples",
            "4",
            "--seed",
            "9",
            "--timeout",
            "2.5",
            "--out",
            "/tmp/ssvk-a",
        ]);
        let cfg = resolve_config(&c, no_env).unwrap();
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.sample_timeout_ms, 2500);
        assert_eq!(cfg.out_dir, PathBuf::from("/tmp/ssvk-a"));
        let plan = plan_from(&c).unwrap();
        assert_eq!(plan.n_values, vec![4, 8, 12]);
        assert_eq!(plan.samples, 4);
    }

    #[test]
    fn test_environment_overrides_flags() {
        let c = cli(&[
            "--experiment",
            "gue-surmise",
            "--n-range",
            "100:200:100",
            "--seed",
            "1",
            "--out",
            "/tmp/flag",
        ]);
        let env = |key: &str| match key {
            ENV_OUT_DIR => Some("/tmp/env".to_string()),
            ENV_SEED => Some("77".to_string()),
            _ => None,
        };
        let cfg = resolve_config(&c, env).unwrap();
        assert_eq!(cfg.seed, Some(77));
        assert_eq!(cfg.out_dir, PathBuf::from("/tmp/env"));
    }

    #[test]
    fn test_bad_env_seed_is_invalid_argument() {
        let c = cli(&["--experiment", "sat-gap", "--n-range", "4"]);
        let env = |key: &str| (key == ENV_SEED).then(|| "nope".to_string());
        let err = resolve_config(&c, env).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_INVALID_ARGUMENTS);
    }

    #[test]
    fn test_unknown_experiment_rejected_by_parser() {
        let err = Cli::try_parse_from(["ssvk", "--experiment", "tarot", "--n-range", "4"])
            .unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_bad_range_and_timeout() {
        let c = cli(&["--experiment", "sat-gap", "--n-range", "12:4"]);
        assert!(plan_from(&c).is_err());
        let c = cli(&["--experiment", "sat-gap", "--n-range", "4", "--timeout=-1"]);
        let err = resolve_config(&c, no_env).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_INVALID_ARGUMENTS);
    }

    #[test]
    fn test_missing_config_file_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let c = cli(&[
            "--experiment",
            "sat-gap",
            "--n-range",
            "4",
            "--config",
            path.to_str().unwrap(),
        ]);
        let err = resolve_config(&c, no_env).unwrap_err();
        assert!(matches!(err, SsvkError::Config(_)), "{err:?}");
        assert_eq!(exit_code_for(&err), EXIT_INVALID_ARGUMENTS);
    }

    #[test]
    fn test_config_file_is_base_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"temperature": 0.25, "seed": 3}"#).unwrap();
        let c = cli(&[
            "--experiment",
            "sat-gap",
            "--n-range",
            "4",
            "--config",
            path.to_str().unwrap(),
            "--no-figures",
        ]);
        let cfg = resolve_config(&c, no_env).unwrap();
        assert_eq!(cfg.temperature, 0.25);
        assert_eq!(cfg.seed, Some(3));
        assert!(!cfg.emit_figures);
    }
}
