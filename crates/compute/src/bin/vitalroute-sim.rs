//! vitalroute-sim: replay a recorded sensor stream through scoring and
//! edge/cloud dispatch, then report where every task went.
//!
//! Paths and the jitter seed come from the command line first, then from
//! the profiled environment (`PATIENTS_PATH`, `READINGS_PATH`, `JITTER_SEED`, ...).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};

use vitalroute_compute::dispatch::{DispatchPolicy, Infrastructure, UniformJitter};
use vitalroute_compute::intake::{TaskIntakeLoop, UnavailablePolicy};
use vitalroute_compute::report::SimulationReport;
use vitalroute_compute::scoring::{LearnedScorer, ModelProvider, PriorityEngine};
use vitalroute_compute::source;
use vitalroute_core::config::{Config, load_dotenv};
use vitalroute_core::ScoringTables;

// ── CLI ─────────────────────────────────────────────────────────────

/// Score and dispatch recorded vital-sign readings.
#[derive(Parser, Debug)]
#[command(name = "vitalroute-sim", version, about)]
struct Cli {
    /// JSON array of patient records, each with a `device_id`. Overrides `PATIENTS_PATH`.
    #[arg(long)]
    patients: Option<PathBuf>,

    /// JSON array of sensor readings, processed in file order. Overrides `READINGS_PATH`.
    #[arg(long)]
    readings: Option<PathBuf>,

    /// JSON artifact with `urgency` and `weight` linear models. Overrides `MODELS_PATH`.
    #[arg(long)]
    models: Option<PathBuf>,

    /// TOML file overriding the normal ranges and parameter weights. Overrides
    /// `SCORING_TABLES_PATH`.
    #[arg(long)]
    scoring_tables: Option<PathBuf>,

    /// Seed for the processing-time jitter; overrides `JITTER_SEED`.
    #[arg(long)]
    seed: Option<u64>,

    /// Score `specific` patients with the rule-based path when no model is usable.
    #[arg(long, env = "VITALROUTE_FALLBACK_TO_RULES")]
    fallback_to_rules: bool,

    /// Print the full report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("reading configuration from the environment")?;
    if cli.seed.is_some() {
        config.dispatch.jitter_seed = cli.seed;
    }
    config.validate().context("invalid configuration")?;
    config.log_summary();

    // ── Static tables ──
    let tables = match cli.scoring_tables.or(config.data.scoring_tables_path.clone()) {
        Some(path) => ScoringTables::from_file(&path)
            .with_context(|| format!("loading scoring tables from {}", path.display()))?,
        None => ScoringTables::default(),
    };
    tables.log_summary();
    let tables = Arc::new(tables);

    // ── Learned models ──
    let learned = match cli.models.or(config.data.models_path.clone()) {
        Some(path) => {
            let provider = ModelProvider::from_json_file(&path)
                .with_context(|| format!("loading models from {}", path.display()))?;
            info!(path = %path.display(), "learned models loaded");
            LearnedScorer::new(provider)
        }
        None => {
            warn!("no model artifact configured, specific patients cannot be scored by the learned path");
            LearnedScorer::untrained()
        }
    };
    let engine = PriorityEngine::new(tables, learned);

    // ── Data ──
    let Some(patients_path) = cli.patients.or(config.data.patients_path.clone()) else {
        bail!("no patient roster given (--patients or PATIENTS_PATH)");
    };
    let Some(readings_path) = cli.readings.or(config.data.readings_path.clone()) else {
        bail!("no readings given (--readings or READINGS_PATH)");
    };
    let registry = source::load_patients(&patients_path)
        .with_context(|| format!("loading patients from {}", patients_path.display()))?;
    let readings = source::load_readings(&readings_path)
        .with_context(|| format!("loading readings from {}", readings_path.display()))?;

    // ── Run ──
    let policy = DispatchPolicy::new(
        config.dispatch.clone(),
        UniformJitter::from_config(&config.dispatch),
    )
    .context("building dispatch policy")?;
    let infrastructure = Infrastructure::from_config(&config.infrastructure);
    let unavailable = if cli.fallback_to_rules {
        UnavailablePolicy::FallbackToRules
    } else {
        UnavailablePolicy::Reject
    };

    let mut intake = TaskIntakeLoop::new(
        registry,
        engine,
        policy,
        infrastructure,
        SimulationReport::new(),
    )
    .with_unavailable_policy(unavailable);
    intake.run(readings).context("intake aborted")?;

    let (report, summary) = intake.into_parts();
    report.log_summary();
    if summary.skipped() > 0 {
        warn!(skipped = summary.skipped(), "some readings were not dispatched");
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("serializing report")?;
        println!("{}", json);
    }

    Ok(())
}
