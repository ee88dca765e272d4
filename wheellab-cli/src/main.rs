//! WheelLab CLI: strategy analytics over journal and backtest JSON files.
//!
//! Commands:
//! - `score`: discipline breakdown for one planned/executed pair
//! - `score-batch`: discipline breakdowns for a JSONL file of pairs
//! - `health`: health snapshot over a strategy's closed cycles
//! - `batch`: best/worst comparison over a batch's runs
//! - `enforce`: small-account guardrails for one position
//! - `golden`: check golden fixtures
//! - `backtest`: submit a config to the remote backtest engine
//!
//! Results go to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use wheellab_core::domain::{
    Batch, Cycle, ExecutedParams, PlannedParams, PositionRequest, Run, SmallAccountSettings,
    StrategyId,
};
use wheellab_runner::golden::load_cases;
use wheellab_runner::{
    compute_batch_summary, enforce_position, export_batch_csv, export_cycle_summaries_csv,
    export_json, finalize_batch, AnalyticsConfig, DisciplineScorer, EngineClient, HealthAggregator,
};

#[derive(Parser)]
#[command(
    name = "wheellab",
    about = "WheelLab CLI: discipline, health, and batch analytics for wheel strategies"
)]
struct Cli {
    /// TOML file overriding the default analytics thresholds.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one executed trade against its plan.
    Score {
        /// JSON file holding the planned parameters.
        #[arg(long)]
        planned: PathBuf,

        /// JSON file holding the executed parameters.
        #[arg(long)]
        executed: PathBuf,
    },
    /// Score every `{planned, executed}` line of a JSONL file.
    ScoreBatch {
        #[arg(long)]
        input: PathBuf,
    },
    /// Compute a strategy's health snapshot.
    Health {
        #[arg(long)]
        strategy_id: String,

        /// JSON array of cycles, ordered by start time.
        #[arg(long)]
        cycles: PathBuf,

        /// Also write per-cycle summaries as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Compare the runs of a backtest batch.
    Batch {
        /// JSON array of runs.
        #[arg(long)]
        runs: PathBuf,

        /// Batch record; when given, the summary is only produced once every
        /// referenced run that was supplied is complete.
        #[arg(long)]
        batch: Option<PathBuf>,

        /// Also write the runs as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Check a position against small-account settings.
    Enforce {
        #[arg(long)]
        position: PathBuf,

        /// Owner's small-account settings. Without it the check is skipped.
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Owner's positions already open.
        #[arg(long, default_value_t = 0)]
        open_positions: usize,
    },
    /// Check every golden fixture in a directory.
    Golden {
        dir: PathBuf,
    },
    /// Submit a strategy config to the remote backtest engine.
    Backtest {
        /// Engine base URL.
        #[arg(long)]
        engine: String,

        /// JSON object sent as the engine's `configUsed`.
        #[arg(long)]
        strategy_config: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct ScoreRequest {
    #[serde(default)]
    planned: PlannedParams,
    #[serde(default)]
    executed: ExecutedParams,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => AnalyticsConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalyticsConfig::default(),
    };

    match cli.command {
        Commands::Score { planned, executed } => run_score(&config, &planned, &executed),
        Commands::ScoreBatch { input } => run_score_batch(&config, &input),
        Commands::Health {
            strategy_id,
            cycles,
            csv,
        } => run_health(&config, strategy_id, &cycles, csv.as_deref()),
        Commands::Batch { runs, batch, csv } => run_batch(&runs, batch.as_deref(), csv.as_deref()),
        Commands::Enforce {
            position,
            settings,
            open_positions,
        } => run_enforce(&position, settings.as_deref(), open_positions),
        Commands::Golden { dir } => run_golden(&config, &dir),
        Commands::Backtest {
            engine,
            strategy_config,
        } => run_backtest(&engine, &strategy_config),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed JSON in {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote export");
    Ok(())
}

/// Parse non-blank lines of a JSONL document, keeping line numbers in errors.
fn parse_jsonl<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("malformed JSON on line {}", i + 1))
        })
        .collect()
}

fn run_score(config: &AnalyticsConfig, planned: &Path, executed: &Path) -> Result<()> {
    let planned: PlannedParams = read_json(planned)?;
    let executed: ExecutedParams = read_json(executed)?;
    let scorer = DisciplineScorer::new(config.discipline.clone());
    println!("{}", export_json(&scorer.score(&planned, &executed))?);
    Ok(())
}

fn run_score_batch(config: &AnalyticsConfig, input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let requests: Vec<ScoreRequest> =
        parse_jsonl(&text).with_context(|| format!("in {}", input.display()))?;

    let scorer = DisciplineScorer::new(config.discipline.clone());
    let breakdowns: Vec<_> = requests
        .par_iter()
        .map(|r| scorer.score(&r.planned, &r.executed))
        .collect();
    debug!(trades = breakdowns.len(), "scored batch");

    for b in &breakdowns {
        println!("{}", serde_json::to_string(b)?);
    }
    Ok(())
}

fn run_health(
    config: &AnalyticsConfig,
    strategy_id: String,
    cycles: &Path,
    csv_out: Option<&Path>,
) -> Result<()> {
    let cycles: Vec<Cycle> = read_json(cycles)?;
    let aggregator = HealthAggregator::new(config.health.clone());
    let snapshot = aggregator.compute_snapshot(StrategyId::new(strategy_id), &cycles);

    if let Some(path) = csv_out {
        write_file(path, &export_cycle_summaries_csv(&snapshot)?)?;
    }
    println!("{}", export_json(&snapshot)?);
    Ok(())
}

fn run_batch(runs: &Path, batch: Option<&Path>, csv_out: Option<&Path>) -> Result<()> {
    let runs: Vec<Run> = read_json(runs)?;

    if let Some(path) = csv_out {
        write_file(path, &export_batch_csv(&runs)?)?;
    }

    match batch {
        Some(path) => {
            let batch: Batch = read_json(path)?;
            println!("{}", export_json(&finalize_batch(&batch, &runs))?);
        }
        None => {
            if let Some(open) = runs.iter().find(|r| !r.is_complete()) {
                warn!(run = %open.run_id, "summarizing a batch with incomplete runs");
            }
            println!("{}", export_json(&compute_batch_summary(&runs))?);
        }
    }
    Ok(())
}

fn run_enforce(position: &Path, settings: Option<&Path>, open_positions: usize) -> Result<()> {
    let position: PositionRequest = read_json(position)?;
    let settings: Option<SmallAccountSettings> = settings
        .map(read_json::<SmallAccountSettings>)
        .transpose()?;
    let decision = enforce_position(&position, settings.as_ref(), open_positions);
    println!("{}", export_json(&decision)?);
    Ok(())
}

fn run_golden(config: &AnalyticsConfig, dir: &Path) -> Result<()> {
    let cases = load_cases(dir)?;
    let mut failed = 0;

    for case in &cases {
        let outcome = case.check(config)?;
        let status = if outcome.passed { "ok" } else { "FAILED" };
        println!("{:<40} {:<6} {}", outcome.name, status, &outcome.digest[..16]);
        if !outcome.passed {
            failed += 1;
            eprintln!("  actual:   {}", outcome.actual);
            eprintln!("  expected: {}", case.expected);
        }
    }

    println!();
    println!("{} fixture(s), {} failed", cases.len(), failed);
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_backtest(engine: &str, strategy_config: &Path) -> Result<()> {
    let config: Map<String, Value> = read_json(strategy_config)?;
    let client = EngineClient::new(engine)?;
    let result = client
        .run_backtest(config)
        .with_context(|| format!("backtest request to {} failed", client.endpoint()))?;
    println!("{}", export_json(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn jsonl_skips_blank_lines() {
        let text = "{\"planned\": {\"strike\": 100}, \"executed\": {\"strike\": 95}}\n\n{}\n";
        let requests: Vec<ScoreRequest> = parse_jsonl(text).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].planned.strike, Some(100.0));
        assert_eq!(requests[1].executed, ExecutedParams::default());
    }

    #[test]
    fn jsonl_reports_line_number() {
        let err = parse_jsonl::<ScoreRequest>("{}\n\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn read_json_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\"just a string\"").unwrap();
        let err = read_json::<Vec<Cycle>>(file.path()).unwrap_err();
        assert!(err.to_string().contains("malformed JSON"));
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wheellab", "health", "--strategy-id", "s1", "--cycles", "c.json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Health { .. }));
    }
}
