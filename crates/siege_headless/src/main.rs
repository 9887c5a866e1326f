//! Headless battle runner.
//!
//! Runs matches without any presentation, controlled via JSON on
//! stdin/stdout or as one-shot and batch jobs.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p siege_headless
//!
//! # Run a single match and record it
//! cargo run -p siege_headless -- run --scenario skirmish --seed 7 --record match.bin
//!
//! # Run a batch of seeds in parallel
//! cargo run -p siege_headless -- batch --scenario skirmish --count 1000 --output results/
//!
//! # Check a recorded match still reproduces
//! cargo run -p siege_headless -- replay --file match.bin
//! ```
//!
//! Logs go to stderr; stdout is reserved for protocol output and reports.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use siege_core::data::GameConfig;
use siege_core::replay::Replay;
use siege_headless::batch::{run_batch, verify_determinism, BatchConfig};
use siege_headless::game_runner::{GameRunner, MatchSettings, DEFAULT_MAX_TICKS};
use siege_headless::runner::{HeadlessConfig, HeadlessRunner};
use siege_headless::{Scenario, ScenarioError};

#[derive(Parser)]
#[command(name = "siege_headless")]
#[command(about = "Headless battle runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON file overriding the default unit, layout and rule tables (interactive and run)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a JSON-lines session on stdin/stdout
    Interactive {
        /// Built-in scenario name or RON path
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Opponent policy seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output state after every tick command
        #[arg(long)]
        auto_state: bool,
    },

    /// Run one match to completion and print its metrics
    Run {
        /// Built-in scenario name or RON path
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Opponent policy seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Record the match to this replay file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Run many seeds in parallel and summarize win rates
    Batch {
        /// Built-in scenario name or RON path
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Number of matches
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// First seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit per match
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },

    /// Run one seed several times and compare final hashes
    Verify {
        /// Built-in scenario name or RON path
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },

    /// Replay a recorded match and check its final hash
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = load_tables(cli.config.as_deref()).and_then(|tables| match cli.command {
        Some(Commands::Interactive {
            scenario,
            seed,
            auto_state,
        }) => cmd_interactive(tables, &scenario, seed, auto_state),
        Some(Commands::Run {
            scenario,
            seed,
            max_ticks,
            record,
        }) => cmd_run(tables, &scenario, seed, max_ticks, record),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            max_ticks,
        }) => cmd_batch(scenario, count, parallel, output, seed, max_ticks),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            max_ticks,
        }) => cmd_verify(&scenario, seed, runs, max_ticks),
        Some(Commands::Replay { file }) => cmd_replay(&file),
        None => cmd_interactive(tables, "skirmish", 0, false),
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn load_tables(path: Option<&Path>) -> Result<GameConfig, ScenarioError> {
    match path {
        Some(path) => {
            let tables = GameConfig::load(path)?;
            tracing::info!(path = %path.display(), "Loaded tables");
            Ok(tables)
        }
        None => Ok(GameConfig::default()),
    }
}

/// Serve a JSON-lines session
fn cmd_interactive(tables: GameConfig, scenario: &str, seed: u64, auto_state: bool) -> Result<ExitCode, ScenarioError> {
    tracing::info!(scenario, seed, "Starting interactive session");
    let sim = Scenario::resolve(scenario)?.build(tables, seed)?;
    let runner = HeadlessRunner::new(
        sim,
        HeadlessConfig {
            auto_state_output: auto_state,
        },
    );
    runner.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

/// Run one match
fn cmd_run(
    tables: GameConfig,
    scenario: &str,
    seed: u64,
    max_ticks: u64,
    record: Option<PathBuf>,
) -> Result<ExitCode, ScenarioError> {
    let mut settings = MatchSettings::new(Scenario::resolve(scenario)?, seed, max_ticks);
    settings.config = tables;
    let runner = GameRunner::new();

    let result = match record {
        Some(path) => {
            let (result, replay) = runner.run_recorded(&settings)?;
            replay.save(&path)?;
            tracing::info!(path = %path.display(), ticks = replay.final_tick, "Replay saved");
            result
        }
        None => runner.run(&settings)?,
    };

    tracing::info!(
        outcome = ?result.outcome,
        ticks = result.ticks,
        hash = result.final_state_hash,
        "Match finished"
    );
    println!("{}", serde_json::to_string_pretty(&result.metrics)?);
    Ok(ExitCode::SUCCESS)
}

/// Run a batch of matches
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    max_ticks: u64,
) -> Result<ExitCode, ScenarioError> {
    std::fs::create_dir_all(&output)?;

    let config = BatchConfig {
        scenario,
        game_count: count,
        parallel_games: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        max_ticks,
    };
    let results = run_batch(config)?;

    let results_path = output.join("batch_results.json");
    results.save(&results_path)?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
    }
    eprintln!("Draws: {}", summary.draws);
    for (side, rate) in &summary.win_rates {
        eprintln!("  {side:<8} wins {:>5.1}%", rate * 100.0);
    }
    eprintln!("Average duration: {:.0} ticks", summary.avg_duration_ticks);
    eprintln!("Results saved to: {}", results_path.display());

    Ok(ExitCode::SUCCESS)
}

/// Verify determinism for one seed
fn cmd_verify(scenario: &str, seed: u64, runs: u32, max_ticks: u64) -> Result<ExitCode, ScenarioError> {
    if verify_determinism(scenario, seed, runs, max_ticks)? {
        tracing::info!(seed, runs, "Determinism verified");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(seed, runs, "Runs diverged");
        Ok(ExitCode::FAILURE)
    }
}

/// Check a recorded match
fn cmd_replay(file: &Path) -> Result<ExitCode, ScenarioError> {
    let replay = Replay::load(file)?;
    match replay.verify() {
        Ok(sim) => {
            tracing::info!(
                ticks = sim.tick_count(),
                hash = sim.state_hash(),
                status = ?sim.snapshot().game_status,
                "Replay verified"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "Replay diverged");
            Ok(ExitCode::FAILURE)
        }
    }
}
