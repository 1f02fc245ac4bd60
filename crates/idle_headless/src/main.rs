//! Headless idle game runner.
//!
//! This binary runs the simulation without a UI. It can play in real time,
//! tick in batches, simulate an absence from a save, or be driven by JSON
//! lines on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read requests from stdin
//! cargo run -p idle_headless
//!
//! # Play in real time for a minute, autosaving
//! cargo run -p idle_headless -- live --seconds 60 --save game.json
//!
//! # Batch 10 simulated minutes and print a summary
//! cargo run -p idle_headless -- run --ticks 6000 --seed 7
//!
//! # What would eight hours away do to this save?
//! cargo run -p idle_headless -- offline --save game.json --hours 8
//!
//! # Export the built-in content for editing
//! cargo run -p idle_headless -- content --output content.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON requests, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for request/response format.

use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use idle_core::clock::{secs_to_millis, Millis};
use idle_core::config::EngineConfig;
use idle_core::data::GameData;
use idle_core::rng::{ChaChaSource, RandomSource};
use idle_core::simulation::Simulation;
use idle_headless::content_loader::{config_or_default, content_or_standard, export_content};
use idle_headless::runner::{
    absence_from_save, default_save_path, enable_automation, run_batch, run_live, wall_clock_ms,
    HeadlessRunner,
};
use idle_headless::save_store::SaveStore;
use idle_test_utils::determinism::{
    find_first_divergence, run_parallel, verify_checkpoint_roundtrip, verify_json_roundtrip,
    verify_seeded,
};
use idle_test_utils::fixtures;

#[derive(Parser)]
#[command(name = "idle_headless")]
#[command(about = "Headless idle game runner for scripting, balance runs and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON content file (defaults to the built-in content)
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    /// RON engine config file (defaults to built-in values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play in real time, sleeping between ticks
    Live {
        /// How long to run, in wall-clock seconds
        #[arg(short, long, default_value = "60")]
        seconds: u64,

        /// Save slot to resume from and autosave to
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Run a batch of ticks with automation enabled and print a summary
    Run {
        /// Number of ticks
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Load a save, pretend time passed, and print the offline report
    Offline {
        /// Save file
        #[arg(long)]
        save: PathBuf,

        /// Hours away
        #[arg(long, default_value = "8")]
        hours: f64,

        /// Random seed for mission rolls (entropy if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the caught-up state back to the save
        #[arg(long)]
        write: bool,
    },

    /// JSON-lines session on stdin/stdout
    Interactive {
        /// Random seed (entropy if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Default save slot for `save` requests and autosaves
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Export content (and optionally config) as RON
    Content {
        /// Output content file
        #[arg(short, long, default_value = "content.ron")]
        output: PathBuf,

        /// Also write the engine config here
        #[arg(long)]
        config_output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Ticks per run
        #[arg(short, long, default_value = "3000")]
        ticks: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol and summaries)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let data = or_exit("Failed to load content", content_or_standard(cli.content.as_deref()));
    let config = or_exit("Failed to load config", config_or_default(cli.config.as_deref()));

    match cli.command {
        Some(Commands::Live { seconds, save }) => cmd_live(data, config, seconds, save),
        Some(Commands::Run { ticks, seed }) => cmd_run(data, config, ticks, seed),
        Some(Commands::Offline {
            save,
            hours,
            seed,
            write,
        }) => cmd_offline(data, config, &save, hours, seed, write),
        Some(Commands::Interactive { seed, save }) => cmd_interactive(data, config, seed, save),
        Some(Commands::Content {
            output,
            config_output,
        }) => cmd_content(&data, &config, &output, config_output.as_deref()),
        Some(Commands::Verify { seed, ticks, runs }) => cmd_verify(seed, ticks, runs),
        None => {
            // Default: interactive mode
            cmd_interactive(data, config, None, None);
        }
    }
}

/// Unwrap `result` or report the error and exit.
fn or_exit<T, E: Display>(context: &str, result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{context}: {e}");
            std::process::exit(1);
        }
    }
}

fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(ChaChaSource::new(seed)),
        None => Box::new(ChaChaSource::from_entropy()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = or_exit("Failed to encode output", serde_json::to_string_pretty(value));
    println!("{json}");
}

/// Play in real time
fn cmd_live(data: GameData, config: EngineConfig, seconds: u64, save: Option<PathBuf>) {
    let store = SaveStore::new(save.unwrap_or_else(default_save_path));
    let now = wall_clock_ms();

    let mut sim = if store.exists() {
        let text = or_exit("Failed to read save", store.load_text());
        let (sim, offline) = or_exit(
            "Failed to restore save",
            Simulation::from_json(data, config, &text, random_source(None), now),
        );
        if let Some(report) = offline {
            eprintln!(
                "Welcome back: {:.1} minutes away, {} missions resolved",
                report.away_ms as f64 / 60_000.0,
                report.missions.len()
            );
        }
        sim
    } else {
        tracing::info!(path = %store.path().display(), "No save found, starting a new game");
        or_exit("Failed to start game", Simulation::new(data, config, now))
    };

    let until = now.saturating_add(seconds.saturating_mul(1_000));
    tracing::info!(seconds, "Starting live session");
    let summary = or_exit(
        "Live session failed",
        run_live(&mut sim, until, Some(&store), wall_clock_ms, |ms| {
            thread::sleep(Duration::from_millis(ms));
        }),
    );
    print_json(&summary);
}

/// Batch ticks with automation on
fn cmd_run(data: GameData, config: EngineConfig, ticks: u64, seed: u64) {
    tracing::info!(ticks, seed, "Running batch");
    let mut sim = or_exit("Failed to start game", Simulation::with_seed(data, config, seed, 0));
    let refused = enable_automation(&mut sim, 0);
    if !refused.is_empty() {
        eprintln!("Automation not unlocked: {refused:?}");
    }
    let summary = run_batch(&mut sim, ticks);
    print_json(&summary);
}

/// Simulate an absence from a save
fn cmd_offline(
    data: GameData,
    config: EngineConfig,
    save: &Path,
    hours: f64,
    seed: Option<u64>,
    write: bool,
) {
    let store = SaveStore::new(save);
    let text = or_exit("Failed to read save", store.load_text());
    let away: Millis = secs_to_millis(hours.max(0.0) * 3_600.0);
    let (sim, report) = or_exit(
        "Failed to restore save",
        absence_from_save(data, config, &text, away, random_source(seed)),
    );

    match report {
        Some(report) => print_json(&report),
        None => eprintln!("Absence too short to count as offline time"),
    }
    if write {
        or_exit("Failed to write save", store.save(&sim));
        eprintln!("Wrote caught-up state to {}", save.display());
    }
}

/// Run a JSON-lines session
fn cmd_interactive(data: GameData, config: EngineConfig, seed: Option<u64>, save: Option<PathBuf>) {
    let sim = or_exit(
        "Failed to start game",
        Simulation::with_random(data, config, random_source(seed), 0),
    );
    let mut runner = HeadlessRunner::new(sim, 0);
    if let Some(path) = save {
        runner = runner.with_save(SaveStore::new(path));
    }
    let stdin = io::stdin();
    let stdout = io::stdout();
    or_exit("Session failed", runner.run(stdin.lock(), stdout.lock()));
}

/// Export content and config
fn cmd_content(data: &GameData, config: &EngineConfig, output: &Path, config_output: Option<&Path>) {
    or_exit("Failed to export content", export_content(data, output));
    eprintln!("Wrote content to {}", output.display());
    if let Some(path) = config_output {
        let text = or_exit("Failed to encode config", config.to_ron_string());
        or_exit("Failed to write config", std::fs::write(path, text));
        eprintln!("Wrote config to {}", path.display());
    }
}

/// Determinism check on the automated economy
fn cmd_verify(seed: u64, ticks: u64, runs: usize) {
    tracing::info!(seed, ticks, runs, "Verifying determinism");

    let sequential = verify_seeded(seed, ticks, runs);
    let parallel = run_parallel(|| fixtures::automated_economy(seed), runs, ticks);
    let json = verify_json_roundtrip(|| fixtures::automated_economy(seed), ticks);
    let checkpoint = verify_checkpoint_roundtrip(|| fixtures::automated_economy(seed), ticks);

    let consistent = sequential.unique_hashes() == parallel.unique_hashes();
    if sequential.is_deterministic && parallel.is_deterministic && consistent && json && checkpoint {
        eprintln!("PASS: All {runs} runs produced identical results");
        if let Some(hash) = sequential.hashes.first() {
            eprintln!("  State hash: {hash:016x}");
        }
        return;
    }

    eprintln!("FAIL: Non-determinism detected!");
    eprintln!("  Sequential hashes: {:?}", sequential.unique_hashes());
    eprintln!("  Parallel hashes:   {:?}", parallel.unique_hashes());
    eprintln!("  JSON round-trip:   {json}");
    eprintln!("  Checkpoint round-trip: {checkpoint}");
    if let Some(tick) = find_first_divergence(|| fixtures::automated_economy(seed), ticks) {
        eprintln!("  First divergence at tick {tick}");
    }
    std::process::exit(1);
}
