//! Headless Mergewar runner.
//!
//! Auto-plays seeded runs in parallel and prints one summary per run, for
//! checking balance changes without a front end.

mod autoplay;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mergewar_core::config::BalanceConfig;
use mergewar_core::level::{Difficulty, ProceduralGenerator};
use mergewar_core::persistence::{MemoryStore, ProgressStore};
use mergewar_core::session::GameSession;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::autoplay::{AutoPlayer, Policy, RunSummary};

/// Headless Mergewar runner - seeded auto-play for balance testing
#[derive(Parser, Debug)]
#[command(name = "mergewar-headless")]
#[command(about = "Auto-play seeded Mergewar runs and report how far they get")]
struct Args {
    /// Seed of the first run; run `i` uses `seed + i`
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of runs
    #[arg(long, default_value_t = 8)]
    runs: u64,

    /// Difficulty to play
    #[arg(long, value_enum, default_value_t = DifficultyArg::Normal)]
    difficulty: DifficultyArg,

    /// Balance config JSON; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Retries per level before a run gives up
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Stop each run after winning this level
    #[arg(long, default_value_t = u32::MAX)]
    max_levels: u32,

    /// Print JSON lines instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Normal,
    Hard,
    Hell,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Normal => Self::Normal,
            DifficultyArg::Hard => Self::Hard,
            DifficultyArg::Hell => Self::Hell,
        }
    }
}

fn play_run(config: &BalanceConfig, seed: u64, difficulty: Difficulty, policy: Policy) -> Result<RunSummary> {
    // Balance runs may start on any difficulty
    let mut store = MemoryStore::default();
    store.save_max_difficulty(Difficulty::Hell)?;

    let session = GameSession::new(
        config.clone(),
        Box::new(ProceduralGenerator::new(seed)),
        Box::new(store),
        seed,
        0.0,
    );
    AutoPlayer::new(session, policy)
        .play(seed, difficulty)
        .with_context(|| format!("run with seed {seed}"))
}

fn print_text(summaries: &[RunSummary]) {
    for s in summaries {
        println!(
            "seed {:>6}  {:<6}  level {:>2}{}  battles {:>3} (lost {:>2})  kills {:>5}  merges {:>4}  coins {:>7}",
            s.seed,
            s.difficulty.to_string(),
            s.level_reached,
            if s.cleared { " CLEAR" } else { "      " },
            s.battles,
            s.defeats,
            s.kills,
            s.merges,
            s.coins,
        );
    }

    if summaries.is_empty() {
        return;
    }
    let cleared = summaries.iter().filter(|s| s.cleared).count();
    #[allow(clippy::cast_precision_loss)]
    let mean_level =
        summaries.iter().map(|s| f64::from(s.level_reached)).sum::<f64>() / summaries.len() as f64;
    println!(
        "{} runs, {} cleared, mean level {:.1}",
        summaries.len(),
        cleared,
        mean_level
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => BalanceConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => BalanceConfig::default(),
    };
    let difficulty = Difficulty::from(args.difficulty);
    let policy = Policy {
        max_retries: args.max_retries,
        max_levels: args.max_levels,
    };

    tracing::info!(runs = args.runs, seed = args.seed, %difficulty, "starting runs");

    let summaries = (0..args.runs)
        .into_par_iter()
        .map(|i| play_run(&config, args.seed.wrapping_add(i), difficulty, policy))
        .collect::<Result<Vec<_>>>()?;

    if args.json {
        for summary in &summaries {
            println!("{}", serde_json::to_string(summary)?);
        }
    } else {
        print_text(&summaries);
    }
    Ok(())
}
