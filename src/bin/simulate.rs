use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use toclickornot_server::catalog::SituationCatalog;
use toclickornot_server::constants::{CLICKS_PER_ROUND, MAX_ROUNDS};
use toclickornot_server::engine::RoundEngine;
use toclickornot_server::narrator::DeathCause;
use toclickornot_server::rng::Rng;
use toclickornot_server::rules::{GameRules, RushRule};
use toclickornot_server::session::GameSession;
use toclickornot_server::stats::Stats;
use toclickornot_server::types::{ClickOutcome, GameState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays headless games and reports how they end")]
struct Cli {
    #[arg(long, default_value_t = 100)]
    runs: u32,
    #[arg(long, default_value_t = 1)]
    seed: u32,
    /// Milliseconds between simulated clicks.
    #[arg(long, default_value_t = 1_000)]
    interval_ms: u64,
    #[arg(long, default_value_t = MAX_ROUNDS)]
    max_rounds: u32,
    #[arg(long, default_value_t = CLICKS_PER_ROUND)]
    clicks_per_round: u32,
    /// `gap:<ms>` or `window:<clicks>/<ms>`.
    #[arg(long, default_value_t = RushRule::default())]
    rush_rule: RushRule,
    #[arg(long)]
    situation_catalog: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunLine {
    run: u32,
    seed: u32,
    outcome: GameState,
    #[serde(rename = "deathCause", skip_serializing_if = "Option::is_none")]
    death_cause: Option<DeathCause>,
    #[serde(rename = "roundsSurvived")]
    rounds_survived: u32,
    clicks: u32,
    stats: Stats,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    runs: usize,
    victories: usize,
    rushed: usize,
    #[serde(rename = "deathsByCause")]
    deaths_by_cause: BTreeMap<String, usize>,
    #[serde(rename = "meanRoundsSurvived")]
    mean_rounds_survived: f64,
    #[serde(rename = "intervalMs")]
    interval_ms: u64,
    rules: GameRules,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let catalog = match cli.situation_catalog.as_deref() {
        Some(path) => SituationCatalog::from_path(path)?,
        None => SituationCatalog::standard(),
    };
    let rules = GameRules {
        max_rounds: cli.max_rounds,
        clicks_per_round: cli.clicks_per_round,
        rush: cli.rush_rule,
    };
    let engine = Arc::new(RoundEngine::new(rules, catalog).context("invalid game rules")?);

    let mut lines = Vec::with_capacity(cli.runs as usize);
    for run in 0..cli.runs {
        let seed = cli.seed.wrapping_add(run);
        let line = play_run(engine.clone(), run, seed, cli.interval_ms);
        println!("{}", serde_json::to_string(&line)?);
        lines.push(line);
    }

    let summary = build_run_summary(&lines, cli.interval_ms, rules);
    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        log::info!("[simulate] summary written to {}", path.display());
    }
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn play_run(engine: Arc<RoundEngine>, run: u32, seed: u32, interval_ms: u64) -> RunLine {
    let click_limit = engine
        .rules()
        .max_rounds
        .saturating_mul(engine.rules().clicks_per_round)
        .saturating_add(1);
    let mut session = GameSession::start(engine, Rng::new(seed));
    let mut death_cause = None;
    let mut clicks = 0u32;
    let mut now_ms = 0u64;

    while clicks < click_limit {
        let outcome = match session.register_click(now_ms) {
            Ok(outcome) => outcome,
            Err(error) => {
                log::warn!("[simulate] run {run} stopped early: {error}");
                break;
            }
        };
        clicks += 1;
        now_ms += interval_ms;
        if let ClickOutcome::GameOver { cause, .. } = outcome {
            death_cause = Some(cause);
        }
        if outcome.is_terminal() {
            break;
        }
    }

    RunLine {
        run,
        seed,
        outcome: session.game_state(),
        death_cause,
        rounds_survived: session.rounds_survived(),
        clicks,
        stats: session.state().stats,
    }
}

fn build_run_summary(lines: &[RunLine], interval_ms: u64, rules: GameRules) -> RunSummary {
    let mut deaths_by_cause = BTreeMap::new();
    for cause in lines.iter().filter_map(|line| line.death_cause) {
        *deaths_by_cause.entry(death_cause_key(cause)).or_insert(0) += 1;
    }
    let total_rounds: u64 = lines.iter().map(|line| line.rounds_survived as u64).sum();
    let mean_rounds_survived = if lines.is_empty() {
        0.0
    } else {
        total_rounds as f64 / lines.len() as f64
    };
    RunSummary {
        runs: lines.len(),
        victories: count_state(lines, GameState::Victory),
        rushed: count_state(lines, GameState::Rushed),
        deaths_by_cause,
        mean_rounds_survived,
        interval_ms,
        rules,
    }
}

fn count_state(lines: &[RunLine], state: GameState) -> usize {
    lines.iter().filter(|line| line.outcome == state).count()
}

fn death_cause_key(cause: DeathCause) -> String {
    serde_json::to_value(cause)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{cause:?}"))
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}
