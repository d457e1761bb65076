use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use toclickornot_server::app::{build_router, AppState};
use toclickornot_server::catalog::SituationCatalog;
use toclickornot_server::constants::{CLICKS_PER_ROUND, DEFAULT_MAX_SESSIONS, MAX_ROUNDS};
use toclickornot_server::engine::RoundEngine;
use toclickornot_server::leaderboard::Leaderboard;
use toclickornot_server::rules::{GameRules, RushRule};
use toclickornot_server::session_store::SessionStore;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "LEADERBOARD_DB_PATH", default_value = ".data/leaderboard.json")]
    leaderboard_path: PathBuf,
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,
    /// JSON file with `core`, `templates` and `roundEvents` pools.
    #[arg(long, env = "SITUATION_CATALOG")]
    situation_catalog: Option<PathBuf>,
    #[arg(long, env = "MAX_ROUNDS", default_value_t = MAX_ROUNDS)]
    max_rounds: u32,
    #[arg(long, env = "CLICKS_PER_ROUND", default_value_t = CLICKS_PER_ROUND)]
    clicks_per_round: u32,
    /// `gap:<ms>` or `window:<clicks>/<ms>`.
    #[arg(long, env = "RUSH_RULE", default_value_t = RushRule::default())]
    rush_rule: RushRule,
    #[arg(long, env = "MAX_SESSIONS", default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let catalog = match cli.situation_catalog.as_deref() {
        Some(path) => {
            log::info!("[server] situation catalog: {}", path.display());
            SituationCatalog::from_path(path)?
        }
        None => SituationCatalog::standard(),
    };
    let rules = GameRules {
        max_rounds: cli.max_rounds,
        clicks_per_round: cli.clicks_per_round,
        rush: cli.rush_rule,
    };
    let engine = RoundEngine::new(rules, catalog).context("invalid game rules")?;
    log::info!(
        "[server] {} rounds x {} clicks, rush rule {}, {} situations",
        rules.max_rounds,
        rules.clicks_per_round,
        rules.rush,
        engine.catalog().situation_count()
    );

    let state = AppState::new(
        SessionStore::new(Arc::new(engine), cli.max_sessions),
        Leaderboard::new(cli.leaderboard_path),
    );
    let app = build_router(state, resolve_static_dir(cli.static_dir));

    let bind_addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    log::info!("[server] listening on :{}", cli.port);
    axum::serve(listener, app)
        .await
        .context("server runtime failed")
}

fn resolve_static_dir(configured: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path);
        }
        log::warn!("[server] {} has no index.html", path.display());
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("webroot")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}
