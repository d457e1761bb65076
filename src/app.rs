use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};

use crate::leaderboard::{Leaderboard, LeaderboardError, ScoreSubmission};
use crate::server_protocol::{
    ClickResponse, ConfigResponse, InitResponse, LeaderboardQuery, LeaderboardResponse,
    PlayerRequest, RestartResponse, SubmitScoreResponse,
};
use crate::server_utils::{normalize_post_id, now_ms, parse_leaderboard_limit, sanitize_name};
use crate::session_store::{SessionKey, SessionStore, SharedSession};
use crate::types::{GameError, GameState};

pub struct AppState {
    pub sessions: SessionStore,
    pub leaderboard: Mutex<Leaderboard>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(sessions: SessionStore, leaderboard: Leaderboard) -> SharedState {
        Arc::new(Self {
            sessions,
            leaderboard: Mutex::new(leaderboard),
        })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("postId is required")]
    MissingPostId,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("no game for this player; call /api/init first")]
    UnknownSession,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("leaderboard storage unavailable: {0}")]
    StorageUnavailable(#[from] LeaderboardError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPostId | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownSession => StatusCode::NOT_FOUND,
            Self::Game(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::warn!("[server] {self}");
        }
        (
            status,
            Json(json!({ "status": "error", "message": self.to_string() })),
        )
            .into_response()
    }
}

pub fn build_router(state: SharedState, static_dir: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/config", get(config_handler))
        .route("/api/init", get(init_handler))
        .route("/api/click", post(click_handler))
        .route("/api/restart", post(restart_handler))
        .route("/api/submit-score", post(submit_score_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .with_state(state);

    match static_dir {
        Some(static_dir) => {
            let index_file = static_dir.join("index.html");
            log::info!("[server] static file root: {}", static_dir.display());
            app.fallback_service(
                ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
            )
        }
        None => {
            log::warn!("[server] static file root not found; serving the API only");
            app
        }
    }
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

pub async fn config_handler(State(state): State<SharedState>) -> Json<ConfigResponse> {
    Json(ConfigResponse::new(*state.sessions.engine().rules()))
}

pub async fn init_handler(
    State(state): State<SharedState>,
    Query(query): Query<PlayerRequest>,
) -> Result<Json<InitResponse>, ApiError> {
    let key = session_key(&query)?;
    let (session, created) = state.sessions.get_or_create(&key, now_ms()).await;
    if created {
        log::info!("[server] new session {}/{}", key.post_id, key.player);
    }

    let session = session.lock().await;
    let leaderboard = state.leaderboard.lock().await;
    Ok(Json(InitResponse::new(
        &key.post_id,
        &key.player,
        session.state(),
        session.engine().rules(),
        leaderboard.high_score(&key.post_id),
        leaderboard.total_plays(&key.post_id),
    )))
}

pub async fn click_handler(
    State(state): State<SharedState>,
    body: Result<Json<PlayerRequest>, JsonRejection>,
) -> Result<Json<ClickResponse>, ApiError> {
    let Json(request) = body?;
    let key = session_key(&request)?;
    let session = existing_session(&state, &key).await?;

    let mut session = session.lock().await;
    let outcome = session.register_click(now_ms())?;
    if outcome.is_terminal() {
        log::info!(
            "[server] {}/{} finished as {:?} after {} rounds",
            key.post_id,
            key.player,
            outcome.game_state(),
            session.rounds_survived()
        );
    }
    Ok(Json(ClickResponse::new(
        &key.post_id,
        session.state(),
        &outcome,
        session.engine().rules(),
    )))
}

pub async fn restart_handler(
    State(state): State<SharedState>,
    body: Result<Json<PlayerRequest>, JsonRejection>,
) -> Result<Json<RestartResponse>, ApiError> {
    let Json(request) = body?;
    let key = session_key(&request)?;
    let (session, _) = state.sessions.get_or_create(&key, now_ms()).await;

    let fresh = session.lock().await.restart().clone();

    // The play counter is best effort; a failed write never blocks a new run.
    let mut leaderboard = state.leaderboard.lock().await;
    let total_plays = match leaderboard.record_play(&key.post_id) {
        Ok(total) => total,
        Err(error) => {
            log::warn!("[server] play not counted for {}: {error}", key.post_id);
            leaderboard.total_plays(&key.post_id)
        }
    };
    Ok(Json(RestartResponse::new(&key.post_id, &fresh, total_plays)))
}

pub async fn submit_score_handler(
    State(state): State<SharedState>,
    body: Result<Json<PlayerRequest>, JsonRejection>,
) -> Result<Json<SubmitScoreResponse>, ApiError> {
    let Json(request) = body?;
    let key = session_key(&request)?;
    let session = existing_session(&state, &key).await?;

    let mut session = session.lock().await;
    let rounds_survived = session.claim_score()?;
    let submission = ScoreSubmission {
        username: key.player.clone(),
        rounds_survived,
        victory: session.game_state() == GameState::Victory,
        stats: session.state().stats,
    };
    let recorded = state
        .leaderboard
        .lock()
        .await
        .record_score(&key.post_id, submission, now_ms());
    match recorded {
        Ok(rank) => {
            log::info!(
                "[server] score {rounds_survived} for {}/{} ranked {rank:?}",
                key.post_id,
                key.player
            );
            Ok(Json(SubmitScoreResponse::new(rank, rounds_survived)))
        }
        Err(error) => {
            session.release_score_claim();
            Err(error.into())
        }
    }
}

pub async fn leaderboard_handler(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let post_id = normalize_post_id(query.post_id.as_deref()).ok_or(ApiError::MissingPostId)?;
    let limit = parse_leaderboard_limit(query.limit.as_deref());
    let leaderboard = state.leaderboard.lock().await;
    Ok(Json(leaderboard.build_response(&post_id, limit)))
}

fn session_key(request: &PlayerRequest) -> Result<SessionKey, ApiError> {
    let post_id = normalize_post_id(request.post_id.as_deref()).ok_or(ApiError::MissingPostId)?;
    let player = sanitize_name(request.username.as_deref().unwrap_or_default());
    Ok(SessionKey::new(&post_id, &player))
}

async fn existing_session(state: &AppState, key: &SessionKey) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(key, now_ms())
        .await
        .ok_or(ApiError::UnknownSession)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SituationCatalog;
    use crate::engine::RoundEngine;
    use crate::rules::GameRules;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn state_with(leaderboard: Leaderboard) -> SharedState {
        let engine = RoundEngine::new(GameRules::default(), SituationCatalog::standard())
            .expect("valid rules");
        AppState::new(SessionStore::new(Arc::new(engine), 16), leaderboard)
    }

    fn player(post_id: &str, username: &str) -> PlayerRequest {
        PlayerRequest {
            post_id: Some(post_id.to_string()),
            username: Some(username.to_string()),
        }
    }

    fn body(post_id: &str, username: &str) -> Result<Json<PlayerRequest>, JsonRejection> {
        Ok(Json(player(post_id, username)))
    }

    async fn init(state: &SharedState, post_id: &str, username: &str) -> InitResponse {
        let Json(response) = init_handler(State(state.clone()), Query(player(post_id, username)))
            .await
            .expect("init succeeds");
        response
    }

    /// Two back-to-back clicks: the first lands, the second trips the rush rule.
    async fn finish_by_rushing(state: &SharedState, post_id: &str, username: &str) {
        let Json(first) = click_handler(State(state.clone()), body(post_id, username))
            .await
            .expect("first click");
        assert_eq!(first.game_state, GameState::Playing);
        let Json(second) = click_handler(State(state.clone()), body(post_id, username))
            .await
            .expect("second click");
        assert_eq!(second.game_state, GameState::Rushed);
    }

    #[tokio::test]
    async fn init_starts_a_fresh_game() {
        let state = state_with(Leaderboard::in_memory());
        let response = init(&state, "t3_post", " alice ").await;
        assert_eq!(response.kind, "init");
        assert_eq!(response.username, "alice");
        assert_eq!(response.game_state, GameState::Playing);
        assert_eq!(response.turn, 1);
        assert_eq!(response.clicks, 0);
        assert_eq!(response.clicks_needed, 5);
        assert!(response.situation.is_some());
        assert_eq!(response.high_score, 0);
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn missing_post_id_is_a_bad_request() {
        let state = state_with(Leaderboard::in_memory());
        let error = init_handler(State(state.clone()), Query(PlayerRequest::default()))
            .await
            .expect_err("post id required");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let error = click_handler(State(state), body("   ", "alice"))
            .await
            .expect_err("blank post id");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn click_without_init_is_not_found() {
        let state = state_with(Leaderboard::in_memory());
        let error = click_handler(State(state), body("t3_post", "ghost"))
            .await
            .expect_err("no session");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rushed_game_rejects_clicks_until_restart() {
        let state = state_with(Leaderboard::in_memory());
        init(&state, "t3_post", "alice").await;
        finish_by_rushing(&state, "t3_post", "alice").await;

        let error = click_handler(State(state.clone()), body("t3_post", "alice"))
            .await
            .expect_err("terminal session");
        assert_eq!(error.status_code(), StatusCode::CONFLICT);

        let Json(restarted) = restart_handler(State(state.clone()), body("t3_post", "alice"))
            .await
            .expect("restart");
        assert_eq!(restarted.game_state, GameState::Playing);
        assert_eq!(restarted.turn, 1);
        assert_eq!(restarted.total_plays, 1);

        let resumed = init(&state, "t3_post", "alice").await;
        assert_eq!(resumed.total_plays, 1);
        assert_eq!(resumed.clicks, 0);
    }

    #[tokio::test]
    async fn score_is_submitted_once_per_run() {
        let state = state_with(Leaderboard::in_memory());
        init(&state, "t3_post", "alice").await;

        let error = submit_score_handler(State(state.clone()), body("t3_post", "alice"))
            .await
            .expect_err("still playing");
        assert_eq!(error.status_code(), StatusCode::CONFLICT);

        finish_by_rushing(&state, "t3_post", "alice").await;
        let Json(submitted) = submit_score_handler(State(state.clone()), body("t3_post", "alice"))
            .await
            .expect("submit");
        assert!(submitted.success);
        assert_eq!(submitted.rank, Some(1));
        assert_eq!(submitted.rounds_survived, 0);

        let error = submit_score_handler(State(state.clone()), body("t3_post", "alice"))
            .await
            .expect_err("already submitted");
        assert_eq!(error.status_code(), StatusCode::CONFLICT);

        let Json(board) = leaderboard_handler(
            State(state.clone()),
            Query(LeaderboardQuery {
                post_id: Some("t3_post".to_string()),
                limit: Some("5".to_string()),
            }),
        )
        .await
        .expect("leaderboard");
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].username, "alice");
    }

    #[tokio::test]
    async fn storage_failure_is_unavailable_and_keeps_claim_open() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let blocker = std::env::temp_dir().join(format!("toclickornot-app-{nanos}"));
        fs::write(&blocker, "not a directory").expect("write blocker");
        let state = state_with(Leaderboard::new(blocker.join("leaderboard.json")));

        init(&state, "t3_post", "alice").await;
        finish_by_rushing(&state, "t3_post", "alice").await;
        for _ in 0..2 {
            let error = submit_score_handler(State(state.clone()), body("t3_post", "alice"))
                .await
                .expect_err("storage fails");
            assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        }

        let _ = fs::remove_file(blocker);
    }

    #[tokio::test]
    async fn restart_survives_storage_failure() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let blocker = std::env::temp_dir().join(format!("toclickornot-restart-{nanos}"));
        fs::write(&blocker, "not a directory").expect("write blocker");
        let state = state_with(Leaderboard::new(blocker.join("leaderboard.json")));

        init(&state, "t3_post", "alice").await;
        finish_by_rushing(&state, "t3_post", "alice").await;

        let Json(restarted) = restart_handler(State(state.clone()), body("t3_post", "alice"))
            .await
            .expect("restart does not depend on storage");
        assert_eq!(restarted.game_state, GameState::Playing);
        assert_eq!(restarted.turn, 1);
        assert_eq!(restarted.total_plays, 0);

        let Json(click) = click_handler(State(state.clone()), body("t3_post", "alice"))
            .await
            .expect("new run accepts clicks");
        assert_eq!(click.game_state, GameState::Playing);

        let _ = fs::remove_file(blocker);
    }

    #[tokio::test]
    async fn config_exposes_rules() {
        let state = state_with(Leaderboard::in_memory());
        let Json(config) = config_handler(State(state)).await;
        assert_eq!(config.rules, GameRules::default());
        assert_eq!(config.stat_max, 100);
    }

    #[test]
    fn errors_render_status_and_message() {
        let response = ApiError::Game(GameError::ScoreAlreadySubmitted).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let response = ApiError::UnknownSession.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
