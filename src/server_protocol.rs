use serde::{Deserialize, Serialize};

use crate::catalog::Situation;
use crate::constants::{STAT_INITIAL, STAT_MAX, STAT_MIN};
use crate::engine::SessionState;
use crate::leaderboard::LeaderboardEntry;
use crate::narrator::DeathCause;
use crate::rules::GameRules;
use crate::stats::Stats;
use crate::types::{ClickOutcome, GameState};

/// Identifies the caller: `GET` routes read it from the query, `POST` routes from the body.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlayerRequest {
    #[serde(rename = "postId", alias = "post_id", default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(rename = "postId", alias = "post_id", default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub rules: GameRules,
    #[serde(rename = "statMin")]
    pub stat_min: i32,
    #[serde(rename = "statMax")]
    pub stat_max: i32,
    #[serde(rename = "statInitial")]
    pub stat_initial: i32,
}

impl ConfigResponse {
    pub fn new(rules: GameRules) -> Self {
        Self {
            kind: "config",
            rules,
            stat_min: STAT_MIN,
            stat_max: STAT_MAX,
            stat_initial: STAT_INITIAL,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct InitResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "postId")]
    pub post_id: String,
    pub username: String,
    #[serde(rename = "gameState")]
    pub game_state: GameState,
    pub turn: u32,
    pub clicks: u32,
    #[serde(rename = "clicksNeeded")]
    pub clicks_needed: u32,
    pub stats: Stats,
    pub situation: Option<Situation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    #[serde(rename = "totalPlays")]
    pub total_plays: u64,
}

impl InitResponse {
    pub fn new(
        post_id: &str,
        username: &str,
        state: &SessionState,
        rules: &GameRules,
        high_score: u32,
        total_plays: u64,
    ) -> Self {
        Self {
            kind: "init",
            post_id: post_id.to_string(),
            username: username.to_string(),
            game_state: state.game_state,
            turn: state.round,
            clicks: state.clicks_this_round,
            clicks_needed: rules.clicks_per_round,
            stats: state.stats,
            situation: state.situation.clone(),
            message: state.ending.as_ref().map(|ending| ending.message.clone()),
            high_score,
            total_plays,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ClickResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "postId")]
    pub post_id: String,
    #[serde(rename = "gameState")]
    pub game_state: GameState,
    pub clicks: u32,
    #[serde(rename = "clicksNeeded")]
    pub clicks_needed: u32,
    pub turn: u32,
    #[serde(rename = "turnComplete")]
    pub turn_complete: bool,
    pub stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub situation: Option<Situation>,
    #[serde(rename = "roundEvent", skip_serializing_if = "Option::is_none")]
    pub round_event: Option<Situation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "deathCause", skip_serializing_if = "Option::is_none")]
    pub death_cause: Option<DeathCause>,
    #[serde(rename = "roundsSurvived", skip_serializing_if = "Option::is_none")]
    pub rounds_survived: Option<u32>,
}

impl ClickResponse {
    pub fn new(
        post_id: &str,
        state: &SessionState,
        outcome: &ClickOutcome,
        rules: &GameRules,
    ) -> Self {
        let mut response = Self {
            kind: "click",
            post_id: post_id.to_string(),
            game_state: outcome.game_state(),
            clicks: state.clicks_this_round,
            clicks_needed: rules.clicks_per_round,
            turn: state.round,
            turn_complete: false,
            stats: state.stats,
            situation: None,
            round_event: None,
            message: None,
            death_cause: None,
            rounds_survived: outcome
                .is_terminal()
                .then(|| state.rounds_survived(rules.max_rounds)),
        };
        match outcome {
            ClickOutcome::InProgress { situation, .. } => {
                response.situation = Some(situation.clone());
            }
            ClickOutcome::RoundComplete {
                situation,
                round_event,
                ..
            } => {
                response.turn_complete = true;
                response.situation = Some(situation.clone());
                response.round_event = Some(round_event.clone());
            }
            ClickOutcome::GameOver {
                cause,
                message,
                situation,
                round_event,
                ..
            } => {
                response.turn_complete = round_event.is_some();
                response.situation = Some(situation.clone());
                response.round_event = round_event.clone();
                response.message = Some(message.clone());
                response.death_cause = Some(*cause);
            }
            ClickOutcome::Victory {
                message, situation, ..
            } => {
                response.turn_complete = true;
                response.situation = Some(situation.clone());
                response.message = Some(message.clone());
            }
            ClickOutcome::Rushed { message } => {
                response.message = Some(message.clone());
            }
        }
        response
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RestartResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "postId")]
    pub post_id: String,
    pub turn: u32,
    pub stats: Stats,
    pub situation: Option<Situation>,
    #[serde(rename = "gameState")]
    pub game_state: GameState,
    #[serde(rename = "totalPlays")]
    pub total_plays: u64,
}

impl RestartResponse {
    pub fn new(post_id: &str, state: &SessionState, total_plays: u64) -> Self {
        Self {
            kind: "restart",
            post_id: post_id.to_string(),
            turn: state.round,
            stats: state.stats,
            situation: state.situation.clone(),
            game_state: state.game_state,
            total_plays,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmitScoreResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(rename = "roundsSurvived")]
    pub rounds_survived: u32,
}

impl SubmitScoreResponse {
    pub fn new(rank: Option<usize>, rounds_survived: u32) -> Self {
        Self {
            kind: "submit",
            success: true,
            rank,
            rounds_survived,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "postId")]
    pub post_id: String,
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<LeaderboardEntry>,
}

impl LeaderboardResponse {
    pub fn new(post_id: &str, generated_at_iso: String, entries: Vec<LeaderboardEntry>) -> Self {
        Self {
            kind: "leaderboard",
            post_id: post_id.to_string(),
            generated_at_iso,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SituationCatalog, SituationTemplate};
    use crate::engine::RoundEngine;
    use crate::rng::SequenceRng;
    use crate::stats::{Effect, StatKind};
    use serde_json::Value;

    fn engine(click: Effect) -> RoundEngine {
        let catalog = SituationCatalog::new(
            vec![],
            vec![SituationTemplate::fixed("click", click)],
            vec![SituationTemplate::fixed("dawn", Effect::none())],
            0.0,
        )
        .expect("valid catalog");
        RoundEngine::new(GameRules::default(), catalog).expect("valid rules")
    }

    fn to_value<T: Serialize>(value: &T) -> Value {
        serde_json::to_value(value).expect("serialize response")
    }

    #[test]
    fn player_request_accepts_camel_and_snake_case() {
        let parsed: PlayerRequest =
            serde_json::from_str(r#"{"postId":"t3_x","username":"a"}"#).expect("camel case");
        assert_eq!(parsed.post_id.as_deref(), Some("t3_x"));
        let parsed: PlayerRequest = serde_json::from_str(r#"{"post_id":"t3_y"}"#).expect("snake");
        assert_eq!(parsed.post_id.as_deref(), Some("t3_y"));
        assert_eq!(parsed.username, None);
    }

    #[test]
    fn in_progress_click_carries_situation() {
        let engine = engine(Effect::single(StatKind::Hope, 2));
        let mut rng = SequenceRng::constant(0.0);
        let mut state = engine.fresh_session(&mut rng);
        let outcome = engine
            .register_click(&mut state, 0, &mut rng)
            .expect("playing");

        let value = to_value(&ClickResponse::new("t3_x", &state, &outcome, engine.rules()));
        assert_eq!(value["type"], "click");
        assert_eq!(value["postId"], "t3_x");
        assert_eq!(value["gameState"], "PLAYING");
        assert_eq!(value["clicks"], 1);
        assert_eq!(value["clicksNeeded"], 5);
        assert_eq!(value["turnComplete"], false);
        assert_eq!(value["situation"]["effects"]["hope"], 2);
        assert_eq!(value["stats"]["hope"], 52);
        assert!(value.get("roundsSurvived").is_none());
        assert!(value.get("message").is_none());
    }

    #[test]
    fn round_completion_reports_new_turn_and_event() {
        let engine = engine(Effect::none());
        let mut rng = SequenceRng::constant(0.0);
        let mut state = engine.fresh_session(&mut rng);
        let mut outcome = None;
        for idx in 0..5u64 {
            outcome = Some(
                engine
                    .register_click(&mut state, idx * 1_000, &mut rng)
                    .expect("playing"),
            );
        }
        let outcome = outcome.expect("clicked");
        let value = to_value(&ClickResponse::new("t3_x", &state, &outcome, engine.rules()));
        assert_eq!(value["turnComplete"], true);
        assert_eq!(value["turn"], 2);
        assert_eq!(value["clicks"], 0);
        assert_eq!(value["roundEvent"]["message"], "dawn");
    }

    #[test]
    fn death_reports_cause_and_rounds() {
        let engine = engine(Effect::single(StatKind::Sanity, -50));
        let mut rng = SequenceRng::constant(0.0);
        let mut state = engine.fresh_session(&mut rng);
        let outcome = engine
            .register_click(&mut state, 0, &mut rng)
            .expect("playing");
        let value = to_value(&ClickResponse::new("t3_x", &state, &outcome, engine.rules()));
        assert_eq!(value["gameState"], "GAME_OVER");
        assert_eq!(value["deathCause"], "sanity");
        assert_eq!(value["message"], DeathCause::Sanity.message());
        assert_eq!(value["roundsSurvived"], 0);
        assert_eq!(value["turnComplete"], false);
    }

    #[test]
    fn rushed_click_has_message_but_no_situation() {
        let engine = engine(Effect::none());
        let mut rng = SequenceRng::constant(0.0);
        let mut state = engine.fresh_session(&mut rng);
        engine
            .register_click(&mut state, 1_000, &mut rng)
            .expect("playing");
        let outcome = engine
            .register_click(&mut state, 1_010, &mut rng)
            .expect("playing");
        let value = to_value(&ClickResponse::new("t3_x", &state, &outcome, engine.rules()));
        assert_eq!(value["gameState"], "RUSHED");
        assert!(value.get("situation").is_none());
        assert!(value["message"].as_str().is_some());
    }

    #[test]
    fn init_response_reports_ending_message() {
        let engine = engine(Effect::single(StatKind::Health, -50));
        let mut rng = SequenceRng::constant(0.0);
        let mut state = engine.fresh_session(&mut rng);
        let fresh = to_value(&InitResponse::new("p", "u", &state, engine.rules(), 3, 9));
        assert_eq!(fresh["type"], "init");
        assert_eq!(fresh["gameState"], "PLAYING");
        assert_eq!(fresh["turn"], 1);
        assert_eq!(fresh["highScore"], 3);
        assert_eq!(fresh["totalPlays"], 9);
        assert!(fresh.get("message").is_none());

        engine
            .register_click(&mut state, 0, &mut rng)
            .expect("playing");
        let ended = to_value(&InitResponse::new("p", "u", &state, engine.rules(), 3, 9));
        assert_eq!(ended["gameState"], "GAME_OVER");
        assert_eq!(ended["message"], DeathCause::Health.message());
    }

    #[test]
    fn config_response_lists_bounds() {
        let value = to_value(&ConfigResponse::new(GameRules::default()));
        assert_eq!(value["statMin"], 0);
        assert_eq!(value["statMax"], 100);
        assert_eq!(value["statInitial"], 50);
        assert_eq!(value["rules"]["maxRounds"], 10);
    }
}
