use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Situation;
use crate::narrator::DeathCause;
use crate::stats::Stats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Playing,
    GameOver,
    Victory,
    Rushed,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        self != Self::Playing
    }
}

/// Why a run stopped, kept on the session for later reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ending {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<DeathCause>,
}

/// Result of one accepted click registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickOutcome {
    InProgress {
        clicks: u32,
        situation: Situation,
        stats: Stats,
    },
    RoundComplete {
        round: u32,
        situation: Situation,
        #[serde(rename = "roundEvent")]
        round_event: Situation,
        stats: Stats,
    },
    GameOver {
        cause: DeathCause,
        message: String,
        round: u32,
        clicks: u32,
        situation: Situation,
        #[serde(rename = "roundEvent", skip_serializing_if = "Option::is_none")]
        round_event: Option<Situation>,
        stats: Stats,
    },
    Victory {
        message: String,
        #[serde(rename = "roundsSurvived")]
        rounds_survived: u32,
        situation: Situation,
        stats: Stats,
    },
    Rushed {
        message: String,
    },
}

impl ClickOutcome {
    pub fn game_state(&self) -> GameState {
        match self {
            Self::InProgress { .. } | Self::RoundComplete { .. } => GameState::Playing,
            Self::GameOver { .. } => GameState::GameOver,
            Self::Victory { .. } => GameState::Victory,
            Self::Rushed { .. } => GameState::Rushed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.game_state().is_terminal()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("game is not active (state {0:?}); restart first")]
    InvalidOperation(GameState),
    #[error("game is still running")]
    StillPlaying,
    #[error("score for this run was already submitted")]
    ScoreAlreadySubmitted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_state_wire_names_match_client() {
        let names: Vec<String> = [
            GameState::Playing,
            GameState::GameOver,
            GameState::Victory,
            GameState::Rushed,
        ]
        .iter()
        .map(|state| serde_json::to_string(state).expect("serialize state"))
        .collect();
        assert_eq!(
            names,
            vec!["\"PLAYING\"", "\"GAME_OVER\"", "\"VICTORY\"", "\"RUSHED\""]
        );
    }

    #[test]
    fn only_playing_is_non_terminal() {
        assert!(!GameState::Playing.is_terminal());
        assert!(GameState::GameOver.is_terminal());
        assert!(GameState::Victory.is_terminal());
        assert!(GameState::Rushed.is_terminal());
    }

    #[test]
    fn rushed_outcome_is_terminal() {
        let outcome = ClickOutcome::Rushed {
            message: "slow down".to_string(),
        };
        assert!(outcome.is_terminal());
        let value = serde_json::to_value(&outcome).expect("serialize outcome");
        assert_eq!(value["kind"], "rushed");
    }
}
