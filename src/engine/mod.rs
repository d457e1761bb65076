use serde::{Deserialize, Serialize};

use crate::catalog::{Situation, SituationCatalog};
use crate::constants::rounds_survived;
use crate::narrator::{check_game_over, victory_message, DeathCause, RUSH_MESSAGE};
use crate::rng::RandomSource;
use crate::rules::{GameRules, RulesError};
use crate::stats::Stats;
use crate::types::{ClickOutcome, Ending, GameError, GameState};

mod rush;

/// Everything one player's run needs between clicks. Only [`RoundEngine`] mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub stats: Stats,
    pub round: u32,
    #[serde(rename = "clicksThisRound")]
    pub clicks_this_round: u32,
    #[serde(rename = "gameState")]
    pub game_state: GameState,
    #[serde(rename = "lastClickMs")]
    pub last_click_ms: Option<u64>,
    pub situation: Option<Situation>,
    pub ending: Option<Ending>,
    #[serde(rename = "scoreSubmitted")]
    pub score_submitted: bool,
    #[serde(rename = "recentClicks", default)]
    recent_clicks: Vec<u64>,
}

impl SessionState {
    pub fn rounds_survived(&self, max_rounds: u32) -> u32 {
        rounds_survived(
            self.round,
            self.game_state == GameState::Victory,
            max_rounds,
        )
    }
}

#[derive(Clone, Debug)]
pub struct RoundEngine {
    rules: GameRules,
    catalog: SituationCatalog,
}

impl RoundEngine {
    pub fn new(rules: GameRules, catalog: SituationCatalog) -> Result<Self, RulesError> {
        rules.validate()?;
        Ok(Self { rules, catalog })
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn catalog(&self) -> &SituationCatalog {
        &self.catalog
    }

    /// A brand-new run with an opening situation on display. The opening effect is not applied.
    pub fn fresh_session<R: RandomSource + ?Sized>(&self, rng: &mut R) -> SessionState {
        SessionState {
            stats: Stats::default(),
            round: 1,
            clicks_this_round: 0,
            game_state: GameState::Playing,
            last_click_ms: None,
            situation: Some(self.catalog.draw_situation(rng)),
            ending: None,
            score_submitted: false,
            recent_clicks: Vec::new(),
        }
    }

    pub fn register_click<R: RandomSource + ?Sized>(
        &self,
        session: &mut SessionState,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<ClickOutcome, GameError> {
        if session.game_state.is_terminal() {
            return Err(GameError::InvalidOperation(session.game_state));
        }

        if rush::is_rushed(
            &self.rules.rush,
            session.last_click_ms,
            &session.recent_clicks,
            now_ms,
        ) {
            session.game_state = GameState::Rushed;
            session.ending = Some(Ending {
                message: RUSH_MESSAGE.to_string(),
                cause: None,
            });
            return Ok(ClickOutcome::Rushed {
                message: RUSH_MESSAGE.to_string(),
            });
        }
        session.last_click_ms = Some(now_ms);
        rush::record_click(&self.rules.rush, &mut session.recent_clicks, now_ms);

        session.clicks_this_round += 1;
        let situation = self.catalog.draw_situation(rng);
        session.stats = session.stats.apply(&situation.effect);
        session.situation = Some(situation.clone());

        if let Some(cause) = check_game_over(&session.stats) {
            return Ok(end_in_death(session, cause, situation, None));
        }

        if session.clicks_this_round < self.rules.clicks_per_round {
            return Ok(ClickOutcome::InProgress {
                clicks: session.clicks_this_round,
                situation,
                stats: session.stats,
            });
        }

        session.clicks_this_round = 0;
        session.round += 1;
        if session.round > self.rules.max_rounds {
            let message = victory_message(rng).to_string();
            session.game_state = GameState::Victory;
            session.ending = Some(Ending {
                message: message.clone(),
                cause: None,
            });
            return Ok(ClickOutcome::Victory {
                message,
                rounds_survived: session.rounds_survived(self.rules.max_rounds),
                situation,
                stats: session.stats,
            });
        }

        let round_event = self.catalog.draw_round_event(rng);
        session.stats = session.stats.apply(&round_event.effect);
        session.situation = Some(round_event.clone());
        if let Some(cause) = check_game_over(&session.stats) {
            return Ok(end_in_death(session, cause, situation, Some(round_event)));
        }

        Ok(ClickOutcome::RoundComplete {
            round: session.round,
            situation,
            round_event,
            stats: session.stats,
        })
    }
}

fn end_in_death(
    session: &mut SessionState,
    cause: DeathCause,
    situation: Situation,
    round_event: Option<Situation>,
) -> ClickOutcome {
    session.game_state = GameState::GameOver;
    session.ending = Some(Ending {
        message: cause.message().to_string(),
        cause: Some(cause),
    });
    ClickOutcome::GameOver {
        cause,
        message: cause.message().to_string(),
        round: session.round,
        clicks: session.clicks_this_round,
        situation,
        round_event,
        stats: session.stats,
    }
}
