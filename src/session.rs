use std::sync::Arc;

use crate::engine::{RoundEngine, SessionState};
use crate::rng::{RandomSource, Rng};
use crate::types::{ClickOutcome, GameError, GameState};

/// One player's game. Callers drive it through `start`, `register_click` and `restart`.
#[derive(Clone, Debug)]
pub struct GameSession<R = Rng> {
    engine: Arc<RoundEngine>,
    state: SessionState,
    rng: R,
}

impl<R: RandomSource> GameSession<R> {
    pub fn start(engine: Arc<RoundEngine>, mut rng: R) -> Self {
        let state = engine.fresh_session(&mut rng);
        Self { engine, state, rng }
    }

    pub fn register_click(&mut self, now_ms: u64) -> Result<ClickOutcome, GameError> {
        self.engine
            .register_click(&mut self.state, now_ms, &mut self.rng)
    }

    /// Throws the current run away and begins a new one.
    pub fn restart(&mut self) -> &SessionState {
        self.state = self.engine.fresh_session(&mut self.rng);
        &self.state
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn game_state(&self) -> GameState {
        self.state.game_state
    }

    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }

    pub fn rounds_survived(&self) -> u32 {
        self.state.rounds_survived(self.engine.rules().max_rounds)
    }

    /// Claims the score of a finished run. Each run can be claimed once.
    pub fn claim_score(&mut self) -> Result<u32, GameError> {
        if !self.state.game_state.is_terminal() {
            return Err(GameError::StillPlaying);
        }
        if self.state.score_submitted {
            return Err(GameError::ScoreAlreadySubmitted);
        }
        self.state.score_submitted = true;
        Ok(self.rounds_survived())
    }

    /// Undoes a claim whose score could not be stored.
    pub fn release_score_claim(&mut self) {
        self.state.score_submitted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SituationCatalog, SituationTemplate};
    use crate::narrator::DeathCause;
    use crate::rng::SequenceRng;
    use crate::rules::GameRules;
    use crate::stats::{Effect, StatKind, Stats};

    fn engine(click: Effect) -> Arc<RoundEngine> {
        let catalog = SituationCatalog::new(
            vec![],
            vec![SituationTemplate::fixed("click", click)],
            vec![SituationTemplate::fixed("round", Effect::none())],
            0.0,
        )
        .expect("valid catalog");
        Arc::new(RoundEngine::new(GameRules::default(), catalog).expect("valid rules"))
    }

    #[test]
    fn start_creates_a_playing_session() {
        let session = GameSession::start(engine(Effect::none()), SequenceRng::constant(0.0));
        assert_eq!(session.game_state(), GameState::Playing);
        assert_eq!(session.state().round, 1);
        assert_eq!(session.state().clicks_this_round, 0);
        assert_eq!(session.state().stats, Stats::uniform(50));
        assert_eq!(session.rounds_survived(), 0);
    }

    #[test]
    fn restart_after_game_over_resets_everything() {
        let mut session = GameSession::start(
            engine(Effect::single(StatKind::Health, -15)),
            SequenceRng::constant(0.0),
        );
        let mut last = None;
        for idx in 0..5u64 {
            match session.register_click(idx * 1_000) {
                Ok(outcome) => last = Some(outcome),
                Err(_) => break,
            }
        }
        assert!(matches!(
            last,
            Some(ClickOutcome::GameOver {
                cause: DeathCause::Health,
                ..
            })
        ));
        assert_eq!(session.game_state(), GameState::GameOver);

        let state = session.restart().clone();
        assert_eq!(state.game_state, GameState::Playing);
        assert_eq!(state.stats, Stats::uniform(50));
        assert_eq!(state.round, 1);
        assert_eq!(state.clicks_this_round, 0);
        assert!(state.situation.is_some());
        assert!(state.ending.is_none());

        // The rush clock restarts with the run.
        assert!(session.register_click(0).is_ok());
    }

    #[test]
    fn score_can_be_claimed_once_per_finished_run() {
        let mut session = GameSession::start(
            engine(Effect::single(StatKind::Financial, -30)),
            SequenceRng::constant(0.0),
        );
        assert_eq!(session.claim_score(), Err(GameError::StillPlaying));

        session.register_click(0).expect("playing");
        assert_eq!(session.game_state(), GameState::Playing);
        session.register_click(1_000).expect("playing");
        assert_eq!(session.game_state(), GameState::GameOver);

        assert_eq!(session.claim_score(), Ok(0));
        assert_eq!(session.claim_score(), Err(GameError::ScoreAlreadySubmitted));
        session.release_score_claim();
        assert_eq!(session.claim_score(), Ok(0));

        session.restart();
        assert_eq!(session.claim_score(), Err(GameError::StillPlaying));
    }
}
