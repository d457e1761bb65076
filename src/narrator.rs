use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;
use crate::stats::{StatKind, Stats};

pub const RUSH_MESSAGE: &str = "You rushed through life too fast. Slow down next time.";

const VICTORY_MESSAGES: [&str; 6] = [
    "Against all odds, you survived. But at what cost?",
    "You made it. The simulation is complete... for now.",
    "SURVIVAL VERIFIED. You are a statistical anomaly.",
    "10 rounds survived. Your resilience is... noted.",
    "You navigated the chaos. The simulation acknowledges your persistence.",
    "LIFE.EXE completed without fatal errors. Impressive.",
];

/// Which stat ran out first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Health,
    Sanity,
    Hope,
    Financial,
}

impl DeathCause {
    fn from_stat(kind: StatKind) -> Self {
        match kind {
            StatKind::Health => Self::Health,
            StatKind::Sanity => Self::Sanity,
            StatKind::Hope => Self::Hope,
            StatKind::Financial => Self::Financial,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Health => "Your body gave out. SYSTEM FAILURE.",
            Self::Sanity => "Reality became too much. MIND OVERFLOW.",
            Self::Hope => "The void consumed you. HOPE.EXE NOT FOUND.",
            Self::Financial => "Bankruptcy complete. WALLET CORRUPTED.",
        }
    }
}

/// Checks health, sanity, hope and financial in that order and reports the first one at zero.
pub fn check_game_over(stats: &Stats) -> Option<DeathCause> {
    StatKind::ALL
        .into_iter()
        .find(|kind| stats.is_depleted(*kind))
        .map(DeathCause::from_stat)
}

pub fn victory_message<R: RandomSource + ?Sized>(rng: &mut R) -> &'static str {
    VICTORY_MESSAGES[rng.pick_index(VICTORY_MESSAGES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SequenceRng;

    fn stats(health: i32, sanity: i32, hope: i32, financial: i32) -> Stats {
        Stats {
            health,
            sanity,
            hope,
            financial,
        }
    }

    #[test]
    fn alive_when_every_stat_is_positive() {
        assert_eq!(check_game_over(&stats(1, 1, 1, 1)), None);
        assert_eq!(check_game_over(&stats(100, 100, 100, 100)), None);
        assert_eq!(check_game_over(&Stats::default()), None);
    }

    #[test]
    fn health_wins_ties() {
        assert_eq!(
            check_game_over(&stats(0, 0, 50, 50)),
            Some(DeathCause::Health)
        );
        assert_eq!(check_game_over(&stats(0, 0, 0, 0)), Some(DeathCause::Health));
    }

    #[test]
    fn priority_follows_fixed_order() {
        assert_eq!(check_game_over(&stats(5, 0, 0, 0)), Some(DeathCause::Sanity));
        assert_eq!(check_game_over(&stats(5, 5, 0, 0)), Some(DeathCause::Hope));
        assert_eq!(
            check_game_over(&stats(5, 5, 5, 0)),
            Some(DeathCause::Financial)
        );
    }

    #[test]
    fn death_messages_are_distinct() {
        let messages: Vec<&str> = [
            DeathCause::Health,
            DeathCause::Sanity,
            DeathCause::Hope,
            DeathCause::Financial,
        ]
        .into_iter()
        .map(DeathCause::message)
        .collect();
        for (idx, message) in messages.iter().enumerate() {
            assert!(!messages[idx + 1..].contains(message));
        }
    }

    #[test]
    fn victory_message_comes_from_the_fixed_set() {
        let mut rng = SequenceRng::new(vec![0.0, 0.5, 0.99]);
        for _ in 0..3 {
            assert!(VICTORY_MESSAGES.contains(&victory_message(&mut rng)));
        }
    }
}
