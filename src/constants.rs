pub const MAX_ROUNDS: u32 = 10;
pub const CLICKS_PER_ROUND: u32 = 5;

pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;
pub const STAT_INITIAL: i32 = 50;

pub const RUSH_MIN_GAP_MS: u64 = 400;
pub const RUSH_WINDOW_MS: u64 = 1_000;
pub const RUSH_WINDOW_MAX_CLICKS: usize = 5;

pub const CORE_SITUATION_CHANCE: f32 = 0.25;
pub const POSITIVE_EFFECT_CHANCE: f32 = 0.6;
pub const POSITIVE_DELTA_RANGE: (i32, i32) = (2, 7);
pub const NEGATIVE_DELTA_RANGE: (i32, i32) = (-10, -4);
pub const MAX_STATS_PER_EFFECT: usize = 3;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
pub const MAX_ENTRIES_PER_POST: usize = 200;

pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

pub const ANONYMOUS_PLAYER: &str = "anonymous";

/// Rounds credited to a finished run: the full count on victory, otherwise completed rounds.
pub fn rounds_survived(round: u32, victory: bool, max_rounds: u32) -> u32 {
    if victory {
        return max_rounds;
    }
    round.saturating_sub(1).min(max_rounds)
}
