use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_LEADERBOARD_LIMIT, MAX_ENTRIES_PER_POST, MAX_LEADERBOARD_LIMIT};
use crate::server_protocol::LeaderboardResponse;
use crate::stats::{clamp_stat, Stats};

const FILE_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("failed to write leaderboard {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize leaderboard: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct StoredScore {
    username: String,
    #[serde(rename = "roundsSurvived", alias = "rounds_survived")]
    rounds_survived: u32,
    #[serde(default)]
    victory: bool,
    stats: Stats,
    #[serde(rename = "recordedAtMs", alias = "recorded_at_ms")]
    recorded_at_ms: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoredBoard {
    #[serde(default)]
    scores: Vec<StoredScore>,
    #[serde(rename = "highScore", alias = "high_score", default)]
    high_score: u32,
    #[serde(rename = "totalPlays", alias = "total_plays", default)]
    total_plays: u64,
}

#[derive(Clone, Debug, Serialize)]
struct LeaderboardFile<'a> {
    version: u8,
    posts: &'a HashMap<String, StoredBoard>,
}

#[derive(Clone, Debug, Deserialize)]
struct LeaderboardFileRaw {
    version: u8,
    posts: HashMap<String, serde_json::Value>,
}

#[derive(Clone, Debug)]
pub struct ScoreSubmission {
    pub username: String,
    pub rounds_survived: u32,
    pub victory: bool,
    pub stats: Stats,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(rename = "roundsSurvived")]
    pub rounds_survived: u32,
    pub victory: bool,
    pub stats: Stats,
    pub timestamp: u64,
}

/// Per-post scores, high score and play counter, persisted as one JSON file.
///
/// Single-process store: every change rewrites the whole file synchronously. Callers keep it
/// behind one mutex and hold no session lock while writing play counts.
pub struct Leaderboard {
    file_path: Option<PathBuf>,
    posts: HashMap<String, StoredBoard>,
}

impl Leaderboard {
    pub fn new(file_path: PathBuf) -> Self {
        let posts = load_posts(&file_path);
        Self {
            file_path: Some(file_path),
            posts,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            file_path: None,
            posts: HashMap::new(),
        }
    }

    /// Stores a finished run and returns its 1-based rank, or `None` if it fell off the board.
    pub fn record_score(
        &mut self,
        post_id: &str,
        submission: ScoreSubmission,
        now_ms: u64,
    ) -> Result<Option<usize>, LeaderboardError> {
        let score = StoredScore {
            username: submission.username.trim().to_string(),
            rounds_survived: submission.rounds_survived,
            victory: submission.victory,
            stats: submission.stats,
            recorded_at_ms: now_ms,
        };

        let mut board = self.posts.get(post_id).cloned().unwrap_or_default();
        let rank = board
            .scores
            .iter()
            .filter(|existing| cmp_scores(existing, &score) != Ordering::Greater)
            .count()
            + 1;
        board.high_score = board.high_score.max(score.rounds_survived);
        board.scores.push(score);
        board.scores.sort_by(cmp_scores);
        board.scores.truncate(MAX_ENTRIES_PER_POST);

        self.commit(post_id, board)?;
        Ok((rank <= MAX_ENTRIES_PER_POST).then_some(rank))
    }

    pub fn record_play(&mut self, post_id: &str) -> Result<u64, LeaderboardError> {
        let mut board = self.posts.get(post_id).cloned().unwrap_or_default();
        board.total_plays += 1;
        let total = board.total_plays;
        self.commit(post_id, board)?;
        Ok(total)
    }

    pub fn high_score(&self, post_id: &str) -> u32 {
        self.posts
            .get(post_id)
            .map(|board| board.high_score)
            .unwrap_or(0)
    }

    pub fn total_plays(&self, post_id: &str) -> u64 {
        self.posts
            .get(post_id)
            .map(|board| board.total_plays)
            .unwrap_or(0)
    }

    pub fn top(&self, post_id: &str, requested_limit: Option<usize>) -> Vec<LeaderboardEntry> {
        let limit = requested_limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT);
        let Some(board) = self.posts.get(post_id) else {
            return Vec::new();
        };
        board
            .scores
            .iter()
            .take(limit)
            .map(|score| LeaderboardEntry {
                username: score.username.clone(),
                rounds_survived: score.rounds_survived,
                victory: score.victory,
                stats: score.stats,
                timestamp: score.recorded_at_ms,
            })
            .collect()
    }

    pub fn build_response(
        &self,
        post_id: &str,
        requested_limit: Option<usize>,
    ) -> LeaderboardResponse {
        LeaderboardResponse::new(
            post_id,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            self.top(post_id, requested_limit),
        )
    }

    /// A failed write puts the previous board back.
    fn commit(&mut self, post_id: &str, board: StoredBoard) -> Result<(), LeaderboardError> {
        let previous = self.posts.insert(post_id.to_string(), board);
        if let Err(error) = self.save() {
            match previous {
                Some(previous) => self.posts.insert(post_id.to_string(), previous),
                None => self.posts.remove(post_id),
            };
            return Err(error);
        }
        Ok(())
    }

    fn save(&self) -> Result<(), LeaderboardError> {
        let Some(file_path) = self.file_path.as_ref() else {
            return Ok(());
        };
        let io_error = |source: std::io::Error| LeaderboardError::Io {
            path: file_path.display().to_string(),
            source,
        };
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }
        let payload = LeaderboardFile {
            version: FILE_VERSION,
            posts: &self.posts,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(file_path, text).map_err(io_error)
    }
}

fn cmp_scores(a: &StoredScore, b: &StoredScore) -> Ordering {
    b.rounds_survived
        .cmp(&a.rounds_survived)
        .then_with(|| a.recorded_at_ms.cmp(&b.recorded_at_ms))
        .then_with(|| a.username.to_lowercase().cmp(&b.username.to_lowercase()))
}

fn load_posts(path: &Path) -> HashMap<String, StoredBoard> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                log::warn!("[leaderboard] failed to read {}: {error}", path.display());
            }
            return HashMap::new();
        }
    };
    let parsed = match serde_json::from_str::<LeaderboardFileRaw>(&text) {
        Ok(value) if value.version == FILE_VERSION => value,
        Ok(value) => {
            log::warn!(
                "[leaderboard] unsupported version {} at {}",
                value.version,
                path.display()
            );
            return HashMap::new();
        }
        Err(error) => {
            log::warn!("[leaderboard] failed to parse {}: {error}", path.display());
            return HashMap::new();
        }
    };

    let mut posts = HashMap::new();
    for (post_id, raw_board) in parsed.posts {
        let Some(raw_scores) = raw_board.get("scores").and_then(|value| value.as_array()) else {
            log::warn!(
                "[leaderboard] post '{post_id}' in {} has no score list",
                path.display()
            );
            continue;
        };
        let mut board = StoredBoard {
            scores: Vec::new(),
            high_score: read_u64(&raw_board, "highScore").min(u32::MAX as u64) as u32,
            total_plays: read_u64(&raw_board, "totalPlays"),
        };
        for raw_score in raw_scores {
            match serde_json::from_value::<StoredScore>(raw_score.clone()) {
                Ok(score) => {
                    if let Some(score) = sanitize_score(score) {
                        board.scores.push(score);
                    }
                }
                Err(error) => {
                    log::warn!(
                        "[leaderboard] skipping score in post '{post_id}' at {}: {error}",
                        path.display()
                    );
                }
            }
        }
        board.scores.sort_by(cmp_scores);
        board.scores.truncate(MAX_ENTRIES_PER_POST);
        let best = board
            .scores
            .iter()
            .map(|score| score.rounds_survived)
            .max()
            .unwrap_or(0);
        board.high_score = board.high_score.max(best);
        posts.insert(post_id, board);
    }
    posts
}

fn read_u64(value: &serde_json::Value, key: &str) -> u64 {
    value.get(key).and_then(|value| value.as_u64()).unwrap_or(0)
}

fn sanitize_score(score: StoredScore) -> Option<StoredScore> {
    let username = score.username.trim().to_string();
    if username.is_empty() {
        return None;
    }
    Some(StoredScore {
        username,
        stats: Stats {
            health: clamp_stat(score.stats.health),
            sanity: clamp_stat(score.stats.sanity),
            hope: clamp_stat(score.stats.hope),
            financial: clamp_stat(score.stats.financial),
        },
        ..score
    })
}
