use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CLICKS_PER_ROUND, MAX_ROUNDS, RUSH_MIN_GAP_MS, RUSH_WINDOW_MAX_CLICKS, RUSH_WINDOW_MS,
};

/// How fast is too fast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RushRule {
    /// Two consecutive clicks closer than `min_gap_ms`.
    MinGap {
        #[serde(rename = "minGapMs")]
        min_gap_ms: u64,
    },
    /// `max_clicks` clicks, the current one included, inside the trailing `window_ms`.
    Window {
        #[serde(rename = "windowMs")]
        window_ms: u64,
        #[serde(rename = "maxClicks")]
        max_clicks: usize,
    },
}

impl Default for RushRule {
    fn default() -> Self {
        Self::MinGap {
            min_gap_ms: RUSH_MIN_GAP_MS,
        }
    }
}

impl RushRule {
    pub fn default_window() -> Self {
        Self::Window {
            window_ms: RUSH_WINDOW_MS,
            max_clicks: RUSH_WINDOW_MAX_CLICKS,
        }
    }
}

impl fmt::Display for RushRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinGap { min_gap_ms } => write!(f, "gap:{min_gap_ms}"),
            Self::Window {
                window_ms,
                max_clicks,
            } => write!(f, "window:{max_clicks}/{window_ms}"),
        }
    }
}

/// Accepts `gap:<ms>` or `window:<clicks>/<ms>`.
impl FromStr for RushRule {
    type Err = RulesError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || RulesError::InvalidRushRule(raw.to_string());
        let normalized = raw.trim().to_ascii_lowercase();
        let (kind, params) = normalized.split_once(':').ok_or_else(invalid)?;
        let rule = match kind {
            "gap" => Self::MinGap {
                min_gap_ms: params.trim().parse().map_err(|_| invalid())?,
            },
            "window" => {
                let (clicks, window) = params.split_once('/').ok_or_else(invalid)?;
                Self::Window {
                    window_ms: window.trim().parse().map_err(|_| invalid())?,
                    max_clicks: clicks.trim().parse().map_err(|_| invalid())?,
                }
            }
            _ => return Err(invalid()),
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl RushRule {
    fn validate(&self) -> Result<(), RulesError> {
        match *self {
            Self::MinGap { min_gap_ms } if min_gap_ms == 0 => {
                Err(RulesError::InvalidRushRule(self.to_string()))
            }
            Self::Window {
                window_ms,
                max_clicks,
            } if window_ms == 0 || max_clicks < 2 => {
                Err(RulesError::InvalidRushRule(self.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("max rounds must be at least 1")]
    NoRounds,
    #[error("clicks per round must be at least 1")]
    NoClicks,
    #[error("invalid rush rule '{0}' (expected gap:<ms> or window:<clicks>/<ms>)")]
    InvalidRushRule(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    #[serde(rename = "maxRounds")]
    pub max_rounds: u32,
    #[serde(rename = "clicksPerRound")]
    pub clicks_per_round: u32,
    pub rush: RushRule,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            clicks_per_round: CLICKS_PER_ROUND,
            rush: RushRule::default(),
        }
    }
}

impl GameRules {
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.max_rounds == 0 {
            return Err(RulesError::NoRounds);
        }
        if self.clicks_per_round == 0 {
            return Err(RulesError::NoClicks);
        }
        self.rush.validate()
    }
}
