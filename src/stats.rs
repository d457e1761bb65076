use serde::{Deserialize, Serialize};

use crate::constants::{STAT_INITIAL, STAT_MAX, STAT_MIN};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Health,
    Sanity,
    Hope,
    Financial,
}

impl StatKind {
    /// Fixed order; game-over checks walk it front to back.
    pub const ALL: [StatKind; 4] = [
        StatKind::Health,
        StatKind::Sanity,
        StatKind::Hope,
        StatKind::Financial,
    ];
}

pub fn clamp_stat(value: i32) -> i32 {
    value.clamp(STAT_MIN, STAT_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub health: i32,
    pub sanity: i32,
    pub hope: i32,
    pub financial: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self::uniform(STAT_INITIAL)
    }
}

impl Stats {
    pub fn uniform(value: i32) -> Self {
        let value = clamp_stat(value);
        Self {
            health: value,
            sanity: value,
            hope: value,
            financial: value,
        }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Health => self.health,
            StatKind::Sanity => self.sanity,
            StatKind::Hope => self.hope,
            StatKind::Financial => self.financial,
        }
    }

    fn slot_mut(&mut self, kind: StatKind) -> &mut i32 {
        match kind {
            StatKind::Health => &mut self.health,
            StatKind::Sanity => &mut self.sanity,
            StatKind::Hope => &mut self.hope,
            StatKind::Financial => &mut self.financial,
        }
    }

    /// Adds every delta of `effect` and clamps each field into the stat bounds.
    pub fn apply(&self, effect: &Effect) -> Stats {
        let mut next = *self;
        for kind in StatKind::ALL {
            let slot = next.slot_mut(kind);
            *slot = clamp_stat(slot.saturating_add(effect.get(kind).unwrap_or(0)));
        }
        next
    }

    pub fn is_depleted(&self, kind: StatKind) -> bool {
        self.get(kind) <= STAT_MIN
    }
}

/// Signed deltas for a subset of the stats. Missing fields contribute nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hope: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial: Option<i32>,
}

impl Effect {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(kind: StatKind, delta: i32) -> Self {
        Self::none().with(kind, delta)
    }

    pub fn with(mut self, kind: StatKind, delta: i32) -> Self {
        self.set(kind, delta);
        self
    }

    pub fn get(&self, kind: StatKind) -> Option<i32> {
        match kind {
            StatKind::Health => self.health,
            StatKind::Sanity => self.sanity,
            StatKind::Hope => self.hope,
            StatKind::Financial => self.financial,
        }
    }

    pub fn set(&mut self, kind: StatKind, delta: i32) {
        let slot = match kind {
            StatKind::Health => &mut self.health,
            StatKind::Sanity => &mut self.sanity,
            StatKind::Hope => &mut self.hope,
            StatKind::Financial => &mut self.financial,
        };
        *slot = Some(delta);
    }

    pub fn touched(&self) -> impl Iterator<Item = (StatKind, i32)> + '_ {
        StatKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|delta| (kind, delta)))
    }

    pub fn is_empty(&self) -> bool {
        self.touched().next().is_none()
    }
}
