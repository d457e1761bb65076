use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CORE_SITUATION_CHANCE, MAX_STATS_PER_EFFECT, NEGATIVE_DELTA_RANGE, POSITIVE_DELTA_RANGE,
    POSITIVE_EFFECT_CHANCE,
};
use crate::rng::RandomSource;
use crate::stats::{Effect, StatKind};

/// What the player sees after a click, together with what it did to them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Situation {
    pub message: String,
    #[serde(rename = "effects")]
    pub effect: Effect,
}

/// A catalog entry. Entries without a fixed effect roll a new one on every draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationTemplate {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
}

impl SituationTemplate {
    pub fn rolled(message: &str) -> Self {
        Self {
            message: message.to_string(),
            effect: None,
        }
    }

    pub fn fixed(message: &str, effect: Effect) -> Self {
        Self {
            message: message.to_string(),
            effect: Some(effect),
        }
    }

    fn instantiate<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Situation {
        Situation {
            message: self.message.clone(),
            effect: self.effect.unwrap_or_else(|| random_effect(rng)),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no situations to draw from")]
    NoSituations,
    #[error("catalog has no round events")]
    NoRoundEvents,
    #[error("core chance must be within [0, 1] (got {0})")]
    InvalidCoreChance(f32),
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    core: Vec<SituationTemplate>,
    #[serde(default)]
    templates: Vec<SituationTemplate>,
    #[serde(rename = "roundEvents", default)]
    round_events: Vec<SituationTemplate>,
    #[serde(rename = "coreChance", default = "default_core_chance")]
    core_chance: f32,
}

fn default_core_chance() -> f32 {
    CORE_SITUATION_CHANCE
}

/// Fixed pools of situations and round-transition events.
///
/// Draws are independent: a situation may repeat within a game. Each draw takes the core pool
/// with probability `core_chance` and the template pool otherwise, falling back to whichever
/// pool is non-empty.
#[derive(Clone, Debug)]
pub struct SituationCatalog {
    core: Vec<SituationTemplate>,
    templates: Vec<SituationTemplate>,
    round_events: Vec<SituationTemplate>,
    core_chance: f32,
}

impl SituationCatalog {
    pub fn new(
        core: Vec<SituationTemplate>,
        templates: Vec<SituationTemplate>,
        round_events: Vec<SituationTemplate>,
        core_chance: f32,
    ) -> Result<Self, CatalogError> {
        if core.is_empty() && templates.is_empty() {
            return Err(CatalogError::NoSituations);
        }
        if round_events.is_empty() {
            return Err(CatalogError::NoRoundEvents);
        }
        if !(0.0..=1.0).contains(&core_chance) {
            return Err(CatalogError::InvalidCoreChance(core_chance));
        }
        Ok(Self {
            core,
            templates,
            round_events,
            core_chance,
        })
    }

    pub fn standard() -> Self {
        Self {
            core: CORE_SITUATIONS
                .iter()
                .map(|message| SituationTemplate::rolled(message))
                .collect(),
            templates: SITUATION_TEMPLATES
                .iter()
                .map(|message| SituationTemplate::rolled(message))
                .collect(),
            round_events: standard_round_events(),
            core_chance: CORE_SITUATION_CHANCE,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Self::new(file.core, file.templates, file.round_events, file.core_chance)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn situation_count(&self) -> usize {
        self.core.len() + self.templates.len()
    }

    pub fn round_event_count(&self) -> usize {
        self.round_events.len()
    }

    pub fn draw_situation<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Situation {
        let use_core = rng.chance(self.core_chance);
        let pool = match (use_core, self.core.is_empty(), self.templates.is_empty()) {
            (true, false, _) | (_, false, true) => &self.core,
            _ => &self.templates,
        };
        pool[rng.pick_index(pool.len())].instantiate(rng)
    }

    pub fn draw_round_event<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Situation {
        self.round_events[rng.pick_index(self.round_events.len())].instantiate(rng)
    }
}

impl Default for SituationCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Rolls 1 to 3 distinct stats; each gains 2..=7 with 60% odds or loses 4..=10 otherwise.
pub fn random_effect<R: RandomSource + ?Sized>(rng: &mut R) -> Effect {
    let count = rng.int(1, MAX_STATS_PER_EFFECT as i32) as usize;
    let mut remaining = StatKind::ALL.to_vec();
    let mut effect = Effect::none();
    for _ in 0..count.min(remaining.len()) {
        let kind = remaining.remove(rng.pick_index(remaining.len()));
        let delta = if rng.chance(POSITIVE_EFFECT_CHANCE) {
            rng.int(POSITIVE_DELTA_RANGE.0, POSITIVE_DELTA_RANGE.1)
        } else {
            rng.int(NEGATIVE_DELTA_RANGE.0, NEGATIVE_DELTA_RANGE.1)
        };
        effect.set(kind, delta);
    }
    effect
}

fn standard_round_events() -> Vec<SituationTemplate> {
    vec![
        SituationTemplate::fixed(
            "You made it through another day.",
            Effect::single(StatKind::Hope, 3),
        ),
        SituationTemplate::fixed(
            "The weight of existence feels heavier than usual.",
            Effect::single(StatKind::Sanity, -4),
        ),
        SituationTemplate::fixed(
            "You feel more human today than yesterday.",
            Effect::single(StatKind::Sanity, 3).with(StatKind::Hope, 2),
        ),
        SituationTemplate::fixed(
            "Everything feels pointless.",
            Effect::single(StatKind::Hope, -5),
        ),
        SituationTemplate::fixed(
            "You had moments of genuine connection.",
            Effect::single(StatKind::Hope, 4).with(StatKind::Sanity, 2),
        ),
        SituationTemplate::fixed(
            "Fatigue is setting in.",
            Effect::single(StatKind::Health, -4),
        ),
        SituationTemplate::fixed(
            "Time moves strangely today.",
            Effect::single(StatKind::Sanity, -2),
        ),
        SituationTemplate::fixed(
            "You're still here. That counts for something.",
            Effect::single(StatKind::Hope, 2),
        ),
    ]
}

const CORE_SITUATIONS: [&str; 5] = [
    "You get a notification that you have a meeting in 5 minutes.",
    "Your friend texts you a meme that actually made you laugh.",
    "You spill coffee on your shirt right before work.",
    "Someone compliments your work unexpectedly.",
    "You realize you forgot to respond to an important email.",
];

const SITUATION_TEMPLATES: [&str; 55] = [
    "Your boss nitpicks something trivial you did.",
    "You find money in an old jacket pocket.",
    "You're stuck in traffic and late for something important.",
    "You make someone smile with a kind gesture.",
    "Your alarm didn't go off and you overslept.",
    "You remember something embarrassing you did years ago.",
    "A loved one tells you they're proud of you.",
    "You receive an unexpected bill in the mail.",
    "You finally finish a task you've been procrastinating on.",
    "You catch yourself in the mirror and don't recognize yourself.",
    "A stranger holds the door for you.",
    "You eat something delicious and savor every bite.",
    "Your anxiety spirals about something you can't control.",
    "You have a moment of pure clarity about what matters.",
    "Someone took credit for your work.",
    "You laughed until your sides hurt.",
    "The weight of your responsibilities feels crushing.",
    "You helped someone without being asked.",
    "You made a silly mistake that everyone witnessed.",
    "You felt genuinely safe and at peace.",
    "Your body aches from stress.",
    "You had a conversation that changed your perspective.",
    "You failed at something you really wanted to succeed at.",
    "You received unexpected kindness from a stranger.",
    "You wasted the entire evening and feel guilty.",
    "You stood up for yourself for once.",
    "You felt completely invisible.",
    "You made someone laugh until they cried.",
    "You couldn't afford something you really needed.",
    "You reconnected with an old friend.",
    "You caught a cold from your coworker.",
    "Found $20 on the ground!",
    "Your landlord raised the rent.",
    "A stranger smiled at you today.",
    "You stayed up doom-scrolling until 3am.",
    "Your best friend moved away.",
    "You got a promotion at work!",
    "Food poisoning from gas station sushi.",
    "Your therapist went on vacation.",
    "You won a small lottery prize!",
    "Your car broke down.",
    "A dog ran up and licked your face.",
    "You burnt your dinner again.",
    "Your ex texted you at 2am.",
    "You finished reading a good book.",
    "Your credit card got declined.",
    "You went for a nice walk.",
    "Your WiFi went out during important work.",
    "You got a compliment from a stranger.",
    "Stepped on a LEGO.",
    "You accidentally liked your ex's old photo.",
    "Your plant is still alive!",
    "You lost your wallet.",
    "A bird pooped on you. Lucky?",
    "You had a really good nap.",
];
