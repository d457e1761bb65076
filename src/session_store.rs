use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::constants::ANONYMOUS_PLAYER;
use crate::engine::RoundEngine;
use crate::rng::Rng;
use crate::session::GameSession;

pub type SharedSession = Arc<Mutex<GameSession<Rng>>>;

/// A player's seat on one post.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub post_id: String,
    pub player: String,
}

impl SessionKey {
    pub fn new(post_id: &str, player: &str) -> Self {
        let player = player.trim();
        Self {
            post_id: post_id.trim().to_string(),
            player: if player.is_empty() {
                ANONYMOUS_PLAYER.to_string()
            } else {
                player.to_string()
            },
        }
    }
}

struct SessionSlot {
    session: SharedSession,
    touched_at_ms: u64,
}

/// Live sessions keyed by post and player.
///
/// Each session sits behind its own mutex, so work on one key is serialized while different
/// keys proceed independently. The map lock is only held for lookups.
pub struct SessionStore {
    engine: Arc<RoundEngine>,
    max_sessions: usize,
    slots: Mutex<HashMap<SessionKey, SessionSlot>>,
}

impl SessionStore {
    pub fn new(engine: Arc<RoundEngine>, max_sessions: usize) -> Self {
        Self {
            engine,
            max_sessions: max_sessions.max(1),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<RoundEngine> {
        &self.engine
    }

    /// Returns the session for `key`, starting a new game when none exists.
    /// The flag is true when the session was created by this call.
    pub async fn get_or_create(&self, key: &SessionKey, now_ms: u64) -> (SharedSession, bool) {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get_mut(key) {
            slot.touched_at_ms = now_ms;
            return (slot.session.clone(), false);
        }

        while slots.len() >= self.max_sessions {
            let Some(oldest) = slots
                .iter()
                .min_by_key(|(_, slot)| slot.touched_at_ms)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            log::info!(
                "[session-store] evicting idle session {}/{}",
                oldest.post_id,
                oldest.player
            );
            slots.remove(&oldest);
        }

        let session = Arc::new(Mutex::new(GameSession::start(
            self.engine.clone(),
            Rng::from_entropy(),
        )));
        slots.insert(
            key.clone(),
            SessionSlot {
                session: session.clone(),
                touched_at_ms: now_ms,
            },
        );
        (session, true)
    }

    pub async fn get(&self, key: &SessionKey, now_ms: u64) -> Option<SharedSession> {
        let mut slots = self.slots.lock().await;
        let slot = slots.get_mut(key)?;
        slot.touched_at_ms = now_ms;
        Some(slot.session.clone())
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
