//! Session Registry
//!
//! Owns every running game session. Each session sits behind its own lock so
//! a step and a snapshot never interleave.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::game::body::PlayerId;
use crate::game::config::{ConfigError, GameConfig};
use crate::game::paddle::PaddleIntent;
use crate::game::session::GameSession;

/// Session identifier.
pub type SessionId = u64;

/// A session shared between the registry, its driving loop and handlers.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No session with this id.
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    /// Session options rejected.
    #[error("Invalid session options: {0}")]
    Config(#[from] ConfigError),
}

/// All live sessions.
pub struct SessionRegistry {
    next_id: AtomicU64,
    sessions: RwLock<BTreeMap<SessionId, SharedSession>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create an empty registry. Ids start at 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Validate options and register a new session.
    pub async fn create(
        &self,
        players: &[PlayerId],
        config: GameConfig,
    ) -> Result<(SessionId, SharedSession), RegistryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Mutex::new(GameSession::create(id, players, config)?));

        self.sessions.write().await.insert(id, session.clone());
        info!("Registered session {} for players {:?}", id, players);

        Ok((id, session))
    }

    /// Look up a session.
    pub async fn get(&self, id: SessionId) -> Result<SharedSession, RegistryError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownSession(id))
    }

    /// Whether a session is still registered.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Unregister a session. Its driving loop stops on the next tick.
    pub async fn remove(&self, id: SessionId) -> Result<SharedSession, RegistryError> {
        let removed = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(RegistryError::UnknownSession(id))?;
        info!("Removed session {}", id);
        Ok(removed)
    }

    /// Forward a paddle intent. `Ok(false)` if the player has no paddle there.
    pub async fn queue_intent(
        &self,
        id: SessionId,
        player: PlayerId,
        intent: PaddleIntent,
    ) -> Result<bool, RegistryError> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        Ok(session.queue_intent(player, intent))
    }

    /// Sessions that seat `player`, in id order.
    pub async fn sessions_with_player(&self, player: PlayerId) -> Vec<(SessionId, SharedSession)> {
        let snapshot: Vec<(SessionId, SharedSession)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| (*id, s.clone()))
            .collect();

        let mut found = Vec::new();
        for (id, session) in snapshot {
            if session.lock().await.get_players().contains(&player) {
                found.push((id, session));
            }
        }
        found
    }

    /// Registered ids in ascending order.
    pub async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
