use crate::model::{PeerInfo, RelayError, SessionId};
use crate::server::{nickname, Session, Transport};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Source of truth for who is online: session id -> live session.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new connection under a fresh id and generated nickname.
    #[instrument(skip(self, transport))]
    pub fn connect(&self, transport: Arc<dyn Transport>) -> Result<Arc<Session>, RelayError> {
        let id = Uuid::new_v4();
        let nickname = nickname::generate();
        let session = Arc::new(Session::new(id, nickname.clone(), transport));

        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        sessions.insert(id, session.clone());

        info!(
            session_id = %id,
            nickname = %nickname,
            remote = ?session.transport.remote_address(),
            "new connection established"
        );
        Ok(session)
    }

    /// Removes a session. Disconnecting an unknown id is a no-op.
    #[instrument(skip(self))]
    pub fn disconnect(&self, id: SessionId) -> Result<(), RelayError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        if sessions.remove(&id).is_some() {
            debug!(session_id = %id, "session removed");
        }
        Ok(())
    }

    pub fn lookup(&self, id: SessionId) -> Result<Option<Arc<Session>>, RelayError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        Ok(sessions.get(&id).cloned())
    }

    /// Point-in-time copy of the peer list; ordering is not significant.
    pub fn snapshot(&self) -> Result<Vec<PeerInfo>, RelayError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        Ok(sessions
            .values()
            .map(|session| PeerInfo {
                session_id: session.id,
                nickname: session.nickname.clone(),
            })
            .collect())
    }

    /// All live sessions, for broadcast delivery.
    pub fn all_sessions(&self) -> Result<Vec<Arc<Session>>, RelayError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        Ok(sessions.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, RelayError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool, RelayError> {
        Ok(self.len()? == 0)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
