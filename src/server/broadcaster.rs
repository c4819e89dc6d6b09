use crate::model::{RelayError, ServerMessage};
use crate::server::{Frame, SessionRegistry};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Pushes the full peer list to every connected session whenever membership
/// changes.
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Broadcaster { registry }
    }

    /// Builds the current snapshot and sends a `userList` message to every
    /// registered transport. A failed delivery is logged and skipped; the
    /// remaining sessions still receive the list.
    #[instrument(skip(self))]
    pub fn notify_all(&self) -> Result<(), RelayError> {
        let users = self.registry.snapshot()?;
        let message = serde_json::to_string(&ServerMessage::UserList { users })
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        debug!(%message, "broadcasting user list");

        for session in self.registry.all_sessions()? {
            if let Err(e) = session.transport.send(Frame::Text(message.clone())) {
                error!(session_id = %session.id, %e, "failed to deliver user list");
            }
        }
        Ok(())
    }
}
