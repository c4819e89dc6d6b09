use crate::model::{ClientMessage, RelayError, ServerMessage, SessionId};
use crate::server::{
    Broadcaster, Frame, HandshakeCoordinator, Session, SessionRegistry, TransferRouter, Transport,
};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Per-connection front door to the relay: registers the session, dispatches
/// inbound frames to the handshake coordinator and transfer router, and
/// tears everything down on close. One handler exists per websocket; the
/// shared components behind it are the same for all connections.
#[derive(Clone)]
pub struct ConnectionHandler {
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<Broadcaster>,
    handshake: Arc<HandshakeCoordinator>,
    transfers: Arc<TransferRouter>,
    session: Arc<RwLock<Option<Arc<Session>>>>,
}

impl ConnectionHandler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        broadcaster: Arc<Broadcaster>,
        handshake: Arc<HandshakeCoordinator>,
        transfers: Arc<TransferRouter>,
    ) -> Self {
        ConnectionHandler {
            registry,
            broadcaster,
            handshake,
            transfers,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Fresh handler for a new connection, sharing the other components.
    pub fn new_from(cloneable: &Self) -> Self {
        ConnectionHandler {
            registry: cloneable.registry.clone(),
            broadcaster: cloneable.broadcaster.clone(),
            handshake: cloneable.handshake.clone(),
            transfers: cloneable.transfers.clone(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn session_id(&self) -> Result<Option<SessionId>, RelayError> {
        Ok(self
            .session
            .read()
            .map_err(|e| RelayError::Internal(e.to_string()))?
            .as_ref()
            .map(|s| s.id))
    }

    fn current_session(&self) -> Result<Arc<Session>, RelayError> {
        self.session
            .read()
            .map_err(|e| RelayError::Internal(e.to_string()))?
            .clone()
            .ok_or_else(|| RelayError::Internal("connection not registered".to_string()))
    }

    /// Registers the connection, sends its `init` identity message and
    /// broadcasts the updated peer list to everyone.
    #[instrument(skip(self, transport))]
    pub fn handle_connect(
        &self,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<Session>, RelayError> {
        let session = self.registry.connect(transport)?;
        self.session
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?
            .replace(session.clone());

        let init = serde_json::to_string(&ServerMessage::Init {
            session_id: session.id,
            nickname: session.nickname.clone(),
        })
        .map_err(|e| RelayError::Internal(e.to_string()))?;
        if let Err(e) = session.transport.send(Frame::Text(init)) {
            error!(session_id = %session.id, %e, "failed to send init message");
        }

        self.broadcaster.notify_all()?;
        Ok(session)
    }

    /// Parses one text frame and routes it by its `type` tag. The raw text
    /// travels along so `request` and `response` reach the other peer
    /// byte-for-byte.
    #[instrument(skip(self, raw))]
    pub fn handle_text(&self, raw: &str) -> Result<(), RelayError> {
        let sender_id = self.current_session()?.id;
        debug!(sender_id = %sender_id, %raw, "received text message");

        match serde_json::from_str::<ClientMessage>(raw) {
            Ok(ClientMessage::Request { target }) => {
                self.handshake.on_request(sender_id, target, raw)
            }
            Ok(ClientMessage::Response { target, data }) => {
                self.handshake
                    .on_response(sender_id, target, data.accepted, raw)
            }
            Ok(ClientMessage::Meta { file_id, target }) => {
                self.transfers.register_meta(sender_id, file_id, target)
            }
            Err(e) => {
                warn!(sender_id = %sender_id, %e, "unparsable text message");
                Err(RelayError::Validation(e.to_string()))
            }
        }
    }

    /// Hands one binary frame to the transfer router.
    #[instrument(skip(self, frame))]
    pub fn handle_binary(&self, frame: &[u8]) -> Result<(), RelayError> {
        let sender_id = self.current_session()?.id;
        self.transfers.route_binary(sender_id, frame)
    }

    /// Removes the session and its transfer map, then broadcasts the new
    /// peer list. Safe to call more than once.
    #[instrument(skip(self))]
    pub fn handle_close(&self) -> Result<(), RelayError> {
        let session = self
            .session
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?
            .take();
        let Some(session) = session else {
            return Ok(());
        };

        info!(session_id = %session.id, "connection closed");
        self.registry.disconnect(session.id)?;
        self.transfers.drop_sender(session.id)?;
        self.broadcaster.notify_all()?;
        Ok(())
    }

    /// Sends a textual notice back to this connection's own peer. Delivery
    /// failures are logged and swallowed.
    pub fn send_notice(&self, text: &str) {
        let Ok(session) = self.current_session() else {
            return;
        };
        if let Err(e) = session.transport.send(Frame::Text(text.to_string())) {
            error!(session_id = %session.id, %e, "failed to send notice");
        }
    }
}
