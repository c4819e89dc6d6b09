use crate::model::{RelayError, SessionId};
use crate::server::{Frame, Session, SessionRegistry, TransferRouter};
use std::sync::{Arc, Mutex};
use tracing::{error, info, instrument};

/// Drives the request/response handshake between two peers and owns the
/// mutual busy-locking that keeps a pair exclusive until the transfer
/// drains or is rejected.
pub struct HandshakeCoordinator {
    registry: Arc<SessionRegistry>,
    transfers: Arc<TransferRouter>,
    // Serializes the check-both-then-lock-both step of `on_request` so two
    // racing requests cannot both observe the pair as idle.
    lock: Mutex<()>,
}

impl HandshakeCoordinator {
    pub fn new(registry: Arc<SessionRegistry>, transfers: Arc<TransferRouter>) -> Self {
        HandshakeCoordinator {
            registry,
            transfers,
            lock: Mutex::new(()),
        }
    }

    fn open_session(&self, id: SessionId) -> Result<Arc<Session>, RelayError> {
        self.registry
            .lookup(id)?
            .filter(|session| session.transport.is_open())
            .ok_or(RelayError::TargetUnavailable)
    }

    /// Handles a `request` from `sender_id` aimed at `target_id`. Both peers
    /// must be registered, open and idle; on success both are marked busy
    /// and the raw message is forwarded to the target untouched.
    #[instrument(skip(self, raw))]
    pub fn on_request(
        &self,
        sender_id: SessionId,
        target_id: SessionId,
        raw: &str,
    ) -> Result<(), RelayError> {
        let sender = self.open_session(sender_id)?;
        let target = self.open_session(target_id)?;

        {
            let _guard = self
                .lock
                .lock()
                .map_err(|e| RelayError::Internal(e.to_string()))?;
            if sender.is_busy() || target.is_busy() {
                info!(sender_id = %sender_id, target_id = %target_id, "either peer is busy");
                return Err(RelayError::BusyConflict);
            }
            sender.set_busy(true);
            target.set_busy(true);
        }

        if let Err(e) = target.transport.send(Frame::Text(raw.to_string())) {
            error!(target_id = %target_id, %e, "failed to forward request");
        }
        info!(
            sender_id = %sender_id,
            target_id = %target_id,
            "forwarded request, both peers set to busy"
        );
        Ok(())
    }

    /// Handles a `response` from `responder_id`; `requester_id` is the peer
    /// that sent the original request (the `target` field of the response).
    /// The raw message is forwarded to the requester untouched. Acceptance
    /// prepares an empty transfer map keyed by the requester, who becomes
    /// the file sender; rejection releases both busy flags immediately.
    #[instrument(skip(self, raw))]
    pub fn on_response(
        &self,
        responder_id: SessionId,
        requester_id: SessionId,
        accepted: bool,
        raw: &str,
    ) -> Result<(), RelayError> {
        let requester = self.open_session(requester_id)?;
        let responder = self.open_session(responder_id)?;

        if let Err(e) = requester.transport.send(Frame::Text(raw.to_string())) {
            error!(requester_id = %requester_id, %e, "failed to forward response");
        }
        info!(
            responder_id = %responder_id,
            requester_id = %requester_id,
            accepted,
            "forwarded response"
        );

        if accepted {
            self.transfers.prepare(requester_id)?;
        } else {
            requester.set_busy(false);
            responder.set_busy(false);
            info!(
                requester_id = %requester_id,
                responder_id = %responder_id,
                "cleared busy status after rejection"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{ChannelTransport, Transport};
    use axum::extract::ws::Message;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
    use uuid::Uuid;

    fn coordinator() -> (
        Arc<SessionRegistry>,
        Arc<TransferRouter>,
        HandshakeCoordinator,
    ) {
        let registry = Arc::new(SessionRegistry::new());
        let transfers = Arc::new(TransferRouter::new(registry.clone()));
        let coordinator = HandshakeCoordinator::new(registry.clone(), transfers.clone());
        (registry, transfers, coordinator)
    }

    fn connect(registry: &SessionRegistry) -> (Arc<Session>, UnboundedReceiver<Message>) {
        let (tx, rx) = unbounded_channel();
        let transport: Arc<dyn Transport> = Arc::new(ChannelTransport::new(tx, None));
        (registry.connect(transport).unwrap(), rx)
    }

    #[tokio::test]
    async fn test_request_locks_both_and_forwards_verbatim() {
        let (registry, _transfers, coordinator) = coordinator();
        let (a, _rx_a) = connect(&registry);
        let (b, mut rx_b) = connect(&registry);

        let raw = format!(r#"{{"type":"request","target":"{}","extra":42}}"#, b.id);
        coordinator.on_request(a.id, b.id, &raw).unwrap();

        assert!(a.is_busy());
        assert!(b.is_busy());
        assert_eq!(rx_b.recv().await, Some(Message::Text(raw)));
    }

    #[tokio::test]
    async fn test_request_against_busy_peer_changes_nothing() {
        let (registry, _transfers, coordinator) = coordinator();
        let (a, _rx_a) = connect(&registry);
        let (b, _rx_b) = connect(&registry);
        b.set_busy(true);

        assert!(matches!(
            coordinator.on_request(a.id, b.id, "{}"),
            Err(RelayError::BusyConflict)
        ));
        assert!(!a.is_busy());
    }

    #[tokio::test]
    async fn test_request_to_unknown_target() {
        let (registry, _transfers, coordinator) = coordinator();
        let (a, _rx_a) = connect(&registry);

        assert!(matches!(
            coordinator.on_request(a.id, Uuid::new_v4(), "{}"),
            Err(RelayError::TargetUnavailable)
        ));
        assert!(!a.is_busy());
    }

    #[tokio::test]
    async fn test_request_to_closed_target() {
        let (registry, _transfers, coordinator) = coordinator();
        let (a, _rx_a) = connect(&registry);
        let (b, rx_b) = connect(&registry);
        drop(rx_b);

        assert!(matches!(
            coordinator.on_request(a.id, b.id, "{}"),
            Err(RelayError::TargetUnavailable)
        ));
        assert!(!a.is_busy());
        assert!(!b.is_busy());
    }

    #[tokio::test]
    async fn test_acceptance_prepares_map_for_requester() {
        let (registry, transfers, coordinator) = coordinator();
        let (a, mut rx_a) = connect(&registry);
        let (b, _rx_b) = connect(&registry);
        coordinator
            .on_request(a.id, b.id, r#"{"type":"request"}"#)
            .unwrap();
        let _ = rx_a.try_recv();

        let raw = format!(
            r#"{{"type":"response","target":"{}","data":{{"accepted":true}}}}"#,
            a.id
        );
        coordinator.on_response(b.id, a.id, true, &raw).unwrap();

        assert_eq!(rx_a.recv().await, Some(Message::Text(raw)));
        assert!(a.is_busy());
        assert!(b.is_busy());
        assert_eq!(transfers.outstanding(a.id).unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_rejection_releases_both_peers() {
        let (registry, transfers, coordinator) = coordinator();
        let (a, _rx_a) = connect(&registry);
        let (b, _rx_b) = connect(&registry);
        coordinator
            .on_request(a.id, b.id, r#"{"type":"request"}"#)
            .unwrap();

        coordinator
            .on_response(b.id, a.id, false, r#"{"type":"response"}"#)
            .unwrap();

        assert!(!a.is_busy());
        assert!(!b.is_busy());
        assert_eq!(transfers.outstanding(a.id).unwrap(), None);
    }

    #[tokio::test]
    async fn test_response_to_vanished_requester() {
        let (registry, _transfers, coordinator) = coordinator();
        let (a, _rx_a) = connect(&registry);
        let (b, _rx_b) = connect(&registry);
        coordinator
            .on_request(a.id, b.id, r#"{"type":"request"}"#)
            .unwrap();
        registry.disconnect(a.id).unwrap();

        assert!(matches!(
            coordinator.on_response(b.id, a.id, true, "{}"),
            Err(RelayError::TargetUnavailable)
        ));
    }
}
