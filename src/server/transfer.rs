use crate::model::{RelayError, SessionId};
use crate::server::{Frame, SessionRegistry};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, instrument};

/// Upper bound on outstanding file registrations per sender.
pub const MAX_CONCURRENT_FILES: usize = 30;

/// Fixed width of the file id prefix on every binary frame: a UUID in
/// hyphenated textual form.
pub const FILE_ID_LEN: usize = 36;

/// Demultiplexes inbound binary chunks to their recipients. Each sender owns
/// a bounded map of outstanding file ids; an entry lives from its `meta`
/// registration until the matching binary frame is consumed, exactly once.
pub struct TransferRouter {
    registry: Arc<SessionRegistry>,
    transfers: RwLock<HashMap<SessionId, HashMap<String, SessionId>>>,
}

impl TransferRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        TransferRouter {
            registry,
            transfers: RwLock::new(HashMap::new()),
        }
    }

    /// Sets up an empty transfer map for the accepted handshake's future
    /// file sender. Keeps an existing map untouched.
    #[instrument(skip(self))]
    pub fn prepare(&self, owner_id: SessionId) -> Result<(), RelayError> {
        let mut transfers = self
            .transfers
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        transfers.entry(owner_id).or_default();
        debug!(owner_id = %owner_id, "prepared transfer map");
        Ok(())
    }

    /// Records `file_id -> target_id` under the sender, rejecting once the
    /// sender already has `MAX_CONCURRENT_FILES` outstanding entries.
    #[instrument(skip(self))]
    pub fn register_meta(
        &self,
        sender_id: SessionId,
        file_id: String,
        target_id: SessionId,
    ) -> Result<(), RelayError> {
        let mut transfers = self
            .transfers
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        let files = transfers.entry(sender_id).or_default();

        if files.len() >= MAX_CONCURRENT_FILES {
            info!(sender_id = %sender_id, "exceeded maximum concurrent file transfers");
            return Err(RelayError::CapacityExceeded(MAX_CONCURRENT_FILES));
        }

        files.insert(file_id, target_id);
        Ok(())
    }

    /// Routes one binary chunk: resolves the target from the 36-byte file id
    /// prefix and forwards the remaining payload verbatim. Whether delivery
    /// succeeds or the target turns out unavailable, the mapping entry is
    /// consumed; once the sender's map drains empty, the busy flags of the
    /// sender and of the just-used target are released. The whole
    /// remove/check-empty/release sequence runs under one write lock so a
    /// concurrently registered file id cannot get lost in between.
    #[instrument(skip(self, frame))]
    pub fn route_binary(&self, sender_id: SessionId, frame: &[u8]) -> Result<(), RelayError> {
        if frame.len() < FILE_ID_LEN {
            return Err(RelayError::Validation(
                "binary frame too short to carry a file id".to_string(),
            ));
        }
        let file_id = std::str::from_utf8(&frame[..FILE_ID_LEN])
            .map_err(|_| RelayError::Validation("file id prefix is not valid UTF-8".to_string()))?
            .to_string();
        let payload = frame[FILE_ID_LEN..].to_vec();

        let mut transfers = self
            .transfers
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        let files = transfers
            .get_mut(&sender_id)
            .ok_or(RelayError::NoTransferSession)?;
        let target_id = files
            .get(&file_id)
            .copied()
            .ok_or_else(|| RelayError::MissingMapping(file_id.clone()))?;

        let delivery = match self.registry.lookup(target_id)? {
            Some(target) if target.transport.is_open() => {
                debug!(
                    sender_id = %sender_id,
                    target_id = %target_id,
                    file_id = %file_id,
                    bytes = payload.len(),
                    "forwarding binary chunk"
                );
                if let Err(e) = target.transport.send(Frame::Binary(payload)) {
                    // Send failures are local to the target; the sender's
                    // frame was still handled.
                    error!(target_id = %target_id, %e, "failed to forward binary chunk");
                }
                Ok(())
            }
            _ => Err(RelayError::TargetUnavailable),
        };

        files.remove(&file_id);
        debug!(sender_id = %sender_id, file_id = %file_id, "removed file transfer mapping");

        if files.is_empty() {
            if let Some(sender) = self.registry.lookup(sender_id)? {
                sender.set_busy(false);
                info!(session_id = %sender_id, "cleared busy status for sender");
            }
            if let Some(target) = self.registry.lookup(target_id)? {
                target.set_busy(false);
                info!(session_id = %target_id, "cleared busy status for receiver");
            }
        }

        delivery
    }

    /// Discards the sender's map on disconnect. Unknown senders are a no-op.
    #[instrument(skip(self))]
    pub fn drop_sender(&self, sender_id: SessionId) -> Result<(), RelayError> {
        let mut transfers = self
            .transfers
            .write()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        if transfers.remove(&sender_id).is_some() {
            debug!(sender_id = %sender_id, "dropped transfer map");
        }
        Ok(())
    }

    /// Outstanding entry count for a sender, if it has a transfer map.
    pub fn outstanding(&self, sender_id: SessionId) -> Result<Option<usize>, RelayError> {
        let transfers = self
            .transfers
            .read()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        Ok(transfers.get(&sender_id).map(|files| files.len()))
    }
}
