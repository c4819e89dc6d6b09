use crate::model::SessionId;
use crate::server::Transport;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Server-side record of one connected peer. The busy flag marks a session
/// that is party to a forwarded-but-unanswered request or an accepted,
/// not-yet-drained transfer; it is only mutated by the handshake coordinator
/// and the transfer router.
pub struct Session {
    pub id: SessionId,
    pub nickname: String,
    pub transport: Arc<dyn Transport>,
    busy: AtomicBool,
}

impl Session {
    pub fn new(id: SessionId, nickname: String, transport: Arc<dyn Transport>) -> Self {
        Session {
            id,
            nickname,
            transport,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .field("busy", &self.is_busy())
            .finish()
    }
}
