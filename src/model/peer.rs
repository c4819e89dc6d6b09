use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;

/// One entry of the broadcast peer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    pub nickname: String,
}
