use crate::model::{PeerInfo, SessionId};
use serde::{Deserialize, Serialize};

/// Messages a client sends over the text channel. `request` and `response`
/// are relayed to the other peer byte-for-byte; the server only parses the
/// fields it needs for routing, extra fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "request")]
    Request { target: SessionId },

    #[serde(rename = "response")]
    Response {
        target: SessionId,
        data: ResponseData,
    },

    #[serde(rename = "meta")]
    Meta {
        #[serde(rename = "fileId")]
        file_id: String,
        target: SessionId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub accepted: bool,
}

/// Messages the server originates itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        nickname: String,
    },

    #[serde(rename = "userList")]
    UserList { users: Vec<PeerInfo> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_request() {
        let raw = r#"{"type":"request","target":"a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8"}"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            message,
            ClientMessage::Request {
                target: SessionId::parse_str("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8").unwrap(),
            }
        );
    }

    #[test]
    fn test_deserialize_response_ignores_extra_fields() {
        let raw = r#"{"type":"response","target":"a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8","data":{"accepted":true,"fileName":"photo.png"}}"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            message,
            ClientMessage::Response {
                target: SessionId::parse_str("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8").unwrap(),
                data: ResponseData { accepted: true },
            }
        );
    }

    #[test]
    fn test_deserialize_meta() {
        let raw = r#"{"type":"meta","fileId":"11111111-1111-1111-1111-111111111111","target":"a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8"}"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();
        match message {
            ClientMessage::Meta { file_id, .. } => {
                assert_eq!(file_id, "11111111-1111-1111-1111-111111111111");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_fails_to_parse() {
        let raw = r#"{"type":"teleport","target":"nowhere"}"#;
        assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn test_serialize_init() {
        let message = ServerMessage::Init {
            session_id: SessionId::parse_str("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8").unwrap(),
            nickname: "quiet raccoon".to_string(),
        };
        let serialized = serde_json::to_string(&message).unwrap();
        assert_eq!(
            serialized,
            r#"{"type":"init","sessionId":"a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8","nickname":"quiet raccoon"}"#
        );
    }

    #[test]
    fn test_serialize_user_list() {
        let message = ServerMessage::UserList {
            users: vec![PeerInfo {
                session_id: SessionId::parse_str("a1a2a3a4b1b2c1c2d1d2d3d4d5d6d7d8").unwrap(),
                nickname: "brave rabbit".to_string(),
            }],
        };
        let serialized = serde_json::to_string(&message).unwrap();
        assert_eq!(
            serialized,
            r#"{"type":"userList","users":[{"sessionId":"a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8","nickname":"brave rabbit"}]}"#
        );
    }
}
