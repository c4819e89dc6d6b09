use crate::model::RelayError;
use axum::extract::ws::Message;
use std::net::SocketAddr;
use tokio::sync::mpsc::UnboundedSender;

/// A single websocket frame, text or binary.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Capability set of one live bidirectional connection. Sends are
/// fire-and-forget: a failure is reported to the caller once and never
/// retried.
pub trait Transport: Send + Sync {
    fn send(&self, frame: Frame) -> Result<(), RelayError>;
    fn is_open(&self) -> bool;
    fn remote_address(&self) -> Option<SocketAddr>;
}

/// Production transport: frames go through an unbounded channel drained by
/// the websocket pump task, so `send` never blocks a frame handler.
pub struct ChannelTransport {
    sender: UnboundedSender<Message>,
    remote: Option<SocketAddr>,
}

impl ChannelTransport {
    pub fn new(sender: UnboundedSender<Message>, remote: Option<SocketAddr>) -> Self {
        ChannelTransport { sender, remote }
    }
}

impl Transport for ChannelTransport {
    fn send(&self, frame: Frame) -> Result<(), RelayError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(bytes) => Message::Binary(bytes),
        };
        self.sender
            .send(message)
            .map_err(|e| RelayError::SendFailure(e.to_string()))
    }

    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    fn remote_address(&self) -> Option<SocketAddr> {
        self.remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_send_text_frame() {
        let (tx, mut rx) = unbounded_channel();
        let transport = ChannelTransport::new(tx, None);

        transport.send(Frame::Text("hello".to_string())).unwrap();
        assert_eq!(rx.recv().await, Some(Message::Text("hello".to_string())));
    }

    #[tokio::test]
    async fn test_closed_after_receiver_dropped() {
        let (tx, rx) = unbounded_channel();
        let transport = ChannelTransport::new(tx, None);
        assert!(transport.is_open());

        drop(rx);
        assert!(!transport.is_open());
        assert!(transport.send(Frame::Binary(vec![1, 2, 3])).is_err());
    }
}
