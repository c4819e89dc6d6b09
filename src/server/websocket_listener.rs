use crate::server::{ChannelTransport, ConnectionHandler};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::WebSocketUpgrade;
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{error, info, warn};

pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    connection_handler: ConnectionHandler,
    remote: SocketAddr,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| listen(socket, connection_handler, remote))
}

async fn listen(socket: WebSocket, connection_handler: ConnectionHandler, remote: SocketAddr) {
    let (ws_sender, ws_receiver) = socket.split();
    // Unbounded so `Transport::send` never blocks a frame handler; the queue
    // lives only as long as this connection and is dropped with it.
    let (tx, rx) = unbounded_channel();

    let transport = Arc::new(ChannelTransport::new(tx, Some(remote)));
    if let Err(e) = connection_handler.handle_connect(transport) {
        error!(%remote, %e, "failed to register connection");
        return;
    }

    let sender_task = handle_outgoing_messages(rx, ws_sender);
    let receiver_task = handle_incoming_messages(ws_receiver, &connection_handler);

    let session_id = connection_handler.session_id().ok().flatten();
    tokio::select! {
        _ = sender_task => {
            info!("sender task completed for session {:?}", session_id);
        }
        _ = receiver_task => {
            info!("receiver task completed for session {:?}", session_id);
        }
    }
    if let Err(e) = connection_handler.handle_close() {
        error!(%e, "failed to clean up connection");
    }
}

pub async fn handle_outgoing_messages(
    mut rx: UnboundedReceiver<Message>,
    mut ws_sender: SplitSink<WebSocket, Message>,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = ws_sender.send(msg).await {
            error!("failed to send message: {:?}", e);
            break;
        }
    }
}

pub async fn handle_incoming_messages(
    mut receiver: SplitStream<WebSocket>,
    connection_handler: &ConnectionHandler,
) {
    while let Some(message) = receiver.next().await {
        match message {
            Ok(message) => {
                handle_message(message, connection_handler).await;
            }
            Err(e) => {
                error!("failed to receive message: {:?}", e);
                break;
            }
        }
    }
}

/// One inbound frame. A handler error becomes a textual notice back to the
/// sender; the connection stays open either way.
pub async fn handle_message(message: Message, connection_handler: &ConnectionHandler) {
    match message {
        Message::Text(text) => {
            if let Err(e) = connection_handler.handle_text(&text) {
                connection_handler.send_notice(&e.to_string());
            }
        }
        Message::Binary(bytes) => {
            if let Err(e) = connection_handler.handle_binary(&bytes) {
                connection_handler.send_notice(&e.to_string());
            }
        }
        Message::Close(_) => {
            info!(
                "client disconnected {:?}",
                connection_handler.session_id().ok().flatten()
            );
            if let Err(e) = connection_handler.handle_close() {
                error!("failed to handle disconnect: {:?}", e);
            }
        }
        _ => {
            warn!(
                "unsupported message type from {:?}",
                connection_handler.session_id().ok().flatten()
            );
        }
    }
}
