use crate::server::{websocket_listener, ConnectionHandler};
use axum::extract::{ConnectInfo, WebSocketUpgrade};
use axum::{routing::get, Router};
use std::net::SocketAddr;

pub fn create_relay_route(connection_handler: ConnectionHandler) -> Router {
    Router::new().route(
        "/ws",
        get(
            move |ws: WebSocketUpgrade, ConnectInfo(remote): ConnectInfo<SocketAddr>| {
                websocket_listener::handle_websocket(
                    ws,
                    ConnectionHandler::new_from(&connection_handler),
                    remote,
                )
            },
        ),
    )
}
