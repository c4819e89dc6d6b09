use std::net::SocketAddr;
use std::sync::Arc;

use netdrops_relay::server::{
    create_relay_route, Broadcaster, ConnectionHandler, HandshakeCoordinator, SessionRegistry,
    TransferRouter,
};
use tracing::info;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() {
    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("netdrops_relay=debug"));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true)
        .init();

    let addr = std::env::var("NETDROPS_ADDR")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

    let registry = Arc::new(SessionRegistry::new());
    let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
    let transfers = Arc::new(TransferRouter::new(registry.clone()));
    let handshake = Arc::new(HandshakeCoordinator::new(
        registry.clone(),
        transfers.clone(),
    ));
    let connection_handler = ConnectionHandler::new(registry, broadcaster, handshake, transfers);

    let app = create_relay_route(connection_handler);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    info!("relay listening on ws://{}/ws", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
