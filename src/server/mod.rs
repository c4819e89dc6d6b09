mod broadcaster;
mod connection_handler;
mod handshake;
pub mod nickname;
mod registry;
pub mod route;
mod session;
mod transfer;
mod transport;
pub mod websocket_listener;

pub use crate::model::SessionId;
pub use broadcaster::Broadcaster;
pub use connection_handler::ConnectionHandler;
pub use handshake::HandshakeCoordinator;
pub use registry::SessionRegistry;
pub use route::create_relay_route;
pub use session::Session;
pub use transfer::{TransferRouter, FILE_ID_LEN, MAX_CONCURRENT_FILES};
pub use transport::{ChannelTransport, Frame, Transport};
