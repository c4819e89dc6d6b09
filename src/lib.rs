pub mod model;
pub mod server;

pub mod prelude {
    pub use crate::model::ClientMessage;
    pub use crate::model::PeerInfo;
    pub use crate::model::RelayError;
    pub use crate::model::ResponseData;
    pub use crate::model::ServerMessage;
    pub use crate::server::Broadcaster;
    pub use crate::server::ConnectionHandler;
    pub use crate::server::Frame;
    pub use crate::server::HandshakeCoordinator;
    pub use crate::server::Session;
    pub use crate::server::SessionId;
    pub use crate::server::SessionRegistry;
    pub use crate::server::TransferRouter;
    pub use crate::server::Transport;
}
