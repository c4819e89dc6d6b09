mod error;
mod message;
mod peer;

pub use error::RelayError;
pub use message::{ClientMessage, ResponseData, ServerMessage};
pub use peer::{PeerInfo, SessionId};
