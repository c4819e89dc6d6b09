use thiserror::Error;

/// Error taxonomy for the relay. Display strings double as the textual
/// notices sent back to the offending peer; none of these is fatal to the
/// process or closes the connection.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("could not process message: {0}")]
    Validation(String),

    #[error("the other peer does not exist or has gone away")]
    TargetUnavailable,

    #[error("a transfer is already in progress, please wait")]
    BusyConflict,

    #[error("too many concurrent file transfers (limit {0})")]
    CapacityExceeded(usize),

    #[error("no transfer session is set up for this connection")]
    NoTransferSession,

    #[error("no file transfer mapping for id {0}")]
    MissingMapping(String),

    #[error("failed to deliver frame: {0}")]
    SendFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}
