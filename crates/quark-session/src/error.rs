//! Error types for the session layer.

use quark_master::FleetError;
use quark_protocol::ProtocolError;
use quark_transport::TransportError;

/// Errors that can terminate a game-server session's connection loop.
///
/// Command-level failures (e.g. joining a room that doesn't exist) never
/// appear here — they're surfaced to the client as `CommandOperationError`
/// events and the stream continues.
#[derive(Debug, thiserror::Error)]
pub enum GameServerSessionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors that can terminate a master session's register or update stream.
#[derive(Debug, thiserror::Error)]
pub enum MasterSessionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Registration with an empty address or port.
    #[error("invalid registration: address and port must be non-empty")]
    InvalidArgument,

    /// An Update stream carried no identity, or one the Fleet doesn't
    /// recognize.
    #[error("permission denied: missing or unregistered game server identity")]
    PermissionDenied,

    /// `Fleet::update_room_status` failed for a tuple in an Update record.
    #[error(transparent)]
    Fleet(#[from] FleetError),
}

impl From<TransportError> for GameServerSessionError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<TransportError> for MasterSessionError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}
