//! Unified error type for the quark meta-crate.

use quark_protocol::ProtocolError;
use quark_room::RoomError;
use quark_session::{GameServerSessionError, MasterSessionError};
use quark_transport::TransportError;

/// Top-level error that wraps every sub-crate's error type.
///
/// When running a [`crate::GameServer`] or [`crate::Master`] directly you
/// deal with this single error type instead of importing errors from each
/// sub-crate. The `#[from]` attribute on each variant auto-generates a
/// `From` impl, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuarkError {
    /// A transport-level error (connection, send, recv, accept).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (stopped, already joined).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game-server session error (transport/protocol while driving a
    /// client stream).
    #[error(transparent)]
    GameServerSession(#[from] GameServerSessionError),

    /// A master session error (registration, update, fleet).
    #[error(transparent)]
    MasterSession(#[from] MasterSessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let quark_err: QuarkError = err.into();
        assert!(matches!(quark_err, QuarkError::Transport(_)));
        assert!(quark_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let quark_err: QuarkError = err.into();
        assert!(matches!(quark_err, QuarkError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::Stopped(quark_protocol::RoomId(1));
        let quark_err: QuarkError = err.into();
        assert!(matches!(quark_err, QuarkError::Room(_)));
    }

    #[test]
    fn test_from_master_session_error() {
        let err = MasterSessionError::InvalidArgument;
        let quark_err: QuarkError = err.into();
        assert!(matches!(quark_err, QuarkError::MasterSession(_)));
    }
}
