//! Error types for the room layer.

use quark_protocol::{ActorId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room has been stopped; no further joins or broadcasts are
    /// accepted.
    #[error("room {0} is stopped")]
    Stopped(RoomId),

    /// The actor already holds an entry in this room. A given actor may
    /// hold at most one entry per room.
    #[error("actor {0} already has an entry in room {1}")]
    AlreadyJoined(ActorId, RoomId),
}
