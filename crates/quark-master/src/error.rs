//! Error types for the fleet/allocation layer.

use quark_protocol::RoomId;

/// Errors that can occur during fleet registration and allocation.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// No registered game server currently has free capacity.
    #[error("not enough game servers")]
    NotEnoughGameServers,

    /// The room is already bound to a game server.
    #[error("room {0} is already allocated")]
    RoomAlreadyAllocated(RoomId),

    /// `update_room_status` was called for a room the Fleet has never
    /// allocated.
    #[error("room status not found for room {0}")]
    RoomStatusNotFound(RoomId),
}
