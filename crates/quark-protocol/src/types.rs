//! Core wire types for quark.
//!
//! These are the structures that travel between a client and a game server,
//! and between a game server and the master. The concrete framing and byte
//! encoding live in [`crate::codec`]; this module only defines the shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque, process-unique identifier for an actor (a connected client).
///
/// Minted by the game-server session layer when a client connects — nothing
/// upstream of that ever supplies one. `#[serde(transparent)]` makes this
/// serialize as a bare string, not `{"0": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    /// Generates a fresh, collision-resistant actor id.
    pub fn generate() -> Self {
        Self(random_token())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// Fleet-unique room identifier. `0` is reserved to mean "no room".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl RoomId {
    /// The reserved "no room" value.
    pub const NONE: RoomId = RoomId(0);
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Fleet-unique opaque string identifying a registered game server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameServerId(pub String);

impl fmt::Display for GameServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GS-{}", self.0)
    }
}

/// The routable address of a game server: a (host, port) pair.
///
/// Kept as two plain strings rather than a parsed `SocketAddr` — the
/// registration request hands these over as opaque strings and nothing in
/// this system ever needs to resolve or dial them itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameServerAddr {
    pub host: String,
    pub port: String,
}

impl fmt::Display for GameServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// Payload / message types
// ---------------------------------------------------------------------------

/// An application-opaque message body: a numeric tag plus arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub code: u32,
    pub body: Vec<u8>,
}

/// A broadcast message from one actor, as delivered to room subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorMessage {
    pub sender: ActorId,
    pub code: u32,
    pub body: Vec<u8>,
}

/// A join or leave transition, carrying the room's membership snapshot
/// immediately after the transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipEvent {
    Join { actor_list: Vec<ActorId> },
    Leave { actor_list: Vec<ActorId> },
}

/// Sum type delivered into a subscriber's inbox: either a membership
/// transition or a broadcast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Membership(MembershipEvent),
    Actor(ActorMessage),
}

// ---------------------------------------------------------------------------
// Fleet / master-plane types
// ---------------------------------------------------------------------------

/// A point-in-time view of one room's occupancy, as tracked by the master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatus {
    pub room_id: RoomId,
    pub room_name: String,
    pub actor_count: u32,
}

/// Published by the Fleet whenever a room is allocated to a game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAllocatedEvent {
    pub game_server: GameServerAddr,
    pub room: RoomStatus,
}

// ---------------------------------------------------------------------------
// Client <-> game-server wire records
// ---------------------------------------------------------------------------

/// Client → game-server commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    JoinRoom { room_id: RoomId },
    LeaveRoom,
    SendMessage { code: u32, payload: Vec<u8> },
}

/// Identifies which command a [`Event::CommandOperationError`] is reporting
/// on, without round-tripping the full original command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OriginalCommand {
    JoinRoom { room_id: RoomId },
    SendMessage { code: u32 },
    Unspecified,
}

/// Game-server → client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    JoinRoomSucceed {
        actor_id: ActorId,
    },
    LeaveRoomSucceed,
    MessageReceived {
        sender_id: ActorId,
        code: u32,
        payload: Vec<u8>,
    },
    CommandOperationError {
        error_code: String,
        error_detail: String,
        original_command: OriginalCommand,
    },
}

/// Error code for "the referenced room does not exist", used by both
/// `JoinRoom` and `SendMessage` failures.
pub const ERROR_ROOM_DOES_NOT_EXIST: &str = "001";

// ---------------------------------------------------------------------------
// Create-room unary exchange
// ---------------------------------------------------------------------------

/// Request for the unary `CreateRoom` call. An empty `room_name` asks the
/// server to mint a fresh collision-resistant name on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub room_name: String,
}

/// Response to `CreateRoom`: the room's id and whether it already existed
/// under that name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: RoomId,
    pub already_exist: bool,
}

/// The first frame a client sends on a new game-server connection,
/// distinguishing the one-shot `CreateRoom` unary exchange from a
/// persistent `Command`/`Event` session. These are logically separate
/// RPCs; this crate carries them over the same framed stream since the
/// concrete RPC mechanism is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    CreateRoom(CreateRoomRequest),
    Command(Command),
}

// ---------------------------------------------------------------------------
// Game-server <-> master wire records
// ---------------------------------------------------------------------------

/// Master → game-server registration stream records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegisterEvent {
    Registered { game_server_id: GameServerId },
    Allocation { room_id: RoomId, room_name: String },
}

/// The transport-level header key carrying a game server's identity on
/// master-inbound Update streams.
pub const GAME_SERVER_ID_METADATA_KEY: &str = "quark-gameserver-id";

/// First and only inbound frame on a Register stream: a game server
/// announcing the address clients should be told to dial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub host: String,
    pub port: String,
}

/// A single inbound Update record on a game server's Update stream: zero
/// or more `(room, actor_count)` tuples. Reuses `RoomStatus`'s shape
/// directly since the tuple IS a `RoomStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub updates: Vec<RoomStatus>,
}

/// Generates a 128-bit random token rendered as lowercase hex. Used for
/// actor ids and for server-generated room names.
pub(crate) fn random_token() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
