//! Wire protocol for quark.
//!
//! This crate defines the "language" that clients, game servers, and the
//! master speak:
//!
//! - **Types** ([`Command`], [`Event`], [`RegisterEvent`], identity
//!   newtypes, etc.) — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (actor/game-server identity). It doesn't know about connections or
//! rooms — it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Command/Event) → Session (actor context)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

// `mod` declares a submodule. Rust looks for the code in either:
//   - `src/types.rs` (file), or
//   - `src/types/mod.rs` (directory with mod.rs)
// We use the file approach since each module is a single file.

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

// `pub use` makes items from submodules available at the crate root.
// Users can write `use quark_protocol::Command` instead of
// `use quark_protocol::types::Command`. This is a cleaner public API.

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ActorId, ActorMessage, ClientFrame, Command, CreateRoomRequest, CreateRoomResponse,
    Event, GameServerAddr, GameServerId, MembershipEvent, Message, OriginalCommand,
    Payload, RegisterEvent, RegisterRequest, RoomAllocatedEvent, RoomId, RoomStatus,
    UpdateRequest, ERROR_ROOM_DOES_NOT_EXIST, GAME_SERVER_ID_METADATA_KEY,
};
