//! Room engine for quark.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its own
//! membership set and subscriber inboxes. [`RoomSet`] is the name→room
//! index games use to find-or-create a room by name.

mod config;
mod error;
mod room;
mod set;

pub use config::{RoomSetConfig, DEFAULT_INBOX_CAPACITY};
pub use error::RoomError;
pub use room::{RoomEntry, RoomHandle, RoomInfo, RoomState};
pub use set::RoomSet;
