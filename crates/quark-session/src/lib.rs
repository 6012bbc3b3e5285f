//! Session state machines for quark.
//!
//! This crate hosts the two per-connection drivers that ride on top of the
//! room engine and the fleet allocator:
//!
//! 1. [`GameServerSession`] — one per client stream. Drives a `RoomSet` on
//!    the connected actor's behalf: dispatches `JoinRoom`/`LeaveRoom`/
//!    `SendMessage` commands and forwards room inbox items back out as
//!    events.
//! 2. [`MasterSession`] — one per game-server registration. Registers with
//!    a `Fleet`, pushes allocation events as they occur, and ingests
//!    room-status updates.
//!
//! # How it fits in the stack
//!
//! ```text
//! Transport Layer (below)  ← framed byte stream per connection
//!     ↕
//! Session Layer (this crate)  ← per-connection command/event and
//!                                register/update state machines
//!     ↕
//! Room / Fleet Layer (above)  ← the engines sessions drive
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod game_server_session;
mod master_session;

pub use error::{GameServerSessionError, MasterSessionError};
pub use game_server_session::GameServerSession;
pub use master_session::MasterSession;
