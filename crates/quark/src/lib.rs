//! # quark
//!
//! Distributed game-session backend: a room engine for per-room membership
//! and broadcast, and a fleet allocator for a master's game-server registry
//! and capacity-aware room placement.
//!
//! quark ties the lower layers together into two runnable services:
//!
//! - [`GameServer`] — the client-facing listener. Accepts WebSocket
//!   connections, dispatches the one-shot `CreateRoom` exchange, and drives
//!   a [`quark_session::GameServerSession`] for everything after.
//! - [`Master`] — the game-server-facing listener. Accepts WebSocket
//!   connections from game servers and dispatches them to a Register or
//!   Update stream based on whether the connection carries a
//!   `quark-gameserver-id` handshake header.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), quark::QuarkError> {
//! let game_server = quark::GameServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! game_server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::QuarkError;
pub use server::{GameServer, GameServerBuilder, Master, MasterBuilder};

pub mod prelude {
    pub use crate::{GameServer, GameServerBuilder, Master, MasterBuilder, QuarkError};
}
