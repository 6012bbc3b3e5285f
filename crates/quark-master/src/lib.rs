//! Fleet registry and capacity-aware room allocator for quark.
//!
//! This is the master plane: tracking which game servers are registered,
//! how much spare capacity each has, and which game server hosts which
//! room. [`Fleet`] is the single entry point; [`GameServer`] is its
//! per-server bookkeeping record.

mod config;
mod error;
mod fleet;
mod gameserver;

pub use config::FleetConfig;
pub use error::FleetError;
pub use fleet::{Fleet, ListenerId};
pub use gameserver::GameServer;
