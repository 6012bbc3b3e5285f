//! Builders and accept loops for the two listeners quark runs: the
//! client-facing [`GameServer`] and the game-server-facing [`Master`].

use std::sync::Arc;

use quark_master::Fleet;
use quark_protocol::{Codec, JsonCodec, GAME_SERVER_ID_METADATA_KEY};
use quark_room::RoomSet;
use quark_transport::{Transport, WebSocketTransport};

use crate::handler::{handle_game_server_connection, handle_master_connection};
use crate::QuarkError;

/// Capacity assigned to every newly registered game server.
///
/// The wire `RegisterRequest` carries only host/port — no capacity field —
/// so every registration gets the same fixed allotment rather than one
/// supplied by the request.
pub const DEFAULT_GAME_SERVER_CAPACITY: u32 = 5;

// ---------------------------------------------------------------------------
// GameServer: client-facing listener
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a [`GameServer`].
pub struct GameServerBuilder {
    bind_addr: String,
}

impl GameServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the client-facing listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and returns a ready-to-run [`GameServer`].
    ///
    /// Uses `WebSocketTransport` and `JsonCodec` as defaults (MVP).
    pub async fn build(self) -> Result<GameServer, QuarkError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(GameServer {
            transport,
            room_set: Arc::new(RoomSet::new()),
            codec: JsonCodec,
        })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running client-facing game server, accepting WebSocket connections and
/// dispatching each to either the `CreateRoom` unary exchange or a
/// persistent [`quark_session::GameServerSession`].
pub struct GameServer {
    transport: WebSocketTransport,
    room_set: Arc<RoomSet>,
    codec: JsonCodec,
}

impl GameServer {
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the room index this server's sessions share — useful
    /// for inspecting state from outside the accept loop (tests, admin
    /// tooling).
    pub fn room_set(&self) -> Arc<RoomSet> {
        Arc::clone(&self.room_set)
    }

    /// Runs the accept loop. Runs until the process is terminated or the
    /// transport is shut down.
    pub async fn run(mut self) -> Result<(), QuarkError> {
        tracing::info!("quark game server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let room_set = Arc::clone(&self.room_set);
                    let codec = self.codec;
                    tokio::spawn(async move {
                        if let Err(e) = handle_game_server_connection(conn, room_set, codec).await
                        {
                            tracing::debug!(error = %e, "game-server connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Master: game-server-facing listener
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a [`Master`].
pub struct MasterBuilder {
    bind_addr: String,
}

impl MasterBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:9090".to_string(),
        }
    }

    /// Sets the address to bind the game-server-facing listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and returns a ready-to-run [`Master`].
    pub async fn build(self) -> Result<Master, QuarkError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(Master {
            transport,
            fleet: Arc::new(Fleet::new()),
            codec: JsonCodec,
        })
    }
}

impl Default for MasterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running game-server-facing master, accepting WebSocket connections
/// from game servers and dispatching each to a Register or Update stream
/// based on whether the `quark-gameserver-id` handshake header is present.
pub struct Master {
    transport: WebSocketTransport,
    fleet: Arc<Fleet>,
    codec: JsonCodec,
}

impl Master {
    pub fn builder() -> MasterBuilder {
        MasterBuilder::new()
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the fleet this master drives — useful for inspecting
    /// registrations and allocations from outside the accept loop.
    pub fn fleet(&self) -> Arc<Fleet> {
        Arc::clone(&self.fleet)
    }

    /// Runs the accept loop. Runs until the process is terminated or the
    /// transport is shut down.
    pub async fn run(mut self) -> Result<(), QuarkError> {
        tracing::info!("quark master running");

        loop {
            match self
                .transport
                .accept_with_metadata(&[GAME_SERVER_ID_METADATA_KEY])
                .await
            {
                Ok((conn, metadata)) => {
                    let fleet = Arc::clone(&self.fleet);
                    let codec = self.codec;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_master_connection(conn, metadata, fleet, codec).await
                        {
                            tracing::debug!(error = %e, "master connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
