//! Per-connection handlers for both listeners.
//!
//! Each accepted connection gets its own Tokio task running one of these.
//! Both peek the connection's first frame to decide what kind of stream it
//! is before handing off to the matching session driver — the same "first
//! message decides the shape of everything after" idiom the room/session
//! layers use for their own accept paths.

use std::sync::Arc;

use quark_master::Fleet;
use quark_protocol::{
    ClientFrame, Codec, CreateRoomResponse, GameServerAddr, RegisterRequest,
    GAME_SERVER_ID_METADATA_KEY,
};
use quark_room::RoomSet;
use quark_session::{GameServerSession, MasterSession};
use quark_transport::{Connection, Metadata, WebSocketConnection};

use crate::server::DEFAULT_GAME_SERVER_CAPACITY;
use crate::QuarkError;

/// Handles one client-facing connection from accept to close.
///
/// The first frame is decoded as a [`ClientFrame`]: a `CreateRoom` frame is
/// answered in place and the connection is done (`CreateRoom` is a unary
/// exchange, not part of the persistent session); a `Command` frame is
/// handed to a fresh [`GameServerSession`] as its already-consumed first
/// command, and the session takes over the connection from there.
pub(crate) async fn handle_game_server_connection(
    conn: WebSocketConnection,
    room_set: Arc<RoomSet>,
    codec: impl Codec,
) -> Result<(), QuarkError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new game-server connection");

    let Some(data) = conn.recv().await? else {
        tracing::debug!(%conn_id, "connection closed before first frame");
        return Ok(());
    };

    let frame: ClientFrame = codec.decode(&data)?;
    match frame {
        ClientFrame::CreateRoom(req) => {
            let room_name = if req.room_name.is_empty() {
                uuid::Uuid::new_v4().to_string()
            } else {
                req.room_name
            };
            let (room_id, already_exist) = room_set.create_or_get(room_name);
            let response = CreateRoomResponse {
                room_id,
                already_exist,
            };
            let bytes = codec.encode(&response)?;
            conn.send(&bytes).await?;
            tracing::info!(%conn_id, %room_id, already_exist, "room created");
            Ok(())
        }
        ClientFrame::Command(cmd) => {
            let session = GameServerSession::new(room_set);
            tracing::info!(%conn_id, actor_id = %session.actor_id(), "starting client session");
            session
                .run_with_first(Some(cmd), conn, codec)
                .await
                .map_err(QuarkError::from)
        }
    }
}

/// Handles one game-server-facing connection from accept to close.
///
/// Whether this is a Register or an Update stream is decided by the
/// `quark-gameserver-id` handshake header captured in `metadata`: present
/// means this is an already-registered server pushing room status; absent
/// means this is a fresh registration, whose address is read off the
/// first frame.
pub(crate) async fn handle_master_connection(
    conn: WebSocketConnection,
    metadata: Metadata,
    fleet: Arc<Fleet>,
    codec: impl Codec,
) -> Result<(), QuarkError> {
    let conn_id = conn.id();
    let session = MasterSession::new(fleet);

    if metadata.get(GAME_SERVER_ID_METADATA_KEY).is_some() {
        tracing::debug!(%conn_id, "handling update stream");
        return session
            .run_update(&metadata, conn, codec)
            .await
            .map_err(QuarkError::from);
    }

    tracing::debug!(%conn_id, "handling register stream");
    let Some(data) = conn.recv().await? else {
        tracing::debug!(%conn_id, "connection closed before registration");
        return Ok(());
    };

    let request: RegisterRequest = codec.decode(&data)?;
    let addr = GameServerAddr {
        host: request.host,
        port: request.port,
    };
    session
        .run_register(addr, DEFAULT_GAME_SERVER_CAPACITY, conn, codec)
        .await
        .map_err(QuarkError::from)
}
