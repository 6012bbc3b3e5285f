//! `MasterSession`: drives the Fleet on behalf of one game server's
//! Register or Update stream.
//!
//! These are two distinct RPCs — Register is server-streaming (master
//! pushes `Allocation`s), Update is client-streaming (the game server
//! pushes room-status tuples) — so they run on distinct connections with
//! distinct identity rules: Register supplies its own address up front,
//! Update must already be registered and proves it via the
//! `quark-gameserver-id` transport header.

use std::sync::Arc;

use quark_master::Fleet;
use quark_protocol::{
    Codec, GameServerAddr, GameServerId, RegisterEvent, UpdateRequest,
    GAME_SERVER_ID_METADATA_KEY,
};
use quark_transport::{Connection, Metadata};
use tokio::sync::mpsc;

use crate::MasterSessionError;

/// Bounds the allocation-event sink a `MasterSession` registers with the
/// Fleet — listener sinks are bounded, drop-on-full queues.
const ALLOCATION_LISTENER_CAPACITY: usize = 32;

/// Drives one or more game-server-facing streams against a shared [`Fleet`].
pub struct MasterSession {
    fleet: Arc<Fleet>,
}

impl MasterSession {
    pub fn new(fleet: Arc<Fleet>) -> Self {
        Self { fleet }
    }

    /// Runs a Register stream to completion: validates `addr`, registers
    /// with the Fleet, immediately sends `Registered`, then forwards every
    /// `RoomAllocatedEvent` addressed to this game server until the
    /// connection closes.
    pub async fn run_register<C, D>(
        &self,
        addr: GameServerAddr,
        cap_total: u32,
        conn: C,
        codec: D,
    ) -> Result<(), MasterSessionError>
    where
        C: Connection,
        D: Codec,
    {
        if addr.host.is_empty() || addr.port.is_empty() {
            return Err(MasterSessionError::InvalidArgument);
        }

        let game_server_id = self.fleet.register(addr.clone(), cap_total).await;
        tracing::info!(%game_server_id, %addr, "game server registered");

        let registered = RegisterEvent::Registered {
            game_server_id: game_server_id.clone(),
        };
        let bytes = codec.encode(&registered)?;
        conn.send(&bytes)
            .await
            .map_err(|e| MasterSessionError::Transport(e.to_string()))?;

        let (tx, mut rx) = mpsc::channel(ALLOCATION_LISTENER_CAPACITY);
        let listener_id = self.fleet.add_listener(tx).await;

        let result = self
            .forward_allocations(&addr, &conn, &codec, &mut rx)
            .await;

        self.fleet.remove_listener(listener_id).await;
        result
    }

    async fn forward_allocations<C, D>(
        &self,
        addr: &GameServerAddr,
        conn: &C,
        codec: &D,
        rx: &mut mpsc::Receiver<quark_protocol::RoomAllocatedEvent>,
    ) -> Result<(), MasterSessionError>
    where
        C: Connection,
        D: Codec,
    {
        loop {
            tokio::select! {
                incoming = conn.recv() => {
                    match incoming {
                        Ok(Some(_)) => continue,
                        Ok(None) => return Ok(()),
                        Err(e) => return Err(MasterSessionError::Transport(e.to_string())),
                    }
                }
                event = rx.recv() => {
                    let Some(event) = event else { return Ok(()) };
                    if &event.game_server != addr {
                        continue;
                    }
                    let wire = RegisterEvent::Allocation {
                        room_id: event.room.room_id,
                        room_name: event.room.room_name,
                    };
                    let bytes = codec.encode(&wire)?;
                    conn.send(&bytes)
                        .await
                        .map_err(|e| MasterSessionError::Transport(e.to_string()))?;
                }
            }
        }
    }

    /// Runs an Update stream to completion: establishes identity from
    /// `metadata`'s `quark-gameserver-id` header, then applies every inbound
    /// `(room, actor_count)` tuple to the Fleet until the connection closes
    /// or a tuple fails — the first failure terminates the stream.
    pub async fn run_update<C, D>(
        &self,
        metadata: &Metadata,
        conn: C,
        codec: D,
    ) -> Result<(), MasterSessionError>
    where
        C: Connection,
        D: Codec,
    {
        let game_server_id = metadata
            .get(GAME_SERVER_ID_METADATA_KEY)
            .map(|s| GameServerId(s.to_string()))
            .ok_or(MasterSessionError::PermissionDenied)?;

        if !self.fleet.is_registered(&game_server_id).await {
            return Err(MasterSessionError::PermissionDenied);
        }

        loop {
            let Some(data) = conn
                .recv()
                .await
                .map_err(|e| MasterSessionError::Transport(e.to_string()))?
            else {
                return Ok(());
            };

            let update: UpdateRequest = codec.decode(&data)?;
            for status in update.updates {
                self.fleet.update_room_status(status).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_protocol::{JsonCodec, RoomId, RoomStatus};
    use tokio::sync::Mutex as AsyncMutex;

    /// An in-memory `Connection` double. Inbound frames are served from a
    /// real `mpsc` channel so `recv()` behaves like a socket: it yields
    /// queued frames, then blocks until either more arrive or the sender is
    /// dropped (clean close) — never spinning hot on an empty queue.
    struct MockConnection {
        inbound: AsyncMutex<mpsc::Receiver<Vec<u8>>>,
        outbound: std::sync::Mutex<Vec<Vec<u8>>>,
    }

    impl MockConnection {
        /// A connection that yields `frames` in order, then closes.
        fn closing(frames: Vec<Vec<u8>>) -> Self {
            let (tx, rx) = mpsc::channel(frames.len().max(1));
            for f in frames {
                tx.try_send(f).expect("capacity sized to frame count");
            }
            Self {
                inbound: AsyncMutex::new(rx),
                outbound: std::sync::Mutex::new(Vec::new()),
            }
        }

        /// A connection that never sends and never closes — paired with
        /// the sender so the test can keep it alive for a bounded window.
        fn open() -> (Self, mpsc::Sender<Vec<u8>>) {
            let (tx, rx) = mpsc::channel(1);
            (
                Self {
                    inbound: AsyncMutex::new(rx),
                    outbound: std::sync::Mutex::new(Vec::new()),
                },
                tx,
            )
        }
    }

    impl quark_transport::Connection for MockConnection {
        type Error = quark_transport::TransportError;

        async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
            self.outbound.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
            Ok(self.inbound.lock().await.recv().await)
        }

        async fn close(&self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn id(&self) -> quark_transport::ConnectionId {
            quark_transport::ConnectionId::new(1)
        }
    }

    fn addr(host: &str, port: &str) -> GameServerAddr {
        GameServerAddr {
            host: host.into(),
            port: port.into(),
        }
    }

    #[tokio::test]
    async fn register_rejects_empty_host() {
        let session = MasterSession::new(Arc::new(Fleet::new()));
        let conn = MockConnection::closing(vec![]);
        let result = session
            .run_register(addr("", "9000"), 5, conn, JsonCodec)
            .await;
        assert!(matches!(result, Err(MasterSessionError::InvalidArgument)));
    }

    #[tokio::test]
    async fn register_sends_registered_then_forwards_matching_allocation() {
        let fleet = Arc::new(Fleet::new());
        let session = MasterSession::new(Arc::clone(&fleet));
        let (conn, _keep_open) = MockConnection::open();
        let gs_addr = addr("10.0.0.1", "9000");

        let fleet_for_alloc = Arc::clone(&fleet);
        let alloc_task = tokio::spawn(async move {
            // Give run_register time to register and subscribe a listener
            // before the allocation happens, so it's guaranteed to observe it.
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            fleet_for_alloc
                .allocate(RoomId(1), "room-a".into())
                .await
                .expect("allocation should succeed");
        });

        // run_register blocks forever on this open connection, so bound it
        // with a timeout and inspect what was written in that window.
        let run_fut = session.run_register(gs_addr, 5, &conn, JsonCodec);
        let _ = tokio::time::timeout(std::time::Duration::from_millis(150), run_fut).await;
        alloc_task.await.unwrap();

        let outbound = conn.outbound.lock().unwrap();
        assert!(outbound.len() >= 2, "expected Registered and Allocation frames");
        let first: RegisterEvent = serde_json::from_slice(&outbound[0]).unwrap();
        assert!(matches!(first, RegisterEvent::Registered { .. }));
        assert!(outbound.iter().any(|frame| {
            matches!(
                serde_json::from_slice::<RegisterEvent>(frame),
                Ok(RegisterEvent::Allocation { room_id, .. }) if room_id == RoomId(1)
            )
        }));
    }

    #[tokio::test]
    async fn update_rejects_missing_identity() {
        let session = MasterSession::new(Arc::new(Fleet::new()));
        let conn = MockConnection::closing(vec![]);
        let metadata = Metadata::new();
        let result = session.run_update(&metadata, conn, JsonCodec).await;
        assert!(matches!(result, Err(MasterSessionError::PermissionDenied)));
    }

    #[tokio::test]
    async fn update_rejects_unregistered_identity() {
        let session = MasterSession::new(Arc::new(Fleet::new()));
        let conn = MockConnection::closing(vec![]);
        let mut metadata = Metadata::new();
        metadata.insert(GAME_SERVER_ID_METADATA_KEY, "ghost");
        let result = session.run_update(&metadata, conn, JsonCodec).await;
        assert!(matches!(result, Err(MasterSessionError::PermissionDenied)));
    }

    #[tokio::test]
    async fn update_applies_tuples_for_registered_server() {
        let fleet = Arc::new(Fleet::new());
        let gs_id = fleet.register(addr("h", "1"), 10).await;
        fleet.allocate(RoomId(9), "r9".into()).await.unwrap();

        let session = MasterSession::new(Arc::clone(&fleet));
        let update = UpdateRequest {
            updates: vec![RoomStatus {
                room_id: RoomId(9),
                room_name: "r9".into(),
                actor_count: 4,
            }],
        };
        let frame = serde_json::to_vec(&update).unwrap();
        let conn = MockConnection::closing(vec![frame]);
        let mut metadata = Metadata::new();
        metadata.insert(GAME_SERVER_ID_METADATA_KEY, gs_id.0.clone());

        let result = session.run_update(&metadata, conn, JsonCodec).await;
        assert!(result.is_ok());
        let statuses = fleet.room_statuses().await;
        assert_eq!(statuses[0].actor_count, 4);
    }

    #[tokio::test]
    async fn update_terminates_on_unknown_room() {
        let fleet = Arc::new(Fleet::new());
        let gs_id = fleet.register(addr("h", "1"), 10).await;

        let session = MasterSession::new(Arc::clone(&fleet));
        let update = UpdateRequest {
            updates: vec![RoomStatus {
                room_id: RoomId(404),
                room_name: "missing".into(),
                actor_count: 1,
            }],
        };
        let frame = serde_json::to_vec(&update).unwrap();
        let conn = MockConnection::closing(vec![frame]);
        let mut metadata = Metadata::new();
        metadata.insert(GAME_SERVER_ID_METADATA_KEY, gs_id.0.clone());

        let result = session.run_update(&metadata, conn, JsonCodec).await;
        assert!(matches!(result, Err(MasterSessionError::Fleet(_))));
    }
}
