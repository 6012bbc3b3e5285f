//! `Fleet`: the master's registry of game servers and its capacity-aware
//! room allocator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use quark_protocol::{GameServerAddr, GameServerId, RoomAllocatedEvent, RoomId, RoomStatus};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::{FleetConfig, FleetError, GameServer};

/// Handle to a registered allocation-event sink, returned by
/// [`Fleet::add_listener`] and consumed by [`Fleet::remove_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

struct Inner {
    servers: Vec<GameServer>,
    room_to_server: HashMap<RoomId, GameServerId>,
    room_status: HashMap<RoomId, RoomStatus>,
    listeners: HashMap<u64, mpsc::Sender<RoomAllocatedEvent>>,
}

/// In-memory fleet registry and room allocator.
///
/// A single `RwLock` guards every field: `allocate` and
/// `update_room_status` take the writer, `lookup`/`is_registered` take
/// the reader. Allocation-event fan-out happens while holding the writer,
/// so listener sinks must be bounded non-blocking queues — a full sink
/// drops the event for that listener only, it never stalls the lock.
pub struct Fleet {
    inner: RwLock<Inner>,
    next_listener_id: AtomicU64,
}

impl Fleet {
    pub fn new() -> Self {
        Self::with_config(FleetConfig::default())
    }

    pub fn with_config(_config: FleetConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                servers: Vec::new(),
                room_to_server: HashMap::new(),
                room_status: HashMap::new(),
                listeners: HashMap::new(),
            }),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Registers a new game server, returning its freshly minted id.
    pub async fn register(&self, addr: GameServerAddr, cap_total: u32) -> GameServerId {
        let id = GameServerId(Uuid::new_v4().to_string());
        let mut inner = self.inner.write().await;
        inner
            .servers
            .push(GameServer::new(id.clone(), addr, cap_total));
        tracing::info!(%id, "game server registered");
        id
    }

    pub async fn is_registered(&self, id: &GameServerId) -> bool {
        let inner = self.inner.read().await;
        inner.servers.iter().any(|s| &s.id == id)
    }

    /// First-fit allocation: picks the first server in the
    /// capacity-ordered list with spare capacity, binds `room_id` to it,
    /// and publishes a [`RoomAllocatedEvent`] to every current listener.
    pub async fn allocate(
        &self,
        room_id: RoomId,
        room_name: String,
    ) -> Result<GameServerAddr, FleetError> {
        let mut inner = self.inner.write().await;

        if inner.servers.is_empty() {
            return Err(FleetError::NotEnoughGameServers);
        }
        if inner.room_to_server.contains_key(&room_id) {
            return Err(FleetError::RoomAlreadyAllocated(room_id));
        }

        let idx = inner
            .servers
            .iter()
            .position(|s| s.has_capacity())
            .ok_or(FleetError::NotEnoughGameServers)?;

        inner.servers[idx].add_room(room_id)?;
        let addr = inner.servers[idx].addr.clone();
        let gs_id = inner.servers[idx].id.clone();

        let status = RoomStatus {
            room_id,
            room_name,
            actor_count: 0,
        };
        inner.room_to_server.insert(room_id, gs_id);
        inner.room_status.insert(room_id, status.clone());

        let event = RoomAllocatedEvent {
            game_server: addr.clone(),
            room: status,
        };
        for (listener_id, sink) in inner.listeners.iter() {
            if sink.try_send(event.clone()).is_err() {
                tracing::warn!(listener_id, "allocation listener sink full, dropping event");
            }
        }

        tracing::info!(%room_id, %addr, "room allocated");
        Ok(addr)
    }

    pub async fn lookup(&self, room_id: RoomId) -> Option<GameServerAddr> {
        let inner = self.inner.read().await;
        let gs_id = inner.room_to_server.get(&room_id)?;
        inner
            .servers
            .iter()
            .find(|s| &s.id == gs_id)
            .map(|s| s.addr.clone())
    }

    /// Upserts a room's status, refreshes the owning server's view, then
    /// stably re-sorts the server list by descending free capacity so the
    /// next `allocate` picks the least-loaded server.
    pub async fn update_room_status(&self, status: RoomStatus) -> Result<(), FleetError> {
        let mut inner = self.inner.write().await;
        let room_id = status.room_id;

        if !inner.room_status.contains_key(&room_id) {
            return Err(FleetError::RoomStatusNotFound(room_id));
        }
        inner.room_status.insert(room_id, status.clone());

        let gs_id = inner
            .room_to_server
            .get(&room_id)
            .cloned()
            .ok_or(FleetError::RoomStatusNotFound(room_id))?;
        if let Some(server) = inner.servers.iter_mut().find(|s| s.id == gs_id) {
            server.update_room_status(status);
        }

        inner
            .servers
            .sort_by(|a, b| b.free_capacity().cmp(&a.free_capacity()));
        Ok(())
    }

    /// Registers a bounded sink for allocation events. Delivery is
    /// synchronous with the allocation transition: a listener added
    /// before an `allocate` call observes the resulting event, one added
    /// after does not.
    pub async fn add_listener(&self, sink: mpsc::Sender<RoomAllocatedEvent>) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.write().await.listeners.insert(id, sink);
        ListenerId(id)
    }

    /// Unregisters a listener. Taking the writer lock here means no
    /// in-flight publish can observe the removed sink after this returns.
    pub async fn remove_listener(&self, id: ListenerId) {
        self.inner.write().await.listeners.remove(&id.0);
    }

    /// Read-only snapshot of every room the Fleet currently knows about.
    pub async fn room_statuses(&self) -> Vec<RoomStatus> {
        self.inner.read().await.room_status.values().cloned().collect()
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new()
    }
}
