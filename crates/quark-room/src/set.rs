//! `RoomSet`: name→room index with an atomic create-or-get primitive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use quark_protocol::RoomId;

use crate::room::spawn_room;
use crate::{RoomHandle, RoomSetConfig};

/// Command channel size for spawned room actors. Distinct from a room's
/// per-subscriber inbox capacity — this one only bounds how many
/// in-flight `join`/`leave`/`broadcast` calls a room actor can queue.
const ROOM_COMMAND_CHANNEL_SIZE: usize = 64;

struct Inner {
    by_name: HashMap<String, RoomId>,
    by_id: HashMap<RoomId, RoomHandle>,
}

/// Name→room index. `create_or_get` gives room identity on a name: the
/// first caller to use a given name creates the room, every later caller
/// with the same name is handed the same `RoomId`.
///
/// No operation here awaits anything, so the index is guarded by a plain
/// `std::sync::Mutex` rather than an async one — spawning a room actor is
/// fire-and-forget (`tokio::spawn`), not a suspension point.
pub struct RoomSet {
    next_id: AtomicU64,
    config: RoomSetConfig,
    inner: Mutex<Inner>,
}

impl RoomSet {
    pub fn new() -> Self {
        Self::with_config(RoomSetConfig::default())
    }

    pub fn with_config(config: RoomSetConfig) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            config,
            inner: Mutex::new(Inner {
                by_name: HashMap::new(),
                by_id: HashMap::new(),
            }),
        }
    }

    /// Returns the room named `name`, creating it if it doesn't exist yet.
    /// The boolean is `true` if the room already existed.
    pub fn create_or_get(&self, name: impl Into<String>) -> (RoomId, bool) {
        let name = name.into();
        let mut inner = self.inner.lock().expect("room set mutex poisoned");

        if let Some(&room_id) = inner.by_name.get(&name) {
            return (room_id, true);
        }

        let room_id = RoomId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room(
            room_id,
            name.clone(),
            self.config.inbox_capacity,
            ROOM_COMMAND_CHANNEL_SIZE,
        );
        inner.by_name.insert(name, room_id);
        inner.by_id.insert(room_id, handle);

        tracing::info!(%room_id, "room created");
        (room_id, false)
    }

    /// Direct lookup by id.
    pub fn get(&self, id: RoomId) -> Option<RoomHandle> {
        self.inner
            .lock()
            .expect("room set mutex poisoned")
            .by_id
            .get(&id)
            .cloned()
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().expect("room set mutex poisoned").by_id.len()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.inner
            .lock()
            .expect("room set mutex poisoned")
            .by_id
            .keys()
            .copied()
            .collect()
    }
}

impl Default for RoomSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `create_or_get` spawns a room actor via `tokio::spawn`, so even
    // these non-awaiting assertions need a runtime context to run in.

    #[tokio::test]
    async fn create_or_get_is_idempotent_on_name() {
        let set = RoomSet::new();
        let (id1, existed1) = set.create_or_get("xxxxxxxx");
        assert!(!existed1);
        let (id2, existed2) = set.create_or_get("xxxxxxxx");
        assert!(existed2);
        assert_eq!(id1, id2);
    }

    #[tokio::test]
    async fn distinct_names_get_distinct_ids() {
        let set = RoomSet::new();
        let (id1, _) = set.create_or_get("a");
        let (id2, _) = set.create_or_get("b");
        assert_ne!(id1, id2);
        assert_eq!(set.room_count(), 2);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let set = RoomSet::new();
        assert!(set.get(RoomId(999)).is_none());
    }

    #[tokio::test]
    async fn get_known_id_returns_handle() {
        let set = RoomSet::new();
        let (id, _) = set.create_or_get("room");
        assert!(set.get(id).is_some());
    }
}
