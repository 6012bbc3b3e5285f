//! Configuration for the room engine.

/// Tunables for [`crate::RoomSet`].
///
/// `inbox_capacity` bounds every subscriber's per-room inbox — the
/// bounded-queue backpressure every `Room` enforces. Kept as a constructor
/// parameter rather than a global constant so tests can use a small
/// capacity to exercise overflow-drop deterministically.
#[derive(Debug, Clone, Copy)]
pub struct RoomSetConfig {
    pub inbox_capacity: usize,
}

pub const DEFAULT_INBOX_CAPACITY: usize = 64;

impl Default for RoomSetConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}
