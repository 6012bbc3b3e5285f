//! Configuration for the fleet allocator.

/// Tunables for [`crate::Fleet`].
///
/// Currently a marker for symmetry with [`quark_room::RoomSetConfig`] — the
/// Fleet has no tunables today besides what `register` takes per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetConfig;
