//! `GameServer`: the master's view of one registered game server.

use std::collections::{HashMap, HashSet};

use quark_protocol::{GameServerAddr, GameServerId, RoomId, RoomStatus};

use crate::FleetError;

/// Master-side record for a single registered game server.
#[derive(Debug, Clone)]
pub struct GameServer {
    pub id: GameServerId,
    pub addr: GameServerAddr,
    pub cap_total: u32,
    hosted: HashSet<RoomId>,
    statuses: HashMap<RoomId, RoomStatus>,
}

impl GameServer {
    pub(crate) fn new(id: GameServerId, addr: GameServerAddr, cap_total: u32) -> Self {
        Self {
            id,
            addr,
            cap_total,
            hosted: HashSet::new(),
            statuses: HashMap::new(),
        }
    }

    /// `|hosted| < cap_total`.
    pub fn has_capacity(&self) -> bool {
        (self.hosted.len() as u32) < self.cap_total
    }

    /// Adds `room_id` to this server's hosted set. Fails if it's already
    /// hosted here.
    pub fn add_room(&mut self, room_id: RoomId) -> Result<(), FleetError> {
        if !self.hosted.insert(room_id) {
            return Err(FleetError::RoomAlreadyAllocated(room_id));
        }
        Ok(())
    }

    /// Upserts a room's status, refreshing this server's view of its
    /// `actor_count`.
    pub fn update_room_status(&mut self, status: RoomStatus) {
        self.statuses.insert(status.room_id, status);
    }

    /// `cap_total - Σ actor_count over hosted`: total free actor slots
    /// across this server's hosted rooms. Rooms hosted but not yet
    /// reported in `statuses` contribute zero. This is the Fleet's sort
    /// key — "total free slots", not "free room slots".
    pub fn free_capacity(&self) -> i64 {
        let occupied: u32 = self
            .hosted
            .iter()
            .map(|room_id| self.statuses.get(room_id).map_or(0, |s| s.actor_count))
            .sum();
        self.cap_total as i64 - occupied as i64
    }

    pub fn hosted_rooms(&self) -> impl Iterator<Item = &RoomId> {
        self.hosted.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(cap: u32) -> GameServer {
        GameServer::new(
            GameServerId("gs-1".into()),
            GameServerAddr {
                host: "h".into(),
                port: "1".into(),
            },
            cap,
        )
    }

    #[test]
    fn has_capacity_until_full() {
        let mut gs = server(2);
        assert!(gs.has_capacity());
        gs.add_room(RoomId(1)).unwrap();
        assert!(gs.has_capacity());
        gs.add_room(RoomId(2)).unwrap();
        assert!(!gs.has_capacity());
    }

    #[test]
    fn add_room_twice_fails() {
        let mut gs = server(5);
        gs.add_room(RoomId(1)).unwrap();
        assert!(matches!(
            gs.add_room(RoomId(1)),
            Err(FleetError::RoomAlreadyAllocated(_))
        ));
    }

    #[test]
    fn free_capacity_subtracts_actor_counts() {
        let mut gs = server(10);
        gs.add_room(RoomId(1)).unwrap();
        gs.add_room(RoomId(2)).unwrap();
        assert_eq!(gs.free_capacity(), 10);

        gs.update_room_status(RoomStatus {
            room_id: RoomId(1),
            room_name: "r1".into(),
            actor_count: 3,
        });
        assert_eq!(gs.free_capacity(), 7);

        gs.update_room_status(RoomStatus {
            room_id: RoomId(2),
            room_name: "r2".into(),
            actor_count: 2,
        });
        assert_eq!(gs.free_capacity(), 5);
    }

    #[test]
    fn unreported_hosted_room_contributes_zero() {
        let mut gs = server(4);
        gs.add_room(RoomId(1)).unwrap();
        assert_eq!(gs.free_capacity(), 4);
    }
}
