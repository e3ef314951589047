//! Room table: host/client address slots keyed by room name.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::protocol::Role;

#[derive(Debug, Clone, Copy)]
struct Slot {
    addr: SocketAddr,
    seen: u64,
}

#[derive(Debug, Default)]
struct Room {
    host: Option<Slot>,
    client: Option<Slot>,
}

impl Room {
    fn is_empty(&self) -> bool {
        self.host.is_none() && self.client.is_none()
    }

    fn both_present(&self) -> bool {
        self.host.is_some() && self.client.is_some()
    }
}

pub struct RoomTable {
    rooms: HashMap<String, Room>,
    max_rooms: usize,
    timeout_secs: u64,
}

pub struct RegisterFull;

/// Outcome of registering a peer into a room.
pub enum Outcome {
    /// The peer's counterpart is not yet present.
    Waiting,
    /// Both slots are now occupied; carries each side's peer address.
    Paired {
        host_addr: SocketAddr,
        client_addr: SocketAddr,
    },
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl RoomTable {
    pub fn new(timeout_secs: u64, max_rooms: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            max_rooms,
            timeout_secs,
        }
    }

    /// Clear slots whose `seen` predates the timeout cutoff, then drop any
    /// room left with no occupied slot.
    fn prune(&mut self, now: u64) {
        let cutoff = now.saturating_sub(self.timeout_secs);
        let mut to_remove = Vec::new();
        for (name, room) in self.rooms.iter_mut() {
            if let Some(slot) = room.host
                && slot.seen < cutoff
            {
                room.host = None;
                tracing::debug!(room = %name, side = "host", "rendezvous slot expired");
            }
            if let Some(slot) = room.client
                && slot.seen < cutoff
            {
                room.client = None;
                tracing::debug!(room = %name, side = "client", "rendezvous slot expired");
            }
            if room.is_empty() {
                to_remove.push(name.clone());
            }
        }
        for name in to_remove {
            self.rooms.remove(&name);
            tracing::debug!(room = %name, "rendezvous room evicted");
        }
    }

    /// Prune, then register `addr` into `room_name`'s `role` slot.
    ///
    /// A brand-new room is rejected with [`RegisterFull`] once the live
    /// room count has reached the cap; registering into an existing room
    /// (even at the cap) always succeeds.
    pub fn register(
        &mut self,
        room_name: &str,
        role: Role,
        addr: SocketAddr,
        now: u64,
    ) -> Result<Outcome, RegisterFull> {
        self.prune(now);

        if !self.rooms.contains_key(room_name) && self.rooms.len() >= self.max_rooms {
            return Err(RegisterFull);
        }

        let room = self.rooms.entry(room_name.to_string()).or_default();
        let slot = Slot { addr, seen: now };
        match role {
            Role::Host => room.host = Some(slot),
            Role::Client => room.client = Some(slot),
        }

        match (room.host, room.client) {
            (Some(host), Some(client)) => Ok(Outcome::Paired { host_addr: host.addr, client_addr: client.addr }),
            _ => Ok(Outcome::Waiting),
        }
    }

    #[cfg(test)]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
