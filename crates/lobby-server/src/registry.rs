//! The process-wide room registry: a single mutex guarding two indices
//! (by id, by natural key) plus the id counter.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::fields::{Fields, natural_key};

#[derive(Debug, Clone)]
pub struct Room {
    pub id: u64,
    pub key: String,
    pub fields: Fields,
    pub updated: u64,
}

#[derive(Debug)]
pub struct RegistryFull;

struct Inner {
    rooms_by_id: HashMap<u64, Room>,
    rooms_by_key: HashMap<String, u64>,
    next_id: u64,
}

pub struct Registry {
    inner: Mutex<Inner>,
    room_ttl_secs: u64,
    max_rooms: usize,
}

/// Current wall-clock time in whole seconds since the epoch.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl Registry {
    pub fn new(room_ttl_secs: u64, max_rooms: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                rooms_by_id: HashMap::new(),
                rooms_by_key: HashMap::new(),
                next_id: 1,
            }),
            room_ttl_secs,
            max_rooms,
        }
    }

    fn prune_locked(&self, inner: &mut Inner, now: u64) {
        let cutoff = now.saturating_sub(self.room_ttl_secs);
        let expired: Vec<u64> = inner
            .rooms_by_id
            .iter()
            .filter(|(_, room)| room.updated < cutoff)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(room) = inner.rooms_by_id.remove(&id) {
                inner.rooms_by_key.remove(&room.key);
                tracing::debug!(room_id = id, key = %room.key, "room evicted (ttl expired)");
            }
        }
    }

    /// Insert or update a room, returning its id.
    ///
    /// Re-posting the natural key of an existing room updates it in place
    /// (same id, refreshed `updated`). A brand-new key is rejected with
    /// [`RegistryFull`] once the live room count has reached the cap.
    pub fn add(&self, fields: Fields, now: u64) -> Result<u64, RegistryFull> {
        let mut inner = self.inner.lock();
        self.prune_locked(&mut inner, now);

        let key = natural_key(&fields);
        let id = match inner.rooms_by_key.get(&key).copied() {
            Some(id) => id,
            None => {
                if inner.rooms_by_id.len() >= self.max_rooms {
                    return Err(RegistryFull);
                }
                let id = inner.next_id;
                inner.next_id += 1;
                inner.rooms_by_key.insert(key.clone(), id);
                id
            }
        };

        inner.rooms_by_id.insert(
            id,
            Room {
                id,
                key,
                fields,
                updated: now,
            },
        );

        Ok(id)
    }

    /// Prune, then return a snapshot of all currently-registered rooms.
    pub fn list(&self, now: u64) -> Vec<Room> {
        let mut inner = self.inner.lock();
        self.prune_locked(&mut inner, now);
        inner.rooms_by_id.values().cloned().collect()
    }

    #[cfg(test)]
    pub fn room_count(&self) -> usize {
        self.inner.lock().rooms_by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{HostMethod, RawAddParams, extract_fields};

    fn fields_for(ip: &str, port: &str, username: &str) -> Fields {
        let mut raw = RawAddParams::default();
        raw.port = Some(port.to_string());
        raw.username = username.to_string();
        extract_fields(raw, ip.to_string(), |_| None)
    }

    #[test]
    fn repost_of_same_natural_key_reuses_id() {
        let registry = Registry::new(180, 512);
        let id1 = registry.add(fields_for("1.2.3.4", "55435", "alice"), 1000).unwrap();
        let id2 = registry.add(fields_for("1.2.3.4", "55435", "alice"), 1060).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn distinct_natural_keys_get_distinct_ids() {
        let registry = Registry::new(180, 512);
        let id1 = registry.add(fields_for("1.2.3.4", "55435", "alice"), 1000).unwrap();
        let id2 = registry.add(fields_for("1.2.3.4", "55435", "bob"), 1000).unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn expired_room_is_evicted_and_reposting_gets_a_new_id() {
        let registry = Registry::new(180, 512);
        let id1 = registry.add(fields_for("1.2.3.4", "55435", "alice"), 1000).unwrap();
        // Well past the 180s TTL.
        let id2 = registry.add(fields_for("1.2.3.4", "55435", "alice"), 2000).unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn cap_rejects_new_key_but_allows_update_of_existing() {
        let registry = Registry::new(180, 1);
        registry.add(fields_for("1.2.3.4", "1", "alice"), 1000).unwrap();
        assert!(registry.add(fields_for("5.6.7.8", "2", "bob"), 1000).is_err());
        // Updating the existing room must still succeed at the cap.
        assert!(registry.add(fields_for("1.2.3.4", "1", "alice"), 1001).is_ok());
    }

    #[test]
    fn host_method_defaults_to_manual() {
        let registry = Registry::new(180, 512);
        let id = registry.add(fields_for("1.2.3.4", "1", "alice"), 1000).unwrap();
        let rooms = registry.list(1000);
        let room = rooms.iter().find(|r| r.id == id).unwrap();
        assert_eq!(room.fields.host_method, HostMethod::Manual);
    }
}
