//! Session/slot state: two address slots per session, plus a reverse index
//! from address to (session, slot) for routing raw DATA packets.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy)]
struct SlotInfo {
    addr: SocketAddr,
    last_seen: u64,
}

#[derive(Debug, Default)]
struct Session {
    slot1: Option<SlotInfo>,
    slot2: Option<SlotInfo>,
    updated: u64,
}

impl Session {
    fn slot(&self, n: u8) -> Option<SlotInfo> {
        match n {
            1 => self.slot1,
            2 => self.slot2,
            _ => None,
        }
    }

    fn set_slot(&mut self, n: u8, info: Option<SlotInfo>) {
        match n {
            1 => self.slot1 = info,
            2 => self.slot2 = info,
            _ => {}
        }
    }

    fn both_empty(&self) -> bool {
        self.slot1.is_none() && self.slot2.is_none()
    }
}

pub struct SessionTable {
    sessions: HashMap<String, Session>,
    addr_index: HashMap<SocketAddr, (String, u8)>,
    max_sessions: usize,
    session_ttl_secs: u64,
    client_ttl_secs: u64,
}

pub enum HelloResult {
    Waiting { slot: u8 },
    Ready { slot: u8 },
    Full,
    Busy,
    BadSlot,
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl SessionTable {
    pub fn new(session_ttl_secs: u64, client_ttl_secs: u64, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            addr_index: HashMap::new(),
            max_sessions,
            session_ttl_secs,
            client_ttl_secs,
        }
    }

    fn clear_prior_slot(&mut self, addr: SocketAddr) {
        if let Some((session_id, slot)) = self.addr_index.remove(&addr)
            && let Some(session) = self.sessions.get_mut(&session_id)
        {
            session.set_slot(slot, None);
        }
    }

    pub fn hello(&mut self, session_id: &str, slot_token: Option<&str>, addr: SocketAddr, now: u64) -> HelloResult {
        let requested_slot = match slot_token {
            Some("1") => Some(1u8),
            Some("2") => Some(2u8),
            Some(_) => return HelloResult::BadSlot,
            None => None,
        };

        let is_new = !self.sessions.contains_key(session_id);
        if is_new && self.sessions.len() >= self.max_sessions {
            return HelloResult::Full;
        }
        let session = self.sessions.entry(session_id.to_string()).or_default();

        let slot = requested_slot.unwrap_or(if session.slot1.is_none() { 1 } else { 2 });

        if let Some(existing) = session.slot(slot)
            && existing.addr != addr
        {
            return HelloResult::Busy;
        }

        self.clear_prior_slot(addr);
        let session = self
            .sessions
            .get_mut(session_id)
            .expect("entry().or_default() above guarantees this key exists");
        session.set_slot(slot, Some(SlotInfo { addr, last_seen: now }));
        session.updated = now;
        self.addr_index.insert(addr, (session_id.to_string(), slot));

        let session = self
            .sessions
            .get(session_id)
            .expect("entry().or_default() above guarantees this key exists");
        if session.slot1.is_some() && session.slot2.is_some() {
            HelloResult::Ready { slot }
        } else {
            HelloResult::Waiting { slot }
        }
    }

    pub fn bye(&mut self, addr: SocketAddr) {
        if let Some((session_id, slot)) = self.addr_index.remove(&addr)
            && let Some(session) = self.sessions.get_mut(&session_id)
        {
            session.set_slot(slot, None);
            session.updated = now_unix();
        }
    }

    pub fn ping(&mut self, addr: SocketAddr, now: u64) {
        if let Some((session_id, slot)) = self.addr_index.get(&addr).cloned()
            && let Some(session) = self.sessions.get_mut(&session_id)
            && let Some(mut info) = session.slot(slot)
        {
            info.last_seen = now;
            session.set_slot(slot, Some(info));
        }
    }

    /// Look up the peer address for a DATA packet sent from `addr`,
    /// refreshing `addr`'s `last_seen` along the way.
    pub fn forward_target(&mut self, addr: SocketAddr, now: u64) -> Option<SocketAddr> {
        let (session_id, slot) = self.addr_index.get(&addr).cloned()?;
        let session = self.sessions.get_mut(&session_id)?;
        if let Some(mut info) = session.slot(slot) {
            info.last_seen = now;
            session.set_slot(slot, Some(info));
        }
        let peer_slot = if slot == 1 { 2 } else { 1 };
        session.slot(peer_slot).map(|s| s.addr)
    }

    /// Clear slots idle past `client_ttl_secs`, then drop sessions with both
    /// slots empty and idle past `session_ttl_secs`.
    pub fn prune(&mut self, now: u64) {
        let client_cutoff = now.saturating_sub(self.client_ttl_secs);
        for (session_id, session) in self.sessions.iter_mut() {
            for n in [1u8, 2u8] {
                if let Some(info) = session.slot(n)
                    && info.last_seen < client_cutoff
                {
                    session.set_slot(n, None);
                    self.addr_index.remove(&info.addr);
                    tracing::debug!(session = %session_id, slot = n, "udp relay slot expired");
                }
            }
        }

        let session_cutoff = now.saturating_sub(self.session_ttl_secs);
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.both_empty() && s.updated < session_cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        for session_id in expired {
            self.sessions.remove(&session_id);
            tracing::debug!(session = %session_id, "udp relay session evicted");
        }
    }

    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn first_hello_creates_session_and_waits() {
        let mut table = SessionTable::new(60, 30, 512);
        let result = table.hello("s1", None, addr(1), 0);
        assert!(matches!(result, HelloResult::Waiting { slot: 1 }));
    }

    #[test]
    fn second_hello_fills_slot_two_and_is_ready() {
        let mut table = SessionTable::new(60, 30, 512);
        table.hello("s1", None, addr(1), 0);
        let result = table.hello("s1", None, addr(2), 0);
        assert!(matches!(result, HelloResult::Ready { slot: 2 }));
    }

    #[test]
    fn explicit_slot_conflicting_address_is_busy() {
        let mut table = SessionTable::new(60, 30, 512);
        table.hello("s1", Some("1"), addr(1), 0);
        let result = table.hello("s1", Some("1"), addr(2), 0);
        assert!(matches!(result, HelloResult::Busy));
    }

    #[test]
    fn invalid_slot_token_is_bad_slot() {
        let mut table = SessionTable::new(60, 30, 512);
        assert!(matches!(table.hello("s1", Some("9"), addr(1), 0), HelloResult::BadSlot));
    }

    #[test]
    fn re_hello_from_same_address_is_idempotent() {
        let mut table = SessionTable::new(60, 30, 512);
        table.hello("s1", Some("1"), addr(1), 0);
        let result = table.hello("s1", Some("1"), addr(1), 5);
        assert!(matches!(result, HelloResult::Waiting { slot: 1 }));
    }

    #[test]
    fn new_session_over_cap_is_full() {
        let mut table = SessionTable::new(60, 30, 1);
        table.hello("s1", None, addr(1), 0);
        assert!(matches!(table.hello("s2", None, addr(2), 0), HelloResult::Full));
    }

    #[test]
    fn forward_target_resolves_peer_slot() {
        let mut table = SessionTable::new(60, 30, 512);
        table.hello("s1", None, addr(1), 0);
        table.hello("s1", None, addr(2), 0);
        assert_eq!(table.forward_target(addr(1), 1), Some(addr(2)));
        assert_eq!(table.forward_target(addr(2), 1), Some(addr(1)));
    }

    #[test]
    fn bye_clears_slot_and_frees_address() {
        let mut table = SessionTable::new(60, 30, 512);
        table.hello("s1", None, addr(1), 0);
        table.bye(addr(1));
        assert_eq!(table.forward_target(addr(1), 1), None);
    }

    #[test]
    fn stale_client_is_pruned_and_empty_session_follows() {
        let mut table = SessionTable::new(60, 30, 512);
        table.hello("s1", None, addr(1), 0);
        table.prune(31);
        assert_eq!(table.forward_target(addr(1), 31), None);
        table.prune(61);
        assert_eq!(table.session_count(), 0);
    }
}
