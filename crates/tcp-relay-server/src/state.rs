//! Session/link bookkeeping, generic over the socket-holding resource types
//! so the pairing and eviction logic can be unit-tested without real sockets.
//!
//! One owner table of sessions keyed by session id, plus index tables keyed
//! by link id that carry only the owning session id. Pairing transactionally
//! removes a link id from every table at once.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::header::UNIQUE_LEN;
use crate::ids::generate_unique;

pub type SessionId = [u8; UNIQUE_LEN];
pub type LinkId = [u8; UNIQUE_LEN];

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

struct SessionEntry<W> {
    writer: W,
    #[allow(dead_code)]
    created: u64,
}

struct Pending<T> {
    resource: T,
    created: u64,
}

/// `W` is the host control connection's writer half; `C` and `H` are the
/// pending client and host-link socket resources respectively.
pub struct RelayState<W, C, H> {
    sessions: HashMap<SessionId, SessionEntry<W>>,
    clients: HashMap<LinkId, Pending<C>>,
    host_links: HashMap<LinkId, Pending<H>>,
    link_addresses: HashMap<LinkId, [u8; 16]>,
    link_to_session: HashMap<LinkId, SessionId>,
    max_sessions: usize,
}

impl<W, C, H> RelayState<W, C, H> {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            clients: HashMap::new(),
            host_links: HashMap::new(),
            link_addresses: HashMap::new(),
            link_to_session: HashMap::new(),
            max_sessions,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Register a new host, returning its freshly allocated session id, or
    /// `None` when at capacity (caller must close the connection).
    pub fn register_host(&mut self, writer: W, now: u64) -> Option<SessionId> {
        if self.sessions.len() >= self.max_sessions {
            return None;
        }
        let id = generate_unique(|candidate| self.sessions.contains_key(candidate));
        self.sessions.insert(id, SessionEntry { writer, created: now });
        Some(id)
    }

    pub fn session_writer_mut(&mut self, session_id: &SessionId) -> Option<&mut W> {
        self.sessions.get_mut(session_id).map(|e| &mut e.writer)
    }

    /// Register a new client connection for `session_id`, returning its
    /// freshly allocated link id, or `None` if the session is unknown.
    pub fn register_client(
        &mut self,
        session_id: SessionId,
        addr16: [u8; 16],
        resource: C,
        now: u64,
    ) -> Option<LinkId> {
        if !self.sessions.contains_key(&session_id) {
            return None;
        }
        let link_id = generate_unique(|candidate| self.link_to_session.contains_key(candidate));
        self.clients.insert(link_id, Pending { resource, created: now });
        self.link_addresses.insert(link_id, addr16);
        self.link_to_session.insert(link_id, session_id);
        Some(link_id)
    }

    /// Register the host's data-side connection for `link_id`. Returns
    /// `false` if `link_id` isn't associated with any session.
    pub fn register_host_link(&mut self, link_id: LinkId, resource: H, now: u64) -> bool {
        if !self.link_to_session.contains_key(&link_id) {
            return false;
        }
        self.host_links.insert(link_id, Pending { resource, created: now });
        true
    }

    /// Pair `link_id` if both sides are now present, atomically removing it
    /// from every bookkeeping table.
    pub fn try_pair(&mut self, link_id: &LinkId) -> Option<(C, H)> {
        if !(self.clients.contains_key(link_id) && self.host_links.contains_key(link_id)) {
            return None;
        }
        let client = self.clients.remove(link_id)?.resource;
        let host_link = self.host_links.remove(link_id)?.resource;
        self.link_addresses.remove(link_id);
        self.link_to_session.remove(link_id);
        Some((client, host_link))
    }

    pub fn link_address(&self, link_id: &LinkId) -> Option<[u8; 16]> {
        self.link_addresses.get(link_id).copied()
    }

    /// Tear down a session: drop it, and every link id still referencing it,
    /// returning the orphaned resources so the caller can close their
    /// sockets (and the host writer, if still present).
    pub fn teardown_session(&mut self, session_id: &SessionId) -> (Option<W>, Vec<C>, Vec<H>) {
        let writer = self.sessions.remove(session_id).map(|e| e.writer);

        let orphan_links: Vec<LinkId> = self
            .link_to_session
            .iter()
            .filter(|(_, sid)| *sid == session_id)
            .map(|(lid, _)| *lid)
            .collect();

        let mut clients = Vec::new();
        let mut host_links = Vec::new();
        for link_id in orphan_links {
            self.link_to_session.remove(&link_id);
            self.link_addresses.remove(&link_id);
            if let Some(pending) = self.clients.remove(&link_id) {
                clients.push(pending.resource);
            }
            if let Some(pending) = self.host_links.remove(&link_id) {
                host_links.push(pending.resource);
            }
        }
        (writer, clients, host_links)
    }

    /// Evict pending client/host_link entries older than `cutoff`, returning
    /// the evicted resources so their sockets can be closed. A link id that
    /// ends up present in neither table afterwards is purged entirely.
    pub fn sweep_pending(&mut self, cutoff: u64) -> (Vec<C>, Vec<H>) {
        let stale_clients: Vec<LinkId> = self
            .clients
            .iter()
            .filter(|(_, p)| p.created < cutoff)
            .map(|(id, _)| *id)
            .collect();
        let stale_host_links: Vec<LinkId> = self
            .host_links
            .iter()
            .filter(|(_, p)| p.created < cutoff)
            .map(|(id, _)| *id)
            .collect();

        let mut clients = Vec::new();
        for id in &stale_clients {
            if let Some(p) = self.clients.remove(id) {
                clients.push(p.resource);
            }
        }
        let mut host_links = Vec::new();
        for id in &stale_host_links {
            if let Some(p) = self.host_links.remove(id) {
                host_links.push(p.resource);
            }
        }

        for id in stale_clients.into_iter().chain(stale_host_links) {
            if !self.clients.contains_key(&id) && !self.host_links.contains_key(&id) {
                self.link_to_session.remove(&id);
                self.link_addresses.remove(&id);
            }
        }

        (clients, host_links)
    }

    #[cfg(test)]
    pub fn link_count(&self) -> usize {
        self.link_to_session.len()
    }
}
