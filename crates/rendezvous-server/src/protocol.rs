//! Wire format: ASCII, whitespace-delimited tokens.
//!
//! Request: `RNDV1 <role> <room_name>`, role one of `H`/`C`.
//! Response to an unpaired peer: `WAIT <room_name>`.
//! Pairing burst: `PEER <ip> <port>`, sent [`PEER_BURST_COUNT`] times per peer.

use std::net::SocketAddr;

use thiserror::Error;

pub const MAGIC: &str = "RNDV1";
pub const PEER_BURST_COUNT: usize = 3;
pub const ROOM_NAME_MAX: usize = 63;
pub const BUF_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Request {
    pub role: Role,
    pub room_name: String,
}

/// Every malformed-datagram case the rendezvous wire format can hit. All are
/// logged at `debug` and the datagram dropped; none are surfaced to the peer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RendezvousFrameError {
    #[error("fewer than 3 whitespace-delimited tokens")]
    TooFewTokens,
    #[error("first token is not the RNDV1 magic")]
    BadMagic,
    #[error("role token is neither H nor C")]
    UnknownRole,
    #[error("room name is empty after truncation")]
    EmptyRoomName,
}

/// Parse an inbound datagram. Invalid UTF-8 is replaced rather than
/// rejected; all other malformed shapes return a [`RendezvousFrameError`].
pub fn parse_request(datagram: &[u8]) -> Result<Request, RendezvousFrameError> {
    let text = String::from_utf8_lossy(datagram);
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(RendezvousFrameError::TooFewTokens);
    }
    if tokens[0] != MAGIC {
        return Err(RendezvousFrameError::BadMagic);
    }
    let role = match tokens[1].chars().next() {
        Some('H') => Role::Host,
        Some('C') => Role::Client,
        _ => return Err(RendezvousFrameError::UnknownRole),
    };
    let room_name = truncate_room_name(tokens[2]);
    if room_name.is_empty() {
        return Err(RendezvousFrameError::EmptyRoomName);
    }
    Ok(Request { role, room_name })
}

fn truncate_room_name(name: &str) -> String {
    if name.len() <= ROOM_NAME_MAX {
        return name.to_string();
    }
    let mut end = ROOM_NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

pub fn encode_wait(room_name: &str) -> String {
    format!("WAIT {room_name}")
}

pub fn encode_peer(addr: SocketAddr) -> String {
    format!("PEER {} {}", addr.ip(), addr.port())
}
