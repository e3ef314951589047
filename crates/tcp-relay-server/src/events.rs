use std::net::SocketAddr;

use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::oneshot;

use crate::header::Magic;
use crate::state::{LinkId, SessionId};

/// Messages the per-connection tasks and the cleanup ticker send to the
/// single event-loop task that owns all relay state.
pub enum Event {
    NewHost {
        writer: OwnedWriteHalf,
        respond: oneshot::Sender<Option<SessionId>>,
    },
    HostFrame {
        session_id: SessionId,
        magic: Magic,
        unique: [u8; 12],
    },
    HostClosed {
        session_id: SessionId,
    },
    NewClient {
        session_id: SessionId,
        peer: SocketAddr,
        stream: TcpStream,
    },
    NewHostLink {
        link_id: LinkId,
        stream: TcpStream,
    },
    Cleanup {
        now: u64,
    },
}
