//! Accept loop, per-connection classification, and the single event-loop
//! task that owns every bookkeeping table.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, sleep};

use crate::address::encode_ip;
use crate::bridge;
use crate::events::Event;
use crate::header::{HEADER_LEN, Header, Magic};
use crate::state::{LinkId, RelayState, SessionId, now_unix};

type Relay = RelayState<OwnedWriteHalf, TcpStream, TcpStream>;

pub async fn run(listener: TcpListener, max_sessions: usize, pending_ttl_secs: u64) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let cleanup_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            sleep(Duration::from_secs(1)).await;
            if cleanup_tx.send(Event::Cleanup { now: now_unix() }).is_err() {
                break;
            }
        }
    });

    let accept_tx = tx;
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let tx = accept_tx.clone();
                    tokio::spawn(async move {
                        classify_connection(stream, peer, tx).await;
                    });
                }
                Err(err) => tracing::warn!(%err, "tcp relay accept error"),
            }
        }
    });

    let mut state: Relay = RelayState::new(max_sessions);
    while let Some(event) = rx.recv().await {
        handle_event(&mut state, event, pending_ttl_secs).await;
    }
    Ok(())
}

async fn classify_connection(mut stream: TcpStream, peer: std::net::SocketAddr, tx: mpsc::UnboundedSender<Event>) {
    let mut buf = [0u8; HEADER_LEN];
    if stream.read_exact(&mut buf).await.is_err() {
        return;
    }
    let Ok(header) = Header::decode(&buf) else {
        return;
    };

    match header.magic {
        Magic::Rats if header.unique_is_zero() => run_host(stream, tx).await,
        Magic::Rats => {
            let session_id: SessionId = header.unique;
            let _ = tx.send(Event::NewClient { session_id, peer, stream });
        }
        Magic::Ratl => {
            let link_id: LinkId = header.unique;
            let _ = tx.send(Event::NewHostLink { link_id, stream });
        }
        Magic::Rata | Magic::Ratp => {
            tracing::debug!(magic = ?header.magic, "unexpected opening magic, closing connection");
        }
    }
}

/// Split off the host's write half to the event loop, then drive its
/// control-frame read loop until EOF or error.
async fn run_host(stream: TcpStream, tx: mpsc::UnboundedSender<Event>) {
    let (mut reader, writer) = stream.into_split();

    let (respond_tx, respond_rx) = oneshot::channel();
    if tx.send(Event::NewHost { writer, respond: respond_tx }).is_err() {
        return;
    }
    let session_id = match respond_rx.await {
        Ok(Some(session_id)) => session_id,
        _ => return,
    };

    loop {
        let mut buf = [0u8; HEADER_LEN];
        if reader.read_exact(&mut buf).await.is_err() {
            break;
        }
        let Ok(header) = Header::decode(&buf) else {
            break;
        };
        if tx
            .send(Event::HostFrame { session_id, magic: header.magic, unique: header.unique })
            .is_err()
        {
            break;
        }
    }

    let _ = tx.send(Event::HostClosed { session_id });
}

async fn handle_event(state: &mut Relay, event: Event, pending_ttl_secs: u64) {
    match event {
        Event::NewHost { writer, respond } => {
            let now = now_unix();
            match state.register_host(writer, now) {
                Some(session_id) => {
                    if let Some(w) = state.session_writer_mut(&session_id) {
                        let frame = Header::new(Magic::Rats, session_id).encode();
                        if let Err(err) = w.write_all(&frame).await {
                            tracing::debug!(%err, "failed to send session id to host");
                        }
                    }
                    let _ = respond.send(Some(session_id));
                }
                None => {
                    tracing::warn!("tcp relay session cap reached, rejecting host");
                    let _ = respond.send(None);
                }
            }
        }

        Event::HostFrame { session_id, magic, unique } => match magic {
            Magic::Ratp => {}
            Magic::Rata => {
                let link_id: LinkId = unique;
                if let Some(addr16) = state.link_address(&link_id)
                    && let Some(w) = state.session_writer_mut(&session_id)
                {
                    let mut out = Vec::with_capacity(HEADER_LEN + 16);
                    out.extend_from_slice(&Header::new(Magic::Rata, link_id).encode());
                    out.extend_from_slice(&addr16);
                    if let Err(err) = w.write_all(&out).await {
                        tracing::debug!(%err, "failed to send address disclosure to host");
                    }
                }
            }
            Magic::Rats | Magic::Ratl => {
                tracing::debug!(?magic, "unexpected magic in host control frame, ignoring");
            }
        },

        Event::HostClosed { session_id } => {
            let (writer, clients, host_links) = state.teardown_session(&session_id);
            drop(writer);
            drop(clients);
            drop(host_links);
            tracing::info!(session_id = ?hex(&session_id), "tcp relay session torn down");
        }

        Event::NewClient { session_id, peer, stream } => {
            if !state.has_session(&session_id) {
                tracing::debug!(session_id = ?hex(&session_id), %peer, "client for unknown session, closing");
                return;
            }
            let addr16 = encode_ip(peer.ip());
            let Some(link_id) = state.register_client(session_id, addr16, stream, now_unix()) else {
                return;
            };
            if let Some(w) = state.session_writer_mut(&session_id) {
                let frame = Header::new(Magic::Ratl, link_id).encode();
                if let Err(err) = w.write_all(&frame).await {
                    tracing::debug!(%err, "failed to notify host of new link");
                }
            }
            maybe_pair(state, &link_id);
        }

        Event::NewHostLink { link_id, stream } => {
            if !state.register_host_link(link_id, stream, now_unix()) {
                tracing::debug!(link_id = ?hex(&link_id), "host_link for unknown link id, closing");
                return;
            }
            maybe_pair(state, &link_id);
        }

        Event::Cleanup { now } => {
            let cutoff = now.saturating_sub(pending_ttl_secs);
            let (clients, host_links) = state.sweep_pending(cutoff);
            if !clients.is_empty() || !host_links.is_empty() {
                tracing::debug!(
                    evicted_clients = clients.len(),
                    evicted_host_links = host_links.len(),
                    "tcp relay pending connection cleanup"
                );
            }
        }
    }
}

fn maybe_pair(state: &mut Relay, link_id: &LinkId) {
    if let Some((client, host_link)) = state.try_pair(link_id) {
        tokio::spawn(bridge::run(client, host_link));
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
