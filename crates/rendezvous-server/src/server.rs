//! The UDP read loop: one socket, datagrams processed serially.

use tokio::net::UdpSocket;

use crate::protocol::{BUF_SIZE, PEER_BURST_COUNT, encode_peer, encode_wait, parse_request};
use crate::rooms::{Outcome, RoomTable, now_unix};

/// Process a single inbound datagram against `table`, sending any reply
/// through `socket`. Malformed datagrams and send failures are logged and
/// discarded, never propagated.
pub async fn handle_datagram(socket: &UdpSocket, table: &mut RoomTable, data: &[u8], from: std::net::SocketAddr) {
    let req = match parse_request(data) {
        Ok(req) => req,
        Err(err) => {
            tracing::debug!(%from, %err, "dropping malformed rendezvous datagram");
            return;
        }
    };

    match table.register(&req.room_name, req.role, from, now_unix()) {
        Ok(Outcome::Waiting) => {
            let msg = encode_wait(&req.room_name);
            if let Err(err) = socket.send_to(msg.as_bytes(), from).await {
                tracing::debug!(%from, %err, "rendezvous send failed");
            }
        }
        Ok(Outcome::Paired { host_addr, client_addr }) => {
            tracing::info!(room = %req.room_name, %host_addr, %client_addr, "rendezvous pair formed");
            let to_host = encode_peer(client_addr);
            let to_client = encode_peer(host_addr);
            for _ in 0..PEER_BURST_COUNT {
                if let Err(err) = socket.send_to(to_host.as_bytes(), host_addr).await {
                    tracing::debug!(%host_addr, %err, "rendezvous peer-burst send failed");
                }
                if let Err(err) = socket.send_to(to_client.as_bytes(), client_addr).await {
                    tracing::debug!(%client_addr, %err, "rendezvous peer-burst send failed");
                }
            }
        }
        Err(_) => {
            tracing::warn!(room = %req.room_name, %from, "rendezvous room table full, dropping");
        }
    }
}

/// Run the rendezvous server's main loop until the socket errors out.
pub async fn run(socket: UdpSocket, mut table: RoomTable) -> anyhow::Result<()> {
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        handle_datagram(&socket, &mut table, &buf[..len], from).await;
    }
}
