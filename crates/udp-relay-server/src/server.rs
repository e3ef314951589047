//! The UDP read loop: 1 s receive timeout used to drive periodic pruning.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::protocol::{
    Frame, encode_busy, encode_err, encode_full, encode_ok, encode_pong, encode_ready, encode_wait,
    parse_frame,
};
use crate::sessions::{HelloResult, SessionTable, now_unix};

pub async fn handle_datagram(
    socket: &UdpSocket,
    table: &mut SessionTable,
    magic: &str,
    data: &[u8],
    from: SocketAddr,
) {
    let now = now_unix();
    match parse_frame(magic, data) {
        Frame::Hello { session_id, slot } => {
            let reply = match table.hello(session_id, slot, from, now) {
                HelloResult::Waiting { slot } => encode_wait(magic, session_id, slot),
                HelloResult::Ready { slot } => encode_ready(magic, session_id, slot),
                HelloResult::Full => encode_full(magic, session_id),
                HelloResult::Busy => encode_busy(magic, session_id),
                HelloResult::BadSlot => encode_err(magic, session_id, "bad_slot"),
            };
            send(socket, reply.as_bytes(), from).await;
        }
        Frame::Bye { session_id } => {
            table.bye(from);
            send(socket, encode_ok(magic, session_id).as_bytes(), from).await;
        }
        Frame::Ping { session_id } => {
            table.ping(from, now);
            send(socket, encode_pong(magic, session_id).as_bytes(), from).await;
        }
        Frame::UnknownCommand { session_id } => {
            send(socket, encode_err(magic, session_id, "unknown_command").as_bytes(), from).await;
        }
        Frame::Data => {
            if let Some(target) = table.forward_target(from, now) {
                send(socket, data, target).await;
            }
        }
    }
}

async fn send(socket: &UdpSocket, data: &[u8], to: SocketAddr) {
    if let Err(err) = socket.send_to(data, to).await {
        tracing::debug!(%to, %err, "udp relay send failed");
    }
}

pub async fn run(socket: UdpSocket, mut table: SessionTable, magic: String, max_packet: usize) -> anyhow::Result<()> {
    let mut buf = vec![0u8; max_packet];
    loop {
        match tokio::time::timeout(Duration::from_secs(1), socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => {
                handle_datagram(&socket, &mut table, &magic, &buf[..len], from).await;
            }
            Ok(Err(err)) => {
                tracing::warn!(%err, "udp relay recv error");
            }
            Err(_timeout) => {
                table.prune(now_unix());
            }
        }
    }
}
