//! Pumps bytes between a paired client and host-link socket.

use tokio::io::{self, AsyncWriteExt};
use tokio::net::TcpStream;

/// Race both copy directions and cancel whichever is still running the
/// moment the other exits, then close both sockets. Unlike
/// `copy_bidirectional` (which lets each direction run to its own EOF), the
/// first direction to finish tears down the whole bridge.
pub async fn run(mut client: TcpStream, mut host_link: TcpStream) {
    let (mut client_read, mut client_write) = client.split();
    let (mut host_read, mut host_write) = host_link.split();

    let client_to_host = io::copy(&mut client_read, &mut host_write);
    let host_to_client = io::copy(&mut host_read, &mut client_write);

    tokio::select! {
        res = client_to_host => {
            tracing::debug!(?res, "tcp relay bridge closed, client to host_link direction finished first");
        }
        res = host_to_client => {
            tracing::debug!(?res, "tcp relay bridge closed, host_link to client direction finished first");
        }
    }

    let _ = client.shutdown().await;
    let _ = host_link.shutdown().await;
}
