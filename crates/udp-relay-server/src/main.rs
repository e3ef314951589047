use clap::Parser;
use tokio::net::UdpSocket;
use udp_relay_server::config::Config;
use udp_relay_server::server;
use udp_relay_server::sessions::SessionTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netplay_common::load_dotenv();
    let config = Config::parse();
    netplay_common::init_logging(&config.log_level);

    tracing::info!(
        bind = %config.bind,
        port = config.port,
        max_sessions = config.max_sessions,
        max_packet = config.max_packet,
        magic = %config.magic,
        "udp-relay-server starting"
    );

    let socket = UdpSocket::bind(format!("{}:{}", config.bind, config.port)).await?;
    tracing::info!(addr = %socket.local_addr()?, "udp-relay-server listening");

    let table = SessionTable::new(config.session_ttl_secs, config.client_ttl_secs, config.max_sessions);
    server::run(socket, table, config.magic, config.max_packet).await
}
