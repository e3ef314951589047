use clap::Parser;
use rendezvous_server::config::Config;
use rendezvous_server::rooms::RoomTable;
use rendezvous_server::server;
use tokio::net::UdpSocket;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netplay_common::load_dotenv();
    let config = Config::parse();
    netplay_common::init_logging(&config.log_level);

    tracing::info!(
        bind = %config.bind,
        port = config.port,
        room_timeout_secs = config.room_timeout_secs,
        max_rooms = config.max_rooms,
        "rendezvous-server starting"
    );

    let socket = UdpSocket::bind(format!("{}:{}", config.bind, config.port)).await?;
    tracing::info!(addr = %socket.local_addr()?, "rendezvous-server listening");

    let table = RoomTable::new(config.room_timeout_secs, config.max_rooms);
    server::run(socket, table).await
}
