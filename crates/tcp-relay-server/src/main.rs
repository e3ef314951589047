use clap::Parser;
use tcp_relay_server::config::Config;
use tcp_relay_server::server;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netplay_common::load_dotenv();
    let config = Config::parse();
    netplay_common::init_logging(&config.log_level);

    tracing::info!(
        bind = %config.bind,
        port = config.port,
        max_sessions = config.max_sessions,
        pending_ttl_secs = config.pending_ttl_secs,
        "tcp-relay-server starting"
    );

    let listener = TcpListener::bind(format!("{}:{}", config.bind, config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "tcp-relay-server listening");

    server::run(listener, config.max_sessions, config.pending_ttl_secs).await
}
