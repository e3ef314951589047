use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use lobby_server::config::Config;
use lobby_server::http::{AppState, router};
use lobby_server::registry::Registry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netplay_common::load_dotenv();
    let config = Config::parse();
    netplay_common::init_logging(&config.log_level);

    tracing::info!(
        bind = %config.bind,
        port = config.port,
        room_ttl_secs = config.room_ttl_secs,
        max_rooms = config.max_rooms,
        "lobby-server starting"
    );

    let state = Arc::new(AppState {
        registry: Registry::new(config.room_ttl_secs, config.max_rooms),
        mitm_config_path: config.mitm_config.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "lobby-server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
