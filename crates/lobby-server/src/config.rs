use clap::Parser;

/// Lobby registry configuration.
///
/// Every field can be set via CLI flag, environment variable, or falls back
/// to the compiled-in default (`.env` is loaded before parsing, so a `.env`
/// file works too — a real environment variable always wins over it).
#[derive(Parser, Debug, Clone)]
#[command(name = "lobby-server", about = "RetroArch-style netplay lobby registry")]
pub struct Config {
    /// Bind address.
    #[arg(long, env = "LOBBY_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Bind port.
    #[arg(long, env = "LOBBY_PORT", default_value_t = 55435)]
    pub port: u16,

    /// Seconds of inactivity before a room is evicted.
    #[arg(long, env = "LOBBY_ROOM_TTL", default_value_t = 180)]
    pub room_ttl_secs: u64,

    /// Maximum number of concurrently registered rooms.
    #[arg(long, env = "LOBBY_MAX_ROOMS", default_value_t = 512)]
    pub max_rooms: usize,

    /// Path to the MITM relay directory (re-read on every lookup).
    #[arg(long, env = "LOBBY_MITM_CONFIG", default_value = "mitm_servers.json")]
    pub mitm_config: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOBBY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
