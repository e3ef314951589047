use clap::Parser;

/// UDP rendezvous server configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "rendezvous-server", about = "Netplay UDP hole-punching coordinator")]
pub struct Config {
    /// Bind address.
    #[arg(long, env = "RENDEZVOUS_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Bind port.
    #[arg(long, env = "RENDEZVOUS_PORT", default_value_t = 55436)]
    pub port: u16,

    /// Seconds of inactivity before a slot is cleared.
    #[arg(long, env = "RENDEZVOUS_ROOM_TIMEOUT", default_value_t = 30)]
    pub room_timeout_secs: u64,

    /// Maximum number of concurrently tracked rooms.
    #[arg(long, env = "RENDEZVOUS_MAX_ROOMS", default_value_t = 128)]
    pub max_rooms: usize,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "RENDEZVOUS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
