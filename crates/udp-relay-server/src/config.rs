use clap::Parser;

/// UDP relay server configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "udp-relay-server", about = "Netplay stateful UDP forwarder")]
pub struct Config {
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(long, env = "RELAY_PORT", default_value_t = 55437)]
    pub port: u16,

    /// Seconds a session may sit with both slots empty before eviction.
    #[arg(long, env = "RELAY_SESSION_TTL", default_value_t = 60)]
    pub session_ttl_secs: u64,

    /// Seconds a slot may go without a PING/DATA/HELLO before it's cleared.
    #[arg(long, env = "RELAY_CLIENT_TTL", default_value_t = 30)]
    pub client_ttl_secs: u64,

    #[arg(long, env = "RELAY_MAX_SESSIONS", default_value_t = 512)]
    pub max_sessions: usize,

    #[arg(long, env = "RELAY_MAX_PACKET", default_value_t = 8192)]
    pub max_packet: usize,

    /// ASCII magic token prefixing every control frame. No whitespace.
    #[arg(long, env = "RELAY_MAGIC", default_value = "RARELAY1")]
    pub magic: String,

    #[arg(long, env = "RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
