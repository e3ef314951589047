use clap::Parser;

/// TCP relay server configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "tcp-relay-server", about = "Netplay stateful TCP multiplexing forwarder")]
pub struct Config {
    #[arg(long, env = "TCP_RELAY_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(long, env = "TCP_RELAY_PORT", default_value_t = 55438)]
    pub port: u16,

    /// Seconds a half-open client/host_link may sit unpaired before eviction.
    #[arg(long, env = "TCP_RELAY_PENDING_TTL", default_value_t = 30)]
    pub pending_ttl_secs: u64,

    #[arg(long, env = "TCP_RELAY_MAX_SESSIONS", default_value_t = 512)]
    pub max_sessions: usize,

    #[arg(long, env = "TCP_RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
