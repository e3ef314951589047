//! Ambient stack shared by the four netplay servers: `.env` loading and
//! `tracing` setup. Each binary is otherwise an independent process with no
//! shared runtime state.

use tracing_subscriber::EnvFilter;

/// Load a `.env` file from the current directory, if one exists.
///
/// Mirrors the reference Python services: a `.env` file only *supplies*
/// variables that are not already set in the process environment, so a real
/// environment variable always takes precedence over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(%err, "failed to parse .env file"),
    }
}

/// Initialize a compact `tracing` subscriber.
///
/// `RUST_LOG` overrides `default_level` when set, matching the convention
/// used across the rest of the stack's binaries.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}
