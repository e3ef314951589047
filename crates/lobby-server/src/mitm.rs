//! MITM relay directory: `{ "<name>": {"addr": "<host>", "port": <int>}, ... }`.
//!
//! Re-read from disk on every lookup (see DESIGN.md for why); a missing or
//! malformed file is treated as an empty mapping rather than a hard error.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MitmEntry {
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub port: i64,
}

pub type MitmConfig = HashMap<String, MitmEntry>;

/// Load the MITM directory from `path`. Never fails: a missing file, an
/// unreadable file, or invalid JSON all resolve to an empty mapping (logged
/// once at `warn` for the latter two).
pub fn load_mitm_config(path: &str) -> MitmConfig {
    let path = Path::new(path);
    if !path.exists() {
        return MitmConfig::new();
    }

    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            tracing::warn!(?path, %err, "failed to read MITM config");
            return MitmConfig::new();
        }
    };

    match serde_json::from_str(&data) {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!(?path, %err, "failed to parse MITM config");
            MitmConfig::new()
        }
    }
}

/// Look up a named MITM server, returning its `(addr, port)` pair.
pub fn lookup(config: &MitmConfig, name: &str) -> Option<(String, i64)> {
    config.get(name).map(|e| (e.addr.clone(), e.port))
}
