//! Room payload: the hosting metadata carried by a lobby advertisement.

use serde::{Deserialize, Serialize, Serializer};

/// How a peer should be reached: direct connection, UPnP-forwarded, or MITM relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMethod {
    Unknown,
    Manual,
    /// Reserved: no code path currently emits this. See DESIGN.md.
    Upnp,
    Mitm,
}

impl HostMethod {
    pub fn as_u8(self) -> u8 {
        match self {
            HostMethod::Unknown => 0,
            HostMethod::Manual => 1,
            HostMethod::Upnp => 2,
            HostMethod::Mitm => 3,
        }
    }
}

impl Serialize for HostMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Raw form body accepted by `POST /add`. Every field is optional on the
/// wire; missing values default to an empty string (and, downstream, to `0`
/// or `false` for numeric/boolean fields).
#[derive(Debug, Deserialize, Default)]
pub struct RawAddParams {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub core_name: String,
    #[serde(default)]
    pub core_version: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub game_crc: String,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub retroarch_version: String,
    #[serde(default)]
    pub frontend: String,
    #[serde(default)]
    pub subsystem_name: String,
    #[serde(default)]
    pub player_count: Option<String>,
    #[serde(default)]
    pub spectator_count: Option<String>,
    #[serde(default)]
    pub has_password: Option<String>,
    #[serde(default)]
    pub has_spectate_password: Option<String>,
    #[serde(default)]
    pub ggpo: Option<String>,
    #[serde(default)]
    pub rendezvous: Option<String>,
    #[serde(default)]
    pub rendezvous_server: String,
    #[serde(default)]
    pub rendezvous_room: String,
    #[serde(default)]
    pub rendezvous_port: Option<String>,
    #[serde(default)]
    pub ggpo_relay: Option<String>,
    /// Legacy alias for `ggpo_relay`; `ggpo_relay` wins if both are present.
    #[serde(default)]
    pub use_ggpo_relay: Option<String>,
    #[serde(default)]
    pub ggpo_relay_server: String,
    #[serde(default)]
    pub ggpo_relay_session: String,
    #[serde(default)]
    pub ggpo_relay_port: Option<String>,
    #[serde(default)]
    pub mitm_server: String,
    #[serde(default)]
    pub mitm_custom_addr: String,
    #[serde(default)]
    pub mitm_custom_port: Option<String>,
    #[serde(default)]
    pub mitm_session: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub force_mitm: Option<String>,
}

/// The fully-resolved, server-derived fields of a room advertisement.
///
/// Serialized verbatim (all fields, native JSON types) for `GET /list`; only
/// a subset is rendered for the `POST /add` plain-text response (see
/// [`crate::http::plain_response`]).
#[derive(Debug, Clone, Serialize)]
pub struct Fields {
    pub username: String,
    pub core_name: String,
    pub core_version: String,
    pub game_name: String,
    pub game_crc: String,
    pub port: i64,
    pub retroarch_version: String,
    pub frontend: String,
    pub subsystem_name: String,
    pub player_count: i64,
    pub spectator_count: i64,
    pub has_password: bool,
    pub has_spectate_password: bool,
    pub ggpo: bool,
    pub rendezvous: bool,
    pub rendezvous_server: String,
    pub rendezvous_room: String,
    pub rendezvous_port: i64,
    pub ggpo_relay: bool,
    pub ggpo_relay_server: String,
    pub ggpo_relay_session: String,
    pub ggpo_relay_port: i64,
    pub mitm_server: String,
    pub mitm_ip: String,
    pub mitm_port: i64,
    pub mitm_session: String,
    pub ip: String,
    pub host_method: HostMethod,
    pub country: String,
    pub connectable: bool,
    pub is_retroarch: bool,
}

fn coerce_bool(value: Option<&str>) -> bool {
    match value {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => false,
    }
}

fn coerce_int(value: Option<&str>, default: i64) -> i64 {
    match value {
        Some(v) if !v.is_empty() => v.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn coerce_hex(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

/// Resolve the MITM relay address/port for a submitted room, following the
/// precedence: explicit custom address > named MITM server lookup > empty.
pub fn resolve_mitm(
    raw: &RawAddParams,
    lookup: impl Fn(&str) -> Option<(String, i64)>,
) -> (String, i64) {
    if !raw.mitm_custom_addr.is_empty() {
        return (
            raw.mitm_custom_addr.clone(),
            coerce_int(raw.mitm_custom_port.as_deref(), 0),
        );
    }
    if !raw.mitm_server.is_empty()
        && let Some((addr, port)) = lookup(&raw.mitm_server)
    {
        return (addr, port);
    }
    (String::new(), 0)
}

/// Build the server-derived [`Fields`] from a raw form body.
///
/// `client_ip` is the connecting socket's address; any `ip` submitted in the
/// form is ignored, per the spec.
pub fn extract_fields(
    raw: RawAddParams,
    client_ip: String,
    mitm_lookup: impl Fn(&str) -> Option<(String, i64)>,
) -> Fields {
    let force_mitm = coerce_bool(raw.force_mitm.as_deref());
    let host_method = if force_mitm {
        HostMethod::Mitm
    } else {
        HostMethod::Manual
    };

    let (mitm_ip, mitm_port) = resolve_mitm(&raw, mitm_lookup);

    // ggpo_relay wins over the legacy use_ggpo_relay alias when both are set.
    let ggpo_relay = coerce_bool(raw.ggpo_relay.as_deref().or(raw.use_ggpo_relay.as_deref()));

    Fields {
        username: raw.username,
        core_name: raw.core_name,
        core_version: raw.core_version,
        game_name: raw.game_name,
        game_crc: coerce_hex(&raw.game_crc),
        port: coerce_int(raw.port.as_deref(), 0),
        retroarch_version: raw.retroarch_version,
        frontend: raw.frontend,
        subsystem_name: raw.subsystem_name,
        player_count: coerce_int(raw.player_count.as_deref(), 0),
        spectator_count: coerce_int(raw.spectator_count.as_deref(), 0),
        has_password: coerce_bool(raw.has_password.as_deref()),
        has_spectate_password: coerce_bool(raw.has_spectate_password.as_deref()),
        ggpo: coerce_bool(raw.ggpo.as_deref()),
        rendezvous: coerce_bool(raw.rendezvous.as_deref()),
        rendezvous_server: raw.rendezvous_server,
        rendezvous_room: raw.rendezvous_room,
        rendezvous_port: coerce_int(raw.rendezvous_port.as_deref(), 0),
        ggpo_relay,
        ggpo_relay_server: raw.ggpo_relay_server,
        ggpo_relay_session: raw.ggpo_relay_session,
        ggpo_relay_port: coerce_int(raw.ggpo_relay_port.as_deref(), 0),
        mitm_server: raw.mitm_server,
        mitm_ip,
        mitm_port,
        mitm_session: raw.mitm_session,
        ip: client_ip,
        host_method,
        country: raw.country,
        connectable: true,
        is_retroarch: true,
    }
}

/// The natural key used to deduplicate rooms: `ip:port:username:game_crc`.
pub fn natural_key(fields: &Fields) -> String {
    format!(
        "{}:{}:{}:{}",
        fields.ip, fields.port, fields.username, fields.game_crc
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawAddParams {
        RawAddParams::default()
    }

    #[test]
    fn game_crc_is_normalized_to_uppercase_hex() {
        let mut r = raw();
        r.game_crc = "ab12cd34".to_string();
        let f = extract_fields(r, "10.0.0.5".to_string(), |_| None);
        assert_eq!(f.game_crc, "AB12CD34");
    }

    #[test]
    fn force_mitm_selects_mitm_host_method() {
        let mut r = raw();
        r.force_mitm = Some("true".to_string());
        let f = extract_fields(r, "1.2.3.4".to_string(), |_| None);
        assert_eq!(f.host_method, HostMethod::Mitm);
        assert_eq!(f.host_method.as_u8(), 3);
    }

    #[test]
    fn default_host_method_is_manual() {
        let f = extract_fields(raw(), "1.2.3.4".to_string(), |_| None);
        assert_eq!(f.host_method, HostMethod::Manual);
    }

    #[test]
    fn legacy_use_ggpo_relay_alias_is_honored() {
        let mut r = raw();
        r.use_ggpo_relay = Some("1".to_string());
        let f = extract_fields(r, "1.2.3.4".to_string(), |_| None);
        assert!(f.ggpo_relay);
    }

    #[test]
    fn ggpo_relay_wins_when_both_keys_present() {
        let mut r = raw();
        r.ggpo_relay = Some("0".to_string());
        r.use_ggpo_relay = Some("1".to_string());
        let f = extract_fields(r, "1.2.3.4".to_string(), |_| None);
        assert!(!f.ggpo_relay);
    }

    #[test]
    fn mitm_custom_addr_takes_precedence_over_named_lookup() {
        let mut r = raw();
        r.mitm_custom_addr = "1.1.1.1".to_string();
        r.mitm_custom_port = Some("9999".to_string());
        r.mitm_server = "alpha".to_string();
        let f = extract_fields(r, "1.2.3.4".to_string(), |name| {
            assert_eq!(name, "alpha");
            Some(("2.2.2.2".to_string(), 8888))
        });
        assert_eq!(f.mitm_ip, "1.1.1.1");
        assert_eq!(f.mitm_port, 9999);
    }

    #[test]
    fn natural_key_combines_ip_port_username_crc() {
        let mut r = raw();
        r.username = "alice".to_string();
        r.game_crc = "deadbeef".to_string();
        r.port = Some("55435".to_string());
        let f = extract_fields(r, "10.0.0.5".to_string(), |_| None);
        assert_eq!(natural_key(&f), "10.0.0.5:55435:alice:DEADBEEF");
    }

    #[test]
    fn boolean_coercion_accepts_common_truthy_spellings() {
        for v in ["1", "true", "TRUE", "yes", "On"] {
            let mut r = raw();
            r.ggpo = Some(v.to_string());
            let f = extract_fields(r, "1.2.3.4".to_string(), |_| None);
            assert!(f.ggpo, "{v} should be truthy");
        }
        let mut r = raw();
        r.ggpo = Some("nope".to_string());
        let f = extract_fields(r, "1.2.3.4".to_string(), |_| None);
        assert!(!f.ggpo);
    }
}
