//! The axum `Router`: `POST /add`, `GET /list`, `GET /tunnel`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;

use crate::fields::{Fields, RawAddParams, extract_fields};
use crate::mitm::{self, MitmConfig};
use crate::registry::{Registry, now_unix};

pub struct AppState {
    pub registry: Registry,
    pub mitm_config_path: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/add", post(add))
        .route("/list", get(list))
        .route("/tunnel", get(tunnel))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found\n").into_response()
}

fn bool_str(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

/// Render the ordered plain-text subset of a room's fields for `POST /add`.
fn plain_response(id: u64, f: &Fields) -> String {
    let mut out = String::new();
    out.push_str(&format!("id={id}\n"));
    out.push_str(&format!("username={}\n", f.username));
    out.push_str(&format!("core_name={}\n", f.core_name));
    out.push_str(&format!("core_version={}\n", f.core_version));
    out.push_str(&format!("game_name={}\n", f.game_name));
    out.push_str(&format!("game_crc={}\n", f.game_crc));
    out.push_str(&format!("retroarch_version={}\n", f.retroarch_version));
    out.push_str(&format!("frontend={}\n", f.frontend));
    out.push_str(&format!("subsystem_name={}\n", f.subsystem_name));
    out.push_str(&format!("ip={}\n", f.ip));
    out.push_str(&format!("port={}\n", f.port));
    out.push_str(&format!("host_method={}\n", f.host_method.as_u8()));
    out.push_str(&format!("ggpo={}\n", bool_str(f.ggpo)));
    out.push_str(&format!("rendezvous={}\n", bool_str(f.rendezvous)));
    out.push_str(&format!("rendezvous_server={}\n", f.rendezvous_server));
    out.push_str(&format!("rendezvous_room={}\n", f.rendezvous_room));
    out.push_str(&format!("rendezvous_port={}\n", f.rendezvous_port));
    out.push_str(&format!("ggpo_relay={}\n", bool_str(f.ggpo_relay)));
    out.push_str(&format!("ggpo_relay_server={}\n", f.ggpo_relay_server));
    out.push_str(&format!("ggpo_relay_session={}\n", f.ggpo_relay_session));
    out.push_str(&format!("ggpo_relay_port={}\n", f.ggpo_relay_port));
    out.push_str(&format!("has_password={}\n", bool_str(f.has_password)));
    out.push_str(&format!(
        "has_spectate_password={}\n",
        bool_str(f.has_spectate_password)
    ));
    out.push_str(&format!("country={}\n", f.country));
    out.push_str(&format!("connectable={}\n", bool_str(f.connectable)));
    out
}

async fn add(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Form(raw): Form<RawAddParams>,
) -> Response {
    let mitm_config: MitmConfig = mitm::load_mitm_config(&state.mitm_config_path);
    let fields = extract_fields(raw, peer.ip().to_string(), |name| {
        mitm::lookup(&mitm_config, name)
    });

    match state.registry.add(fields.clone(), now_unix()) {
        Ok(id) => (StatusCode::OK, plain_response(id, &fields)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "503 Server Full\n").into_response(),
    }
}

#[derive(Serialize)]
struct RecordEnvelope {
    fields: Fields,
}

#[derive(Serialize)]
struct ListResponse {
    records: Vec<RecordEnvelope>,
}

async fn list(State(state): State<Arc<AppState>>) -> Json<ListResponse> {
    let rooms = state.registry.list(now_unix());
    Json(ListResponse {
        records: rooms
            .into_iter()
            .map(|r| RecordEnvelope { fields: r.fields })
            .collect(),
    })
}

#[derive(serde::Deserialize)]
pub struct TunnelQuery {
    name: Option<String>,
}

async fn tunnel(State(state): State<Arc<AppState>>, Query(q): Query<TunnelQuery>) -> String {
    let mitm_config = mitm::load_mitm_config(&state.mitm_config_path);
    let (addr, port) = q
        .name
        .as_deref()
        .and_then(|name| mitm::lookup(&mitm_config, name))
        .unwrap_or((String::new(), 0));
    format!("tunnel_addr={addr}\ntunnel_port={port}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            registry: Registry::new(180, 512),
            mitm_config_path: "/nonexistent/mitm_servers.json".to_string(),
        })
    }

    async fn body_string(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn peer_addr() -> SocketAddr {
        "203.0.113.9:4000".parse().unwrap()
    }

    fn with_peer(mut req: axum::http::Request<axum::body::Body>) -> axum::http::Request<axum::body::Body> {
        req.extensions_mut().insert(ConnectInfo(peer_addr()));
        req
    }

    #[tokio::test]
    async fn add_then_list_round_trips_a_room() {
        let app = router(test_state());

        let req = with_peer(
            axum::http::Request::builder()
                .method("POST")
                .uri("/add")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(axum::body::Body::from("username=alice&game_crc=deadbeef&port=55435"))
                .unwrap(),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_string(resp).await;
        assert!(text.contains("username=alice\n"));
        assert!(text.contains("game_crc=DEADBEEF\n"));
        assert!(text.contains("connectable=1\n"));

        let req = axum::http::Request::builder()
            .uri("/list")
            .body(axum::body::Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_string(resp).await;
        assert!(text.contains("\"username\":\"alice\""));
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let app = router(test_state());
        let req = axum::http::Request::builder()
            .uri("/nope")
            .body(axum::body::Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn tunnel_without_match_returns_empty_zero() {
        let app = router(test_state());
        let req = axum::http::Request::builder()
            .uri("/tunnel?name=nope")
            .body(axum::body::Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_string(resp).await;
        assert_eq!(text, "tunnel_addr=\ntunnel_port=0\n");
    }

    #[tokio::test]
    async fn registry_full_returns_503() {
        let state = Arc::new(AppState {
            registry: Registry::new(180, 1),
            mitm_config_path: "/nonexistent/mitm_servers.json".to_string(),
        });
        let app = router(state);

        for (username, expected) in [("alice", StatusCode::OK), ("bob", StatusCode::SERVICE_UNAVAILABLE)] {
            let req = with_peer(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/add")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(axum::body::Body::from(format!("username={username}&port=1")))
                    .unwrap(),
            );
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), expected);
        }
    }
}
