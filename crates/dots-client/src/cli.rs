//! The client's local CLI surface (spec §4.8): a Unix-domain-socket HTTP
//! server exposing `client-configuration`, `client-configuration-heartbeat`,
//! `client-configuration-qblock` and `client-configuration-block`. These
//! mutate the supervisor's runtime parameters only; they are never
//! forwarded to the server. Grounded on the teacher's admin HTTP server
//! shape (`crates/admin/src/lib.rs`: `AppState` + `Router` + graceful
//! shutdown via `CancellationToken`), adapted from a TCP to a Unix-socket
//! listener.

use crate::error::CliError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;

/// Runtime parameters the CLI may override, independent of the signal
/// session's own `SessionConfig` (spec §4.8: "not forwarded to the
/// server").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuntimeParams {
    /// Seconds between heartbeats.
    pub heartbeat_interval: u32,
    /// Consecutive missed heartbeats before declaring the session lost.
    pub missing_hb_allowed: u16,
    /// Q-Block2 size exponent (`SZX`) override, if set.
    pub qblock_szx: Option<u8>,
    /// Block1/Block2 size exponent (`SZX`) override, if set.
    pub block_szx: Option<u8>,
}

impl Default for RuntimeParams {
    fn default() -> Self {
        let timing = dots_model::SessionTiming::defaults();
        Self {
            heartbeat_interval: timing.heartbeat_interval,
            missing_hb_allowed: timing.missing_hb_allowed,
            qblock_szx: None,
            block_szx: None,
        }
    }
}

#[derive(Clone)]
struct AppState {
    params: Arc<RwLock<RuntimeParams>>,
}

#[derive(Deserialize)]
struct HeartbeatPatch {
    heartbeat_interval: Option<u32>,
    missing_hb_allowed: Option<u16>,
}

#[derive(Deserialize)]
struct SzxPatch {
    szx: Option<u8>,
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/client-configuration", get(show_configuration).put(replace_configuration))
        .route("/client-configuration-heartbeat", put(patch_heartbeat))
        .route("/client-configuration-qblock", put(patch_qblock))
        .route("/client-configuration-block", put(patch_block))
}

async fn show_configuration(State(state): State<AppState>) -> Json<RuntimeParams> {
    Json(*state.params.read())
}

async fn replace_configuration(
    State(state): State<AppState>,
    Json(patch): Json<RuntimeParams>,
) -> Json<RuntimeParams> {
    *state.params.write() = patch;
    Json(patch)
}

async fn patch_heartbeat(
    State(state): State<AppState>,
    Json(patch): Json<HeartbeatPatch>,
) -> Result<Json<RuntimeParams>, StatusCode> {
    let mut params = state.params.write();
    if let Some(interval) = patch.heartbeat_interval {
        if interval == 0 {
            return Err(StatusCode::BAD_REQUEST);
        }
        params.heartbeat_interval = interval;
    }
    if let Some(missing) = patch.missing_hb_allowed {
        params.missing_hb_allowed = missing;
    }
    Ok(Json(*params))
}

async fn patch_qblock(State(state): State<AppState>, Json(patch): Json<SzxPatch>) -> Json<RuntimeParams> {
    let mut params = state.params.write();
    params.qblock_szx = patch.szx;
    Json(*params)
}

async fn patch_block(State(state): State<AppState>, Json(patch): Json<SzxPatch>) -> Json<RuntimeParams> {
    let mut params = state.params.write();
    params.block_szx = patch.szx;
    Json(*params)
}

/// Runs the CLI's Unix-domain-socket HTTP server until `cancel` fires.
/// Removes a stale socket file left behind by an unclean previous
/// shutdown before binding.
pub async fn run(
    socket_path: PathBuf,
    params: Arc<RwLock<RuntimeParams>>,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    if Path::new(&socket_path).exists() {
        std::fs::remove_file(&socket_path).map_err(|e| CliError::BindFailed {
            path: socket_path.display().to_string(),
            details: format!("could not remove stale socket: {e}"),
        })?;
    }

    let listener = UnixListener::bind(&socket_path).map_err(|e| CliError::BindFailed {
        path: socket_path.display().to_string(),
        details: format!("{e}"),
    })?;

    tracing::info!(path = %socket_path.display(), "client CLI socket listening");

    let app = routes().with_state(AppState { params });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|e| CliError::ServerError { path: socket_path.display().to_string(), details: format!("{e}") })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        routes().with_state(AppState { params: Arc::new(RwLock::new(RuntimeParams::default())) })
    }

    #[tokio::test]
    async fn get_configuration_returns_defaults() {
        let response = app()
            .oneshot(Request::builder().uri("/client-configuration").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn patch_heartbeat_rejects_zero_interval() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/client-configuration-heartbeat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"heartbeat_interval":0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_qblock_sets_override() {
        let state = AppState { params: Arc::new(RwLock::new(RuntimeParams::default())) };
        let response = routes()
            .with_state(state.clone())
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/client-configuration-qblock")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"szx":6}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.params.read().qblock_szx, Some(6));
    }
}
