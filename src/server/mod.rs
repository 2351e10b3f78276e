//! HTTP control surface.
//!
//! Two routes over the coordinator: `GET /status` for a read-only snapshot
//! (available while a cycle runs) and `POST /sync` for a manual trigger.
//! Chat-bot front ends are expected to call these rather than touch the
//! coordinator directly.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::sync::{CycleCoordinator, CycleRequest, StatusSnapshot};

#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    snapshot: StatusSnapshot,
    version: &'static str,
}

async fn get_status(State(coordinator): State<Arc<CycleCoordinator>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        snapshot: coordinator.status(),
        version: env!("GIT_HASH"),
    })
}

#[derive(Serialize)]
struct SyncResponse {
    result: CycleRequest,
}

async fn post_sync(
    State(coordinator): State<Arc<CycleCoordinator>>,
) -> (StatusCode, Json<SyncResponse>) {
    let result = coordinator.request_cycle();
    let status = match result {
        CycleRequest::Accepted => StatusCode::ACCEPTED,
        CycleRequest::RejectedBusy => StatusCode::CONFLICT,
    };
    (status, Json(SyncResponse { result }))
}

pub fn make_router(coordinator: Arc<CycleCoordinator>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/sync", post(post_sync))
        .with_state(coordinator)
}

/// Serve the control surface until the process exits.
pub async fn run_control_server(coordinator: Arc<CycleCoordinator>, port: u16) -> Result<()> {
    let router = make_router(coordinator);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind control server to port {}", port))?;

    info!("Control surface listening on port {}", port);
    axum::serve(listener, router)
        .await
        .context("Control server terminated")
}
