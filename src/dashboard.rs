//! HTTP status dashboard
//!
//! `GET /status` probes the ingestion server over TCP and relays the
//! snapshot as JSON; `GET /` serves the embedded page that polls it.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::status_client::query_status;

const INDEX_PAGE: &str = include_str!("../assets/dashboard.html");

#[derive(Debug, Clone)]
struct DashboardState {
    server_addr: SocketAddr,
    probe_timeout: Duration,
}

/// Routes for a dashboard reporting on the server at `server_addr`
pub fn router(server_addr: SocketAddr, probe_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .fallback(not_found)
        .with_state(DashboardState {
            server_addr,
            probe_timeout,
        })
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn status(State(state): State<DashboardState>) -> Response {
    match query_status(state.server_addr, state.probe_timeout).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            warn!(server = %state.server_addr, error = %e, "Status probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Error connecting to the socket server" })),
            )
                .into_response()
        }
    }
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Serve the dashboard on `addr` until `shutdown` resolves
///
/// # Errors
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(
    addr: SocketAddr,
    server_addr: SocketAddr,
    probe_timeout: Duration,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard on {}", addr))?;
    info!(
        "Dashboard listening on http://{} (reporting on {})",
        listener.local_addr()?,
        server_addr
    );

    axum::serve(listener, router(server_addr, probe_timeout))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Dashboard server failed")
}
