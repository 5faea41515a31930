//! Read-only HTTP API over a runs directory.
//!
//! | Route              | Body                          |
//! |--------------------|-------------------------------|
//! | `GET /api/runs`    | recent runs, `?limit=` (10)   |
//! | `GET /api/run/:id` | metadata, records and summary |
//! | `GET /api/stats`   | fleet statistics              |

#[path = "api/handlers.rs"]
mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::dashboard::{RunRepository, DEFAULT_FLEET_WINDOW};

pub use handlers::{handle_list_runs, handle_run_detail, handle_stats, ApiResult, RunsQuery};

/// Shared state of the API server.
#[derive(Clone)]
pub struct ServerState {
    pub repo: Arc<RunRepository>,
    pub fleet_window: usize,
}

impl ServerState {
    pub fn new(repo: RunRepository) -> Self {
        Self {
            repo: Arc::new(repo),
            fleet_window: DEFAULT_FLEET_WINDOW,
        }
    }

    pub fn fleet_window(mut self, window: usize) -> Self {
        self.fleet_window = window;
        self
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/runs", get(handle_list_runs))
        .route("/api/run/:id", get(handle_run_detail))
        .route("/api/stats", get(handle_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: ServerState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        "dashboard API listening on http://{} (runs in {})",
        listener.local_addr()?,
        state.repo.root().display()
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
#[path = "api/tests.rs"]
mod tests;
