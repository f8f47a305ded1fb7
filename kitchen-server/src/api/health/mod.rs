//! Health check route
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /health | GET | Store size, last sync cycle, background tasks |
//!
//! `status` is `ok`, `degraded` when a background task is no longer
//! running, or `error` when the store cannot be read.
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "uptime_seconds": 42,
//!   "event_count": 128,
//!   "last_sync": { "cycle": 21, "completed_at": 1700000000000, "outcome": { "result": "merged", "received": 6, "stored": 6 } },
//!   "tasks": [{ "name": "sync_loop", "kind": "worker", "status": "running" }]
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::{ServerState, TaskReport};
use crate::orders::SyncCycle;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded | error
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_count: Option<u64>,
    /// `None` until the first sync cycle completes
    last_sync: Option<SyncCycle>,
    tasks: Vec<TaskReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let failed = state.tasks.failed();
    let (status, event_count, message) = match state.storage.event_count() {
        Err(e) => ("error", None, Some(e.to_string())),
        Ok(count) if !failed.is_empty() => {
            let names: Vec<_> = failed.iter().map(|t| t.name).collect();
            let message = format!("background tasks not running: {}", names.join(", "));
            ("degraded", Some(count), Some(message))
        }
        Ok(count) => ("ok", Some(count), None),
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        event_count,
        last_sync: state.monitor.last(),
        tasks: state.tasks.reports(),
        message,
    })
}
