//! HTTP server startup and shutdown

use std::net::SocketAddr;

use crate::api;
use crate::core::{Result, ServerError, ServerState};

/// HTTP Server
pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    /// Serve until Ctrl-C, then stop background tasks
    pub async fn run(self) -> Result<()> {
        let port = self.state.config.http_port;
        let tasks = self.state.start_background_tasks();
        let app = api::router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(e.into()))?;
        tracing::info!("Kitchen server listening on {}", addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        tasks.shutdown().await;
        served.map_err(|e| ServerError::Internal(e.into()))
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down...");
}
