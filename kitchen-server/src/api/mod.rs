//! API routes
//!
//! - [`health`] - health check
//! - [`fleet`] - fleet view and manual reset
//! - [`orders`] - per-order detail view

pub mod fleet;
pub mod health;
pub mod orders;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(fleet::router())
        .merge(orders::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
