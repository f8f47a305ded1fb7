//! Order API
//!
//! Read-only access to one order's history and changelog.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/orders/{id}", get(handler::get_by_id))
}
