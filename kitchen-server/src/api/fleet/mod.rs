//! Fleet API
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/fleet | GET | Current fleet view state |
//! | /api/reset | POST | Clear the order cache, returns the new fleet state |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/fleet", get(handler::get_fleet))
        .route("/api/reset", post(handler::reset))
}
