//! Fleet API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::views::FleetViewState;

/// Current fleet view state
pub async fn get_fleet(State(state): State<ServerState>) -> Json<FleetViewState> {
    Json(state.fleet.current())
}

/// Manual reset
pub async fn reset(State(state): State<ServerState>) -> Json<FleetViewState> {
    Json(state.fleet.reset())
}
