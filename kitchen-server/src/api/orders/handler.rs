//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::util::{format_cents, format_timestamp};

use crate::core::{Result, ServerError, ServerState};
use crate::views::{DetailViewState, detail_snapshot};

/// Detail view of one order; 404 when the order has no events
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<DetailViewState>> {
    match detail_snapshot(&state.storage, &id) {
        DetailViewState::NotFound => Err(ServerError::NotFound(format!("order {}", id))),
        DetailViewState::Success(detail) => {
            tracing::debug!(
                order_id = %id,
                state = %detail.current_order.state,
                price = %format_cents(detail.current_order.price_cents),
                updated = %format_timestamp(detail.current_order.timestamp),
                "Order detail served"
            );
            Ok(Json(DetailViewState::Success(detail)))
        }
        DetailViewState::Loading => Ok(Json(DetailViewState::Loading)),
    }
}
