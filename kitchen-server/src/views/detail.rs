//! Detail view - one order's history and changelog

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use shared::order::{ChangelogEntry, OrderEvent, build_changelog};

use crate::orders::{OrderStorage, StorageResult};

/// Everything known about one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    /// Most recent event (last of `history`)
    pub current_order: OrderEvent,
    /// All events, ascending by timestamp
    pub history: Vec<OrderEvent>,
    /// Transitions, most recent first
    pub changelog: Vec<ChangelogEntry>,
}

/// Detail view state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum DetailViewState {
    Loading,
    /// No events for this order id, or the history query failed
    NotFound,
    Success(OrderDetail),
}

/// Map one history query result to a view state
pub fn derive_detail_state(history: StorageResult<Vec<OrderEvent>>) -> DetailViewState {
    let history = match history {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(error = %e, "Order history query failed");
            return DetailViewState::NotFound;
        }
    };

    match history.last().cloned() {
        None => DetailViewState::NotFound,
        Some(current_order) => DetailViewState::Success(OrderDetail {
            current_order,
            changelog: build_changelog(&history),
            history,
        }),
    }
}

/// `Loading`, then a fresh state after every change touching the order
pub fn detail_updates(
    storage: &OrderStorage,
    order_id: impl Into<String>,
) -> BoxStream<'static, DetailViewState> {
    stream::once(async { DetailViewState::Loading })
        .chain(storage.watch_history(order_id).map(derive_detail_state))
        .boxed()
}

/// One-shot state for request/response consumers
pub fn detail_snapshot(storage: &OrderStorage, order_id: &str) -> DetailViewState {
    derive_detail_state(storage.history_of(order_id))
}
