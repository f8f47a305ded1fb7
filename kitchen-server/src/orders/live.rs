//! Live queries over the event store
//!
//! A live query is a stream that yields the query result immediately, then
//! a fresh result after every relevant committed change. Each result comes
//! from a single read transaction, so it always reflects whole batches.
//!
//! ```text
//! subscribe ──► query ──► emit ──► wait for relevant StoreChange ──┐
//!                 ▲                                                │
//!                 └────────────────────────────────────────────────┘
//! ```
//!
//! A subscriber that falls behind the change channel (`Lagged`) re-queries
//! instead of replaying, which is always correct because results are
//! snapshots rather than deltas.

use futures::stream::{self, BoxStream, StreamExt};
use shared::order::OrderEvent;
use tokio::sync::broadcast;

use super::storage::{OrderStorage, StorageResult, StoreChange};

/// Stream of query snapshots
pub type LiveQuery<T> = BoxStream<'static, StorageResult<T>>;

struct LiveState<Q, F> {
    storage: OrderStorage,
    changes: broadcast::Receiver<StoreChange>,
    query: Q,
    relevant: F,
    primed: bool,
}

impl<Q, F> LiveState<Q, F>
where
    F: Fn(&StoreChange) -> bool,
{
    /// Wait until the query must re-run; `false` once the store is gone
    async fn next_relevant_change(&mut self) -> bool {
        loop {
            match self.changes.recv().await {
                Ok(change) if (self.relevant)(&change) => return true,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Live query lagged, re-querying");
                    return true;
                }
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }
}

fn live_query<T, Q, F>(storage: &OrderStorage, query: Q, relevant: F) -> LiveQuery<T>
where
    T: Send + 'static,
    Q: Fn(&OrderStorage) -> StorageResult<T> + Send + 'static,
    F: Fn(&StoreChange) -> bool + Send + 'static,
{
    // Subscribe before the first query so no commit slips in between
    let state = LiveState {
        storage: storage.clone(),
        changes: storage.subscribe(),
        query,
        relevant,
        primed: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.primed && !state.next_relevant_change().await {
            return None;
        }
        state.primed = true;
        let result = (state.query)(&state.storage);
        Some((result, state))
    })
    .boxed()
}

impl OrderStorage {
    /// Live latest-per-order set, re-emitted on every change
    pub fn watch_latest(&self) -> LiveQuery<Vec<OrderEvent>> {
        live_query(self, OrderStorage::latest_per_order, |_| true)
    }

    /// Live history of one order, re-emitted on changes touching it
    pub fn watch_history(&self, order_id: impl Into<String>) -> LiveQuery<Vec<OrderEvent>> {
        let order_id = order_id.into();
        let filter_id = order_id.clone();
        live_query(
            self,
            move |storage| storage.history_of(&order_id),
            move |change| change.touches(&filter_id),
        )
    }
}
