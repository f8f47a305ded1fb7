//! Fleet view - every order's latest event, grouped by shelf
//!
//! ```text
//! SyncMonitor::cycles() ──┐
//!                         ├─ combine_latest ─► derive_fleet_state ─► FleetView (watch)
//! store.watch_latest() ───┘
//! ```
//!
//! The view stays `Loading` until the first sync cycle completes. After
//! that it re-derives on every cycle and on every store change.

use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use shared::order::{FleetSnapshot, OrderEvent, aggregate};
use shared::util::format_cents;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::combine::combine_latest;
use crate::orders::{OrderStorage, StorageResult, SyncMonitor};

/// Fleet view state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum FleetViewState {
    Loading,
    /// No orders at all, distinct from a snapshot with zero statistics
    Empty,
    /// The latest-per-order query failed
    Error,
    Success(FleetSnapshot),
}

/// Map one latest-per-order query result to a view state
pub fn derive_fleet_state(latest: &StorageResult<Vec<OrderEvent>>) -> FleetViewState {
    match latest {
        Err(e) => {
            tracing::error!(error = %e, "Fleet query failed");
            FleetViewState::Error
        }
        Ok(latest) if latest.is_empty() => FleetViewState::Empty,
        Ok(latest) => FleetViewState::Success(aggregate(latest)),
    }
}

/// Stream of fleet states, one per sync cycle or store change
pub fn fleet_updates(
    monitor: &SyncMonitor,
    storage: &OrderStorage,
) -> BoxStream<'static, FleetViewState> {
    combine_latest(monitor.cycles(), storage.watch_latest(), |_cycle, latest| {
        derive_fleet_state(latest)
    })
    .boxed()
}

/// Current fleet state plus the manual reset action
#[derive(Clone)]
pub struct FleetView {
    state: Arc<watch::Sender<FleetViewState>>,
    /// Reset generation; held while publishing so a reset and an update never interleave
    resets: Arc<Mutex<u64>>,
    storage: OrderStorage,
    monitor: SyncMonitor,
}

impl FleetView {
    pub fn new(storage: OrderStorage, monitor: SyncMonitor) -> Self {
        let (state, _) = watch::channel(FleetViewState::Loading);
        Self {
            state: Arc::new(state),
            resets: Arc::new(Mutex::new(0)),
            storage,
            monitor,
        }
    }

    fn reset_generation(&self) -> MutexGuard<'_, u64> {
        self.resets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state
    pub fn current(&self) -> FleetViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FleetViewState> {
        self.state.subscribe()
    }

    fn publish(&self, state: FleetViewState) {
        self.state.send_replace(state);
    }

    /// Drive the view until shutdown
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("FleetView listener started");
        let mut updates = fleet_updates(&self.monitor, &self.storage);

        loop {
            let seen = *self.reset_generation();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = updates.next() => match next {
                    Some(state) => self.apply_update(state, seen),
                    None => {
                        tracing::warn!("Fleet update stream ended");
                        break;
                    }
                },
            }
        }

        tracing::info!("FleetView listener stopped");
    }

    /// Publish one update from the driver
    ///
    /// An update that was in flight across a reset may predate the clear,
    /// so it is replaced by a fresh query of the store.
    fn apply_update(&self, state: FleetViewState, seen: u64) {
        let generation = self.reset_generation();
        let state = if *generation == seen {
            state
        } else {
            tracing::debug!("Dropping fleet update from before reset");
            derive_fleet_state(&self.storage.latest_per_order())
        };

        if let FleetViewState::Success(snapshot) = &state {
            tracing::debug!(
                orders = snapshot.order_count(),
                revenue = %format_cents(snapshot.statistics.total_revenue_cents),
                "Fleet view updated"
            );
        }
        self.publish(state);
    }

    /// Manual reset: back to `Loading`, then clear the event store
    ///
    /// The next store emission (the now empty latest set) moves the view on.
    /// A failing clear leaves the view in `Error` until the next update.
    pub fn reset(&self) -> FleetViewState {
        tracing::info!("Resetting fleet view");
        let mut generation = self.reset_generation();
        self.publish(FleetViewState::Loading);
        let cleared = self.storage.clear_all();
        *generation += 1;
        drop(generation);

        self.finish_reset(cleared)
    }

    fn finish_reset(&self, cleared: StorageResult<()>) -> FleetViewState {
        if let Err(e) = cleared {
            tracing::error!(error = %e, "Failed to clear order events");
            self.publish(FleetViewState::Error);
        }
        self.current()
    }
}
