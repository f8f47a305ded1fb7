//! SyncLoop - background poller that keeps the event store fresh
//!
//! ```text
//!        ┌────────────────────────────────────────────────────────────┐
//!        ▼                                                            │
//! [cancelled?] ─no─► fetch ─ok─► normalize ─► upsert_batch ─┐         │
//!      │               │                                    ▼         │
//!     yes              └─err─────────────────────► record SyncCycle ──┴─ sleep(poll_interval)
//!      ▼
//!    stop
//! ```
//!
//! Failures never stop the loop and never touch cached data: the cycle is
//! recorded as failed, the store keeps serving its last good contents, and
//! the next cycle runs after the usual delay. Cancellation is raced against
//! both suspension points (fetch and delay). The merge itself is one atomic
//! write transaction and is never interrupted.

use futures::stream::{BoxStream, StreamExt};
use kitchen_client::{ClientError, OrderEventSource};
use serde::Serialize;
use shared::order::{RawOrderEvent, normalize_batch};
use shared::util::now_millis;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

use super::storage::{OrderStorage, StorageError};

/// Default delay between two cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// Default upper bound for a single fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Sync loop timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Delay after each cycle, successful or not
    pub poll_interval: Duration,
    /// Per-fetch timeout; `None` lets a hung fetch delay the next cycle
    pub fetch_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }
}

/// Errors of a single sync cycle
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] ClientError),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Fetch succeeded; `stored` rows were written (0 for an empty batch)
    Merged { received: usize, stored: usize },
    FetchFailed { error: String },
    StoreFailed { error: String },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Merged { .. })
    }
}

/// "Cycle complete" signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncCycle {
    /// 1-based cycle counter
    pub cycle: u64,
    /// Unix millis when the cycle finished
    pub completed_at: i64,
    pub outcome: CycleOutcome,
}

/// Lifecycle of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Cancelled,
}

/// Publishes the last completed cycle to any number of observers
///
/// Late subscribers immediately see the most recent cycle.
#[derive(Debug, Clone)]
pub struct SyncMonitor {
    tx: Arc<watch::Sender<Option<SyncCycle>>>,
}

impl SyncMonitor {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Record a completed cycle
    pub fn record(&self, cycle: SyncCycle) {
        self.tx.send_replace(Some(cycle));
    }

    /// Last completed cycle, if any
    pub fn last(&self) -> Option<SyncCycle> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SyncCycle>> {
        self.tx.subscribe()
    }

    /// Stream of completed cycles, starting with the last one if present
    pub fn cycles(&self) -> BoxStream<'static, SyncCycle> {
        WatchStream::new(self.subscribe())
            .filter_map(|cycle| async move { cycle })
            .boxed()
    }
}

impl Default for SyncMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Background worker: fetch → normalize → merge → signal → wait
pub struct SyncLoop {
    source: Arc<dyn OrderEventSource>,
    storage: OrderStorage,
    config: SyncConfig,
    monitor: SyncMonitor,
    shutdown: CancellationToken,
    cycle: u64,
}

impl SyncLoop {
    pub fn new(
        source: Arc<dyn OrderEventSource>,
        storage: OrderStorage,
        config: SyncConfig,
        monitor: SyncMonitor,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            source,
            storage,
            config,
            monitor,
            shutdown,
            cycle: 0,
        }
    }

    pub fn status(&self) -> SyncStatus {
        if self.shutdown.is_cancelled() {
            SyncStatus::Cancelled
        } else {
            SyncStatus::Running
        }
    }

    /// Run until cancelled
    pub async fn run(mut self) {
        tracing::info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "SyncLoop started"
        );

        while self.status() == SyncStatus::Running {
            if self.run_cycle().await.is_none() {
                break;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!(cycles = self.cycle, "SyncLoop stopped");
    }

    /// Run one cycle and publish its outcome
    ///
    /// Returns `None` when cancellation interrupted the fetch; nothing is
    /// merged or recorded in that case.
    pub async fn run_cycle(&mut self) -> Option<SyncCycle> {
        let fetched = tokio::select! {
            _ = self.shutdown.cancelled() => {
                tracing::debug!("Fetch abandoned on shutdown");
                return None;
            }
            result = self.fetch() => result,
        };

        let outcome = match fetched {
            Err(e) => {
                tracing::warn!(error = %e, "Order event fetch failed, serving cached data");
                CycleOutcome::FetchFailed {
                    error: e.to_string(),
                }
            }
            Ok(raw) => match self.merge(raw) {
                Ok((received, stored)) => {
                    tracing::debug!(received, stored, "Sync cycle merged");
                    CycleOutcome::Merged { received, stored }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to merge order events");
                    CycleOutcome::StoreFailed {
                        error: e.to_string(),
                    }
                }
            },
        };

        self.cycle += 1;
        let cycle = SyncCycle {
            cycle: self.cycle,
            completed_at: now_millis(),
            outcome,
        };
        self.monitor.record(cycle.clone());
        Some(cycle)
    }

    async fn fetch(&self) -> Result<Vec<RawOrderEvent>, SyncError> {
        let request = self.source.fetch_order_events();
        match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| SyncError::Timeout(limit))?
                .map_err(Into::into),
            None => request.await.map_err(Into::into),
        }
    }

    fn merge(&self, raw: Vec<RawOrderEvent>) -> Result<(usize, usize), SyncError> {
        let received = raw.len();
        let events = normalize_batch(raw);
        let stored = self.storage.upsert_batch(&events)?;
        Ok((received, stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kitchen_client::ClientResult;
    use shared::order::{OrderState, Shelf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that replays scripted responses, then keeps failing
    struct ScriptedSource {
        responses: Mutex<Vec<ClientResult<Vec<RawOrderEvent>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(mut responses: Vec<ClientResult<Vec<RawOrderEvent>>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OrderEventSource for ScriptedSource {
        async fn fetch_order_events(&self) -> ClientResult<Vec<RawOrderEvent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ClientError::internal("connection refused")))
        }
    }

    /// Source whose fetch never completes
    struct HungSource;

    #[async_trait]
    impl OrderEventSource for HungSource {
        async fn fetch_order_events(&self) -> ClientResult<Vec<RawOrderEvent>> {
            std::future::pending().await
        }
    }

    fn raw(id: &str, state: &str, shelf: &str, timestamp: i64) -> RawOrderEvent {
        RawOrderEvent {
            state: Some(state.to_string()),
            price: Some(1000),
            shelf: Some(shelf.to_string()),
            timestamp: Some(timestamp),
            ..RawOrderEvent::new(id)
        }
    }

    fn sync_loop(source: Arc<dyn OrderEventSource>, storage: &OrderStorage) -> SyncLoop {
        SyncLoop::new(
            source,
            storage.clone(),
            SyncConfig::default(),
            SyncMonitor::new(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_successful_cycle_merges_normalized_events() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let source = ScriptedSource::new(vec![Ok(vec![
            raw("123", "CREATED", "NONE", 1000),
            raw("123", "COOKING", "HOT", 2000),
            RawOrderEvent::new("456"),
        ])]);
        let mut worker = sync_loop(source, &storage);

        let cycle = worker.run_cycle().await.unwrap();
        assert_eq!(cycle.cycle, 1);
        assert_eq!(
            cycle.outcome,
            CycleOutcome::Merged {
                received: 3,
                stored: 3
            }
        );
        assert_eq!(worker.monitor.last(), Some(cycle));

        let latest = storage.latest_per_order().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].state, OrderState::Cooking);
        assert_eq!(latest[0].shelf, Shelf::Hot);
        assert_eq!(latest[1].state, OrderState::Cancelled);
        assert_eq!(latest[1].timestamp, -1);
    }

    #[tokio::test]
    async fn test_empty_batch_still_completes_cycle() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let mut changes = storage.subscribe();
        let mut worker = sync_loop(ScriptedSource::new(vec![Ok(vec![])]), &storage);

        let cycle = worker.run_cycle().await.unwrap();
        assert_eq!(
            cycle.outcome,
            CycleOutcome::Merged {
                received: 0,
                stored: 0
            }
        );
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fetch_failures_keep_cached_data() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let source = ScriptedSource::new(vec![Ok(vec![raw("123", "DELIVERED", "HOT", 1000)])]);
        let mut worker = sync_loop(source.clone(), &storage);

        worker.run_cycle().await.unwrap();
        let cached = storage.latest_per_order().unwrap();

        // Two consecutive failures: each still completes a cycle
        for expected_cycle in 2..=3 {
            let cycle = worker.run_cycle().await.unwrap();
            assert_eq!(cycle.cycle, expected_cycle);
            assert!(matches!(cycle.outcome, CycleOutcome::FetchFailed { .. }));
            assert_eq!(worker.monitor.last().unwrap().cycle, expected_cycle);
            assert_eq!(storage.latest_per_order().unwrap(), cached);
        }

        assert_eq!(source.calls(), 3);
        assert_eq!(worker.status(), SyncStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_keeps_polling_until_cancelled() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let source = ScriptedSource::new(vec![]);
        let monitor = SyncMonitor::new();
        let shutdown = CancellationToken::new();

        let worker = SyncLoop::new(
            source.clone(),
            storage,
            SyncConfig::default(),
            monitor.clone(),
            shutdown.clone(),
        );
        let handle = tokio::spawn(worker.run());

        // Cycles at t=0, 2000, 4000
        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(monitor.last().unwrap().cycle, 3);

        shutdown.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_times_out() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let config = SyncConfig {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: Some(Duration::from_millis(500)),
        };
        let mut worker = SyncLoop::new(
            Arc::new(HungSource),
            storage,
            config,
            SyncMonitor::new(),
            CancellationToken::new(),
        );

        let cycle = worker.run_cycle().await.unwrap();
        match cycle.outcome {
            CycleOutcome::FetchFailed { error } => assert!(error.contains("timed out")),
            other => panic!("expected fetch failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_interrupts_hung_fetch() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let shutdown = CancellationToken::new();
        let monitor = SyncMonitor::new();
        let config = SyncConfig {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: None,
        };
        let worker = SyncLoop::new(
            Arc::new(HungSource),
            storage,
            config,
            monitor.clone(),
            shutdown.clone(),
        );
        let handle = tokio::spawn(worker.run());

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sync loop did not stop")
            .unwrap();
        assert!(monitor.last().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_no_cycle() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let source = ScriptedSource::new(vec![]);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let worker = SyncLoop::new(
            source.clone(),
            storage,
            SyncConfig::default(),
            SyncMonitor::new(),
            shutdown,
        );
        assert_eq!(worker.status(), SyncStatus::Cancelled);
        worker.run().await;
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_monitor_cycles_stream_skips_initial_none() {
        let monitor = SyncMonitor::new();
        let mut cycles = monitor.cycles();

        monitor.record(SyncCycle {
            cycle: 1,
            completed_at: 0,
            outcome: CycleOutcome::Merged {
                received: 0,
                stored: 0,
            },
        });

        let first = tokio::time::timeout(Duration::from_secs(1), cycles.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.cycle, 1);
    }
}
