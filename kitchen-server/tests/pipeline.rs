//! End-to-end pipeline over an on-disk store

mod common;

use common::{FakeSource, kitchen_batch, raw};
use kitchen_server::orders::{CycleOutcome, OrderStorage, SyncConfig, SyncLoop, SyncMonitor};
use kitchen_server::views::{DetailViewState, FleetView, FleetViewState, detail_snapshot};
use shared::order::{ChangeType, OrderState, OrderStatistics, Shelf, normalize_batch};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

fn fast_sync() -> SyncConfig {
    SyncConfig {
        poll_interval: Duration::from_millis(20),
        fetch_timeout: Some(Duration::from_secs(1)),
    }
}

async fn wait_for(
    rx: &mut watch::Receiver<FleetViewState>,
    predicate: impl FnMut(&FleetViewState) -> bool,
) -> FleetViewState {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("fleet view did not reach expected state")
        .unwrap()
        .clone()
}

#[test]
fn test_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("orders.redb");

    {
        let storage = OrderStorage::open(&db_path).unwrap();
        storage
            .upsert_batch(&normalize_batch(kitchen_batch()))
            .unwrap();
    }

    let storage = OrderStorage::open(&db_path).unwrap();
    assert_eq!(storage.event_count().unwrap(), 6);

    let latest = storage.latest_per_order().unwrap();
    let states: Vec<_> = latest.iter().map(|e| (e.order_id.as_str(), e.state)).collect();
    assert_eq!(
        states,
        [
            ("1", OrderState::Delivered),
            ("2", OrderState::Delivered),
            ("3", OrderState::Trashed),
            ("4", OrderState::Cooking),
        ]
    );
}

#[tokio::test]
async fn test_sync_to_fleet_and_detail() {
    let temp_dir = TempDir::new().unwrap();
    let storage = OrderStorage::open(temp_dir.path().join("orders.redb")).unwrap();
    let source = Arc::new(FakeSource::new(kitchen_batch()));
    let monitor = SyncMonitor::new();
    let fleet = FleetView::new(storage.clone(), monitor.clone());
    let shutdown = CancellationToken::new();

    let mut rx = fleet.subscribe();
    assert_eq!(*rx.borrow(), FleetViewState::Loading);

    let fleet_task = tokio::spawn(fleet.clone().run(shutdown.clone()));
    let sync_task = tokio::spawn(
        SyncLoop::new(
            source.clone(),
            storage.clone(),
            fast_sync(),
            monitor.clone(),
            shutdown.clone(),
        )
        .run(),
    );

    let FleetViewState::Success(snapshot) =
        wait_for(&mut rx, |s| matches!(s, FleetViewState::Success(_))).await
    else {
        unreachable!()
    };
    assert_eq!(
        snapshot.statistics,
        OrderStatistics {
            orders_delivered: 2,
            orders_trashed: 1,
            total_sales_cents: 2500,
            total_waste_cents: 800,
            total_revenue_cents: 1700,
        }
    );
    assert_eq!(snapshot.order_count(), 4);
    assert_eq!(snapshot.shelves[&Shelf::Hot].len(), 2);
    assert!(snapshot.shelves[&Shelf::Overflow].is_empty());

    let DetailViewState::Success(detail) = detail_snapshot(&storage, "1") else {
        panic!("order 1 should exist");
    };
    assert_eq!(detail.current_order.state, OrderState::Delivered);
    assert_eq!(detail.history.len(), 2);
    let changes: Vec<_> = detail.changelog.iter().map(|c| c.change_type).collect();
    assert_eq!(changes, [ChangeType::BothChanged, ChangeType::OrderCreated]);

    assert_eq!(detail_snapshot(&storage, "missing"), DetailViewState::NotFound);

    shutdown.cancel();
    sync_task.await.unwrap();
    fleet_task.await.unwrap();
}

#[tokio::test]
async fn test_outage_keeps_serving_cached_data() {
    let temp_dir = TempDir::new().unwrap();
    let storage = OrderStorage::open(temp_dir.path().join("orders.redb")).unwrap();
    let source = Arc::new(FakeSource::new(kitchen_batch()));
    let monitor = SyncMonitor::new();
    let shutdown = CancellationToken::new();

    let mut cycles = monitor.subscribe();
    let sync_task = tokio::spawn(
        SyncLoop::new(
            source.clone(),
            storage.clone(),
            fast_sync(),
            monitor.clone(),
            shutdown.clone(),
        )
        .run(),
    );

    tokio::time::timeout(
        Duration::from_secs(5),
        cycles.wait_for(|c| c.as_ref().is_some_and(|c| c.outcome.is_success())),
    )
    .await
    .unwrap()
    .unwrap();
    let cached = storage.latest_per_order().unwrap();

    source.set_failing(true);
    let failed_from = source.calls();
    tokio::time::timeout(
        Duration::from_secs(5),
        cycles.wait_for(|c| {
            c.as_ref()
                .is_some_and(|c| matches!(c.outcome, CycleOutcome::FetchFailed { .. }))
        }),
    )
    .await
    .unwrap()
    .unwrap();

    // The loop keeps polling through the outage
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.calls() < failed_from + 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(storage.latest_per_order().unwrap(), cached);

    // Recovery merges new events again
    source.set_batch(vec![raw("5", "CREATED", "NONE", 900, 7000)]);
    source.set_failing(false);
    tokio::time::timeout(Duration::from_secs(5), async {
        while storage.latest_per_order().unwrap().len() < 5 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    shutdown.cancel();
    sync_task.await.unwrap();
}

#[tokio::test]
async fn test_reset_clears_and_next_sync_repopulates() {
    let temp_dir = TempDir::new().unwrap();
    let storage = OrderStorage::open(temp_dir.path().join("orders.redb")).unwrap();
    let source = Arc::new(FakeSource::new(kitchen_batch()));
    let monitor = SyncMonitor::new();
    let fleet = FleetView::new(storage.clone(), monitor.clone());
    let shutdown = CancellationToken::new();
    let mut rx = fleet.subscribe();

    let fleet_task = tokio::spawn(fleet.clone().run(shutdown.clone()));
    let sync_task = tokio::spawn(
        SyncLoop::new(
            source.clone(),
            storage.clone(),
            fast_sync(),
            monitor.clone(),
            shutdown.clone(),
        )
        .run(),
    );
    wait_for(&mut rx, |s| matches!(s, FleetViewState::Success(_))).await;

    // Stop feeding events, then reset
    source.set_batch(vec![]);
    let state = fleet.reset();
    assert!(matches!(state, FleetViewState::Loading | FleetViewState::Empty));
    wait_for(&mut rx, |s| *s == FleetViewState::Empty).await;
    assert_eq!(storage.event_count().unwrap(), 0);

    // Source has events again: the view fills up on the next cycle
    source.set_batch(kitchen_batch());
    wait_for(&mut rx, |s| matches!(s, FleetViewState::Success(_))).await;

    shutdown.cancel();
    sync_task.await.unwrap();
    fleet_task.await.unwrap();
}
