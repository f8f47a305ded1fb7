//! redb-based event store for kitchen order events
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `order_events` | `(order_id, timestamp)` | `OrderEvent` (JSON) | Merge log, one row per event key |
//!
//! The tuple key keeps one order's rows adjacent and sorted by timestamp,
//! so history is a range scan and latest-per-order is a single ordered pass.
//! The logical row key is [`OrderEvent::storage_key`].
//!
//! # Consistency
//!
//! Every batch upsert is one write transaction and every query runs inside
//! one read transaction. Readers never observe a partially applied batch.
//!
//! # Change notification
//!
//! Each committed write publishes a [`StoreChange`] on a broadcast channel.
//! Live queries (see `live.rs`) re-run when a relevant change arrives.

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use shared::order::OrderEvent;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Table for storing events: key = (order_id, timestamp), value = JSON-serialized OrderEvent
const EVENTS_TABLE: TableDefinition<(&str, i64), &[u8]> = TableDefinition::new("order_events");

/// Capacity of the change channel; slower subscribers see `Lagged` and re-query
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A committed mutation of the event store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// A batch was merged; ids are distinct and sorted
    Upserted { order_ids: Vec<String> },
    /// Every event was removed
    Cleared,
}

impl StoreChange {
    /// Whether this change can affect the history of `order_id`
    pub fn touches(&self, order_id: &str) -> bool {
        match self {
            StoreChange::Upserted { order_ids } => order_ids
                .binary_search_by(|id| id.as_str().cmp(order_id))
                .is_ok(),
            StoreChange::Cleared => true,
        }
    }
}

/// Order event store backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
    changes: broadcast::Sender<StoreChange>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the batch survives a crash or power loss.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create the table if it doesn't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE)?;
        }
        write_txn.commit()?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            db: Arc::new(db),
            changes,
        })
    }

    /// Subscribe to committed changes
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StoreChange) {
        // No receivers is fine: nobody is watching yet
        let _ = self.changes.send(change);
    }

    // ========== Write Operations ==========

    /// Merge a batch of events by `(order_id, timestamp)`
    ///
    /// An existing row with the same key is replaced (last write wins, also
    /// within one batch). An empty batch performs no I/O and publishes nothing.
    /// Returns the number of rows written.
    pub fn upsert_batch(&self, events: &[OrderEvent]) -> StorageResult<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(EVENTS_TABLE)?;
            for event in events {
                let key = (event.order_id.as_str(), event.timestamp);
                let value = serde_json::to_vec(event)?;
                table.insert(key, value.as_slice())?;
            }
        }
        txn.commit()?;

        let order_ids: BTreeSet<&str> = events.iter().map(|e| e.order_id.as_str()).collect();
        tracing::debug!(
            events = events.len(),
            orders = order_ids.len(),
            "Merged order events"
        );
        self.notify(StoreChange::Upserted {
            order_ids: order_ids.into_iter().map(str::to_string).collect(),
        });

        Ok(events.len())
    }

    /// Remove every stored event
    pub fn clear_all(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(EVENTS_TABLE)?;
        {
            let _ = txn.open_table(EVENTS_TABLE)?;
        }
        txn.commit()?;

        tracing::info!("Cleared all order events");
        self.notify(StoreChange::Cleared);
        Ok(())
    }

    // ========== Query Operations ==========

    /// All events of one order, ascending by timestamp
    pub fn history_of(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let range_start = (order_id, i64::MIN);
        let range_end = (order_id, i64::MAX);

        let mut events = Vec::new();
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice(value.value())?);
        }

        Ok(events)
    }

    /// The event with the greatest timestamp of every order, ordered by order id
    pub fn latest_per_order(&self) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        // Rows arrive sorted by (order_id, timestamp): the last row of each
        // order id is its latest event.
        let mut latest: Vec<OrderEvent> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            match latest.last_mut() {
                Some(last) if last.order_id == event.order_id => *last = event,
                _ => latest.push(event),
            }
        }

        Ok(latest)
    }

    /// Number of stored rows
    pub fn event_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;
        Ok(table.len()?)
    }
}
