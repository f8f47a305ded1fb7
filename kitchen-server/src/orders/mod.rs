//! Order event caching
//!
//! - [`storage`] - redb event store (merge log keyed by order id + timestamp)
//! - [`live`] - live queries: snapshot now, fresh snapshot after each change
//! - [`sync`] - background poller feeding the store from the remote source

pub mod live;
pub mod storage;
pub mod sync;

pub use live::LiveQuery;
pub use storage::{OrderStorage, StorageError, StorageResult, StoreChange};
pub use sync::{
    CycleOutcome, SyncConfig, SyncCycle, SyncError, SyncLoop, SyncMonitor, SyncStatus,
};
