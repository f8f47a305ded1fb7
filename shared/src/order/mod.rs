//! Kitchen order domain
//!
//! - **types**: `OrderState`, `Shelf`, `ChangeType`
//! - **event**: remote wire record and its normalization into `OrderEvent`
//! - **statistics**: shelf grouping and delivered/trashed totals
//! - **changelog**: per-order transition list
//!
//! # Data Flow
//!
//! ```text
//! RawOrderEvent ──normalize──▶ OrderEvent ──▶ event store
//!                                                │
//!                        latest per order ◀──────┴──────▶ history of one order
//!                              │                               │
//!                          aggregate()                  build_changelog()
//!                              ▼                               ▼
//!                        FleetSnapshot                 Vec<ChangelogEntry>
//! ```

pub mod changelog;
pub mod event;
pub mod statistics;
pub mod types;

// Re-exports
pub use changelog::{ChangelogEntry, build_changelog, classify_change};
pub use event::{MISSING_TIMESTAMP, OrderEvent, RawOrderEvent, normalize_batch};
pub use statistics::{FleetSnapshot, OrderStatistics, ShelfGroups, aggregate, group_by_shelf};
pub use types::{ChangeType, OrderState, Shelf, UnknownVariant};
