//! Shared types for the kitchen order pipeline
//!
//! Domain types and pure derivations used by both the client and the
//! server crate. Nothing in here performs I/O.

pub mod order;
pub mod util;

// Re-exports
pub use order::{
    ChangeType, ChangelogEntry, FleetSnapshot, OrderEvent, OrderState, OrderStatistics,
    RawOrderEvent, Shelf,
};
