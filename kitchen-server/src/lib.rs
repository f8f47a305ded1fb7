//! Kitchen Server - order event ingestion, caching and derived views
//!
//! # Overview
//!
//! ```text
//! remote source ─► SyncLoop ─► OrderStorage (redb) ─┬─► FleetView (latest per order, by shelf)
//!   (HTTP poll)    normalize    merge by key        └─► detail view (history + changelog)
//!                                                          │
//!                                                   axum JSON API
//! ```
//!
//! # Module structure
//!
//! ```text
//! kitchen-server/src/
//! ├── core/     # config, state, errors, server, background tasks
//! ├── orders/   # event store, live queries, sync loop
//! ├── views/    # combine-latest, fleet view, detail view
//! ├── api/      # HTTP routes and handlers
//! └── utils/    # logging
//! ```

pub mod api;
pub mod core;
pub mod orders;
pub mod utils;
pub mod views;

pub use core::{Config, Server, ServerError, ServerState};
pub use orders::{OrderStorage, SyncLoop, SyncMonitor};
pub use views::{DetailViewState, FleetView, FleetViewState};

pub use utils::logger::{cleanup_old_logs, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
  _  ___ _       _
 | |/ (_) |_ ___| |__   ___ _ __
 | ' /| | __/ __| '_ \ / _ \ '_ \
 | . \| | || (__| | | |  __/ | | |
 |_|\_\_|\__\___|_| |_|\___|_| |_|
    "#
    );
}
