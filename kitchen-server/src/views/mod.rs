//! View composition
//!
//! Read-only views derived from the event store:
//!
//! | View | Sources | States |
//! |------|---------|--------|
//! | [`FleetView`] | sync cycles × latest-per-order | Loading / Empty / Error / Success |
//! | detail | history of one order | Loading / NotFound / Success |

pub mod combine;
pub mod detail;
pub mod fleet;

pub use combine::{CombineLatest, combine_latest};
pub use detail::{DetailViewState, OrderDetail, derive_detail_state, detail_snapshot, detail_updates};
pub use fleet::{FleetView, FleetViewState, derive_fleet_state, fleet_updates};
