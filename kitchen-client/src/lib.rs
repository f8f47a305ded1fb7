//! Kitchen Client - remote order event source
//!
//! Fetches raw order events from the kitchen's HTTP endpoint
//! (`GET {base_url}/order_events`).

pub mod config;
pub mod error;
pub mod http;
pub mod source;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, OrderEventsPayload};
pub use source::OrderEventSource;

// Re-export shared types for convenience
pub use shared::order::RawOrderEvent;
