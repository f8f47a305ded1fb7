//! Order events - the remote wire record and the normalized domain event
//!
//! The remote source may omit any field except `id`. [`RawOrderEvent::normalize`]
//! fills the gaps with fixed defaults and never fails:
//!
//! | Field | Missing (or unrecognized) becomes |
//! |-------|-----------------------------------|
//! | `state` | `CANCELLED` |
//! | `price` | `0` |
//! | `item` / `customer` / `destination` | `""` |
//! | `shelf` | `NONE` |
//! | `timestamp` | `-1` |

use super::types::{OrderState, Shelf};
use serde::{Deserialize, Serialize};

/// Timestamp substituted when the source omits one
pub const MISSING_TIMESTAMP: i64 = -1;

/// Normalized order event - immutable once stored
///
/// `(order_id, timestamp)` identifies the event inside the event store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderEvent {
    pub order_id: String,
    pub state: OrderState,
    /// Price in cents
    pub price_cents: i64,
    pub item: String,
    pub customer: String,
    pub shelf: Shelf,
    /// Unix milliseconds, `-1` when the source did not provide one
    pub timestamp: i64,
    pub destination: String,
}

impl OrderEvent {
    /// Logical row key: `"{order_id}_{timestamp}"`
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.order_id, self.timestamp)
    }
}

/// Order event as sent by the remote source
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawOrderEvent {
    #[serde(rename = "id")]
    pub order_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub shelf: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub destination: Option<String>,
}

impl RawOrderEvent {
    /// Record carrying only an order id
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            ..Default::default()
        }
    }

    /// Convert into a fully populated [`OrderEvent`]
    pub fn normalize(self) -> OrderEvent {
        let state = match self.state.as_deref() {
            None => OrderState::Cancelled,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(order_id = %self.order_id, error = %e, "Unrecognized state, assuming CANCELLED");
                OrderState::Cancelled
            }),
        };
        let shelf = match self.shelf.as_deref() {
            None => Shelf::None,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(order_id = %self.order_id, error = %e, "Unrecognized shelf, assuming NONE");
                Shelf::None
            }),
        };

        OrderEvent {
            order_id: self.order_id,
            state,
            price_cents: self.price.unwrap_or(0),
            item: self.item.unwrap_or_default(),
            customer: self.customer.unwrap_or_default(),
            shelf,
            timestamp: self.timestamp.unwrap_or(MISSING_TIMESTAMP),
            destination: self.destination.unwrap_or_default(),
        }
    }
}

impl From<RawOrderEvent> for OrderEvent {
    fn from(raw: RawOrderEvent) -> Self {
        raw.normalize()
    }
}

/// Normalize a fetched batch, preserving order
pub fn normalize_batch(raw: Vec<RawOrderEvent>) -> Vec<OrderEvent> {
    raw.into_iter().map(RawOrderEvent::normalize).collect()
}
