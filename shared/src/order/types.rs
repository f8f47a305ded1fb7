//! Shared enums for kitchen order events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a wire string does not name a known variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// ============================================================================
// Order State
// ============================================================================

/// Fulfillment state of an order at the time of an event
///
/// Lifecycle: `CREATED → COOKING → WAITING → DELIVERED | TRASHED | CANCELLED`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Created,
    Cooking,
    Waiting,
    Delivered,
    Trashed,
    Cancelled,
}

impl OrderState {
    pub const ALL: [OrderState; 6] = [
        OrderState::Created,
        OrderState::Cooking,
        OrderState::Waiting,
        OrderState::Delivered,
        OrderState::Trashed,
        OrderState::Cancelled,
    ];

    /// Wire / storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "CREATED",
            OrderState::Cooking => "COOKING",
            OrderState::Waiting => "WAITING",
            OrderState::Delivered => "DELIVERED",
            OrderState::Trashed => "TRASHED",
            OrderState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "order state",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// Shelf
// ============================================================================

/// Storage location of an order in the kitchen
///
/// `NONE` means the order is not on any shelf (not yet cooked, or gone).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shelf {
    Hot,
    Cold,
    Frozen,
    Overflow,
    None,
}

impl Shelf {
    pub const ALL: [Shelf; 5] = [
        Shelf::Hot,
        Shelf::Cold,
        Shelf::Frozen,
        Shelf::Overflow,
        Shelf::None,
    ];

    /// Wire / storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Shelf::Hot => "HOT",
            Shelf::Cold => "COLD",
            Shelf::Frozen => "FROZEN",
            Shelf::Overflow => "OVERFLOW",
            Shelf::None => "NONE",
        }
    }
}

impl fmt::Display for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shelf {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shelf::ALL
            .into_iter()
            .find(|shelf| shelf.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "shelf",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// Change Type
// ============================================================================

/// Kind of transition recorded in an order changelog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// First event of the order
    OrderCreated,
    /// Only the state differs from the previous event
    StateChanged,
    /// Only the shelf differs from the previous event
    ShelfChanged,
    /// Both state and shelf differ from the previous event
    BothChanged,
}

impl ChangeType {
    /// Human-readable label
    pub fn description(&self) -> &'static str {
        match self {
            ChangeType::OrderCreated => "Order created",
            ChangeType::StateChanged => "State changed",
            ChangeType::ShelfChanged => "Shelf changed",
            ChangeType::BothChanged => "State and shelf changed",
        }
    }
}
