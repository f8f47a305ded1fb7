//! Fleet aggregation over the latest event of every order
//!
//! Statistics only ever look at each order's most recent event: an order
//! that was delivered counts once, no matter how many events led there.

use super::event::OrderEvent;
use super::types::{OrderState, Shelf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest events bucketed by shelf; every shelf has a bucket, possibly empty
pub type ShelfGroups = BTreeMap<Shelf, Vec<OrderEvent>>;

/// Delivered / trashed totals, all amounts in cents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderStatistics {
    pub orders_delivered: usize,
    pub orders_trashed: usize,
    pub total_sales_cents: i64,
    pub total_waste_cents: i64,
    /// `total_sales_cents - total_waste_cents`, may be negative
    pub total_revenue_cents: i64,
}

impl OrderStatistics {
    /// Compute statistics from the latest event of each order
    ///
    /// Prices come from the remote source unchecked, so every sum saturates
    /// at the `i64` bounds instead of overflowing.
    pub fn from_latest(latest: &[OrderEvent]) -> Self {
        let mut stats = Self::default();

        for event in latest {
            match event.state {
                OrderState::Delivered => {
                    stats.orders_delivered += 1;
                    stats.total_sales_cents =
                        stats.total_sales_cents.saturating_add(event.price_cents);
                }
                OrderState::Trashed => {
                    stats.orders_trashed += 1;
                    stats.total_waste_cents =
                        stats.total_waste_cents.saturating_add(event.price_cents);
                }
                _ => {}
            }
        }

        stats.total_revenue_cents = stats
            .total_sales_cents
            .saturating_sub(stats.total_waste_cents);
        stats
    }
}

/// Shelf grouping plus statistics for one fleet snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FleetSnapshot {
    pub shelves: ShelfGroups,
    pub statistics: OrderStatistics,
}

impl FleetSnapshot {
    /// Total number of orders across all shelves
    pub fn order_count(&self) -> usize {
        self.shelves.values().map(Vec::len).sum()
    }
}

/// Bucket the latest events by shelf, keeping input order inside a bucket
pub fn group_by_shelf(latest: &[OrderEvent]) -> ShelfGroups {
    let mut groups: ShelfGroups = Shelf::ALL.into_iter().map(|s| (s, Vec::new())).collect();
    for event in latest {
        groups.entry(event.shelf).or_default().push(event.clone());
    }
    groups
}

/// Group and summarize the latest-per-order set
pub fn aggregate(latest: &[OrderEvent]) -> FleetSnapshot {
    FleetSnapshot {
        shelves: group_by_shelf(latest),
        statistics: OrderStatistics::from_latest(latest),
    }
}
