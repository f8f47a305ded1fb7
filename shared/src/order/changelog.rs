//! Order history changelog
//!
//! Turns an order's ascending event history into the list of meaningful
//! transitions, most recent first. An event that repeats the previous
//! state and shelf exactly produces no entry.

use super::event::OrderEvent;
use super::types::{ChangeType, OrderState, Shelf};
use serde::{Deserialize, Serialize};

/// One transition in an order's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub timestamp: i64,
    pub state: OrderState,
    pub shelf: Shelf,
    pub change_type: ChangeType,
}

impl ChangelogEntry {
    fn from_event(event: &OrderEvent, change_type: ChangeType) -> Self {
        Self {
            timestamp: event.timestamp,
            state: event.state,
            shelf: event.shelf,
            change_type,
        }
    }
}

/// Classify the step from `previous` to `current`, `None` when nothing changed
pub fn classify_change(previous: &OrderEvent, current: &OrderEvent) -> Option<ChangeType> {
    let state_changed = previous.state != current.state;
    let shelf_changed = previous.shelf != current.shelf;

    match (state_changed, shelf_changed) {
        (true, true) => Some(ChangeType::BothChanged),
        (true, false) => Some(ChangeType::StateChanged),
        (false, true) => Some(ChangeType::ShelfChanged),
        (false, false) => None,
    }
}

/// Build the changelog for a history sorted by ascending timestamp
///
/// Returns entries in reverse chronological order. An empty history yields
/// an empty changelog; callers treat that as "order not found".
pub fn build_changelog(history: &[OrderEvent]) -> Vec<ChangelogEntry> {
    let Some(first) = history.first() else {
        return Vec::new();
    };

    let mut changelog = vec![ChangelogEntry::from_event(first, ChangeType::OrderCreated)];
    changelog.extend(history.windows(2).filter_map(|pair| {
        classify_change(&pair[0], &pair[1])
            .map(|change_type| ChangelogEntry::from_event(&pair[1], change_type))
    }));

    changelog.reverse();
    changelog
}
