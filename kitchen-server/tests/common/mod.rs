#![allow(dead_code)]

use async_trait::async_trait;
use kitchen_client::{ClientError, ClientResult, OrderEventSource, RawOrderEvent};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-process order event source with a switchable failure mode
#[derive(Default)]
pub struct FakeSource {
    batch: Mutex<Vec<RawOrderEvent>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(batch: Vec<RawOrderEvent>) -> Self {
        Self {
            batch: Mutex::new(batch),
            ..Default::default()
        }
    }

    pub fn set_batch(&self, batch: Vec<RawOrderEvent>) {
        *self.batch.lock().unwrap() = batch;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderEventSource for FakeSource {
    async fn fetch_order_events(&self) -> ClientResult<Vec<RawOrderEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::internal("kitchen offline"));
        }
        Ok(self.batch.lock().unwrap().clone())
    }
}

pub fn raw(id: &str, state: &str, shelf: &str, price: i64, timestamp: i64) -> RawOrderEvent {
    RawOrderEvent {
        state: Some(state.to_string()),
        price: Some(price),
        item: Some("Item".to_string()),
        customer: Some("Customer".to_string()),
        shelf: Some(shelf.to_string()),
        timestamp: Some(timestamp),
        destination: Some("1 Dock Rd".to_string()),
        ..RawOrderEvent::new(id)
    }
}

/// Four orders: two delivered ($10, $15), one trashed ($8), one cooking ($12)
pub fn kitchen_batch() -> Vec<RawOrderEvent> {
    vec![
        raw("1", "CREATED", "NONE", 1000, 1000),
        raw("1", "DELIVERED", "HOT", 1000, 5000),
        raw("2", "DELIVERED", "COLD", 1500, 5000),
        raw("3", "COOKING", "FROZEN", 800, 2000),
        raw("3", "TRASHED", "NONE", 800, 6000),
        raw("4", "COOKING", "HOT", 1200, 3000),
    ]
}
