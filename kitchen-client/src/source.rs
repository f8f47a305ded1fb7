//! Order event source abstraction

use async_trait::async_trait;
use shared::order::RawOrderEvent;

use crate::ClientResult;

/// Anything that can deliver a batch of raw order events
///
/// Called once per sync cycle. Implementations report failures through
/// [`ClientResult`]; the caller decides how to recover.
#[async_trait]
pub trait OrderEventSource: Send + Sync {
    async fn fetch_order_events(&self) -> ClientResult<Vec<RawOrderEvent>>;
}
