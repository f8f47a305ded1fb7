//! HTTP client for the remote order event endpoint

use crate::config::ORDER_EVENTS_PATH;
use crate::{ClientConfig, ClientError, ClientResult, OrderEventSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shared::order::RawOrderEvent;
use std::time::Duration;

/// Body of `GET order_events`
///
/// Servers answer either with a bare array or with the array wrapped in
/// an `orderEvents` field; both decode to the same list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrderEventsPayload {
    List(Vec<RawOrderEvent>),
    Wrapped {
        #[serde(rename = "orderEvents")]
        order_events: Vec<RawOrderEvent>,
    },
}

impl OrderEventsPayload {
    pub fn into_events(self) -> Vec<RawOrderEvent> {
        match self {
            OrderEventsPayload::List(events) => events,
            OrderEventsPayload::Wrapped { order_events } => order_events,
        }
    }
}

/// HTTP client for the order event source
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.config.url(path);
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    // ========== Order Events API ==========

    /// Fetch the current batch of raw order events
    pub async fn order_events(&self) -> ClientResult<Vec<RawOrderEvent>> {
        let payload: OrderEventsPayload = self.get(ORDER_EVENTS_PATH).await?;
        Ok(payload.into_events())
    }
}

#[async_trait]
impl OrderEventSource for HttpClient {
    async fn fetch_order_events(&self) -> ClientResult<Vec<RawOrderEvent>> {
        self.order_events().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_bare_array() {
        let json = r#"[{"id":"1","state":"CREATED","timestamp":1000},{"id":"2"}]"#;
        let events = serde_json::from_str::<OrderEventsPayload>(json)
            .unwrap()
            .into_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].state.as_deref(), Some("CREATED"));
        assert_eq!(events[1].timestamp, None);
    }

    #[test]
    fn test_payload_accepts_wrapped_list() {
        let json = r#"{"orderEvents":[{"id":"7","price":1250,"shelf":"HOT"}]}"#;
        let events = serde_json::from_str::<OrderEventsPayload>(json)
            .unwrap()
            .into_events();
        assert_eq!(events, vec![RawOrderEvent {
            price: Some(1250),
            shelf: Some("HOT".to_string()),
            ..RawOrderEvent::new("7")
        }]);
    }

    #[test]
    fn test_payload_rejects_records_without_id() {
        assert!(serde_json::from_str::<OrderEventsPayload>(r#"[{"state":"CREATED"}]"#).is_err());
    }
}
