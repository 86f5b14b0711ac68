//! Outbound delivery channels

use super::traits::{DeliveryError, MessageDelivery};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Placeholder channel: logs the reply and reports success.
/// Used when no relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LogDelivery;

#[async_trait]
impl MessageDelivery for LogDelivery {
    async fn deliver(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        tracing::info!(to = %to, body = %body, "Outbound message");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    to: &'a str,
    body: &'a str,
}

/// Posts each reply as `{"to": ..., "body": ...}` to a relay endpoint that
/// owns the provider integration.
pub struct HttpRelayDelivery {
    client: reqwest::Client,
    url: String,
}

impl HttpRelayDelivery {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl MessageDelivery for HttpRelayDelivery {
    async fn deliver(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(&RelayPayload { to, body })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(
            to = %to,
            status = status.as_u16(),
            duration_ms = %start.elapsed().as_millis(),
            "Relay responded"
        );

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
