//! API request and response types

use crate::db::Exchange;
use crate::state_machine::ConvState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields pulled from a provider webhook body.
///
/// Providers disagree on casing: Twilio sends `From`/`Body`, others send
/// `from`/`body`. The first non-empty string wins.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WebhookPayload {
    pub sender: Option<String>,
    pub body: Option<String>,
    pub message_sid: Option<String>,
}

impl WebhookPayload {
    pub fn from_json(value: &Value) -> Self {
        Self {
            sender: first_string(value, &["From", "from"]),
            body: first_string(value, &["Body", "body"]),
            message_sid: first_string(value, &["MessageSid"]),
        }
    }
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(String::from)
}

/// Query parameters accepted by authenticated routes
#[derive(Debug, Default, Deserialize)]
pub struct SecretQuery {
    pub secret: Option<String>,
}

/// Response for a processed webhook
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Whether the reply was handed to the provider
    pub ok: bool,
    pub outbound: String,
}

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Unix time in seconds
    pub ts: f64,
}

/// A sender's audit trail
#[derive(Debug, Serialize)]
pub struct ExchangeListResponse {
    pub sender: String,
    pub state: ConvState,
    pub exchanges: Vec<Exchange>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
