//! Runtime for processing conversation turns
//!
//! A turn is the full handling of one inbound message: load the sender's
//! state, advance the state machine, deliver the reply, record the exchange.

mod delivery;
mod executor;
mod locks;
pub mod traits;


pub use delivery::{HttpRelayDelivery, LogDelivery};
pub use executor::TurnProcessor;
pub use traits::*;

use crate::db::ExchangeId;
use crate::state_machine::ConvState;
use std::sync::Arc;
use thiserror::Error;

/// Type alias for the production processor with concrete implementations
pub type ProductionProcessor = TurnProcessor<DatabaseStorage, Arc<dyn MessageDelivery>>;

/// Sender identifier used when the provider payload carries none
pub const UNKNOWN_SENDER: &str = "unknown";

/// A normalized inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
}

impl InboundMessage {
    /// Trim both parts. A missing or blank sender becomes [`UNKNOWN_SENDER`]
    /// so the message is still processed; a missing body is empty text.
    pub fn normalize(sender: Option<&str>, text: Option<&str>) -> Self {
        let sender = sender
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SENDER);
        Self {
            sender: sender.to_string(),
            text: text.map(str::trim).unwrap_or_default().to_string(),
        }
    }
}

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub exchange_id: ExchangeId,
    pub reply: String,
    /// Whether the provider accepted the reply
    pub delivered: bool,
    pub state: ConvState,
}

/// A turn that could not complete. The storage variants differ in whether a
/// reply may already have gone out.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Nothing was delivered or recorded
    #[error("could not load conversation state: {0}")]
    StateLoad(#[source] StorageUnavailable),
    /// The reply was attempted but the exchange was not recorded
    #[error("could not record exchange: {0}")]
    Append(#[source] StorageUnavailable),
    /// The task running the turn panicked or was shut down
    #[error("turn did not finish: {0}")]
    Aborted(String),
}
