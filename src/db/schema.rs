//! Database schema and types

pub use crate::state_machine::state::ConvState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// SQL schema for initialization
///
/// `AUTOINCREMENT` keeps ids strictly increasing even across deletes made
/// outside this service, so "highest id" is always "most recent".
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender TEXT NOT NULL,
    inbound TEXT NOT NULL,
    outbound TEXT NOT NULL,
    state TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_sender_latest ON messages(sender, id DESC);
";

/// Store-assigned identifier of an exchange record
pub type ExchangeId = i64;

/// One inbound/outbound turn and the state it produced
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub sender: String,
    pub inbound: String,
    pub outbound: String,
    /// Raw JSON as stored; not re-validated on the audit path
    pub state: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// What the store found when asked for a sender's current state
#[derive(Debug, Clone, PartialEq)]
pub enum LatestState {
    /// No exchange has ever been recorded for this sender
    FirstContact,
    /// State taken from the sender's most recent exchange
    Restored {
        exchange_id: ExchangeId,
        state: ConvState,
    },
    /// The most recent exchange holds a state that could not be decoded
    Corrupt {
        exchange_id: ExchangeId,
        reason: String,
    },
}

impl LatestState {
    /// Collapse to the state the engine should start from.
    /// Unreadable state restarts the conversation.
    pub fn into_state(self) -> ConvState {
        match self {
            LatestState::Restored { state, .. } => state,
            LatestState::FirstContact | LatestState::Corrupt { .. } => ConvState::initial(),
        }
    }
}
