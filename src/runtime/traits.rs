//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the turn processor with mock implementations.

use crate::db::{Database, DbError, ExchangeId, LatestState};
use crate::state_machine::ConvState;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Attempts made for an append that hits a busy/locked database
const MAX_APPEND_ATTEMPTS: u32 = 3;

/// The durable medium could not be read or written
#[derive(Debug, Error)]
#[error("storage unavailable: {message}")]
pub struct StorageUnavailable {
    pub message: String,
}

impl StorageUnavailable {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<DbError> for StorageUnavailable {
    fn from(err: DbError) -> Self {
        Self::new(err.to_string())
    }
}

/// Outbound delivery failed; never fatal to a turn
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("delivery rejected with HTTP {status}")]
    Rejected { status: u16 },
    #[allow(dead_code)] // Constructed by test doubles
    #[error("delivery failed: {0}")]
    Other(String),
}

/// Append-only storage of exchange records
#[async_trait]
pub trait ExchangeStore: Send + Sync {
    /// State of the sender's most recent exchange, or the initial state.
    /// A sender with no records is not an error.
    async fn load_latest_state(&self, sender: &str) -> Result<ConvState, StorageUnavailable>;

    /// Durably record one exchange and return its id
    async fn append_exchange(
        &self,
        sender: &str,
        inbound: &str,
        outbound: &str,
        state: &ConvState,
    ) -> Result<ExchangeId, StorageUnavailable>;
}

/// Channel that hands replies to the messaging provider
#[async_trait]
pub trait MessageDelivery: Send + Sync {
    async fn deliver(&self, to: &str, body: &str) -> Result<(), DeliveryError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ExchangeStore + ?Sized> ExchangeStore for Arc<T> {
    async fn load_latest_state(&self, sender: &str) -> Result<ConvState, StorageUnavailable> {
        (**self).load_latest_state(sender).await
    }

    async fn append_exchange(
        &self,
        sender: &str,
        inbound: &str,
        outbound: &str,
        state: &ConvState,
    ) -> Result<ExchangeId, StorageUnavailable> {
        (**self).append_exchange(sender, inbound, outbound, state).await
    }
}

#[async_trait]
impl<T: MessageDelivery + ?Sized> MessageDelivery for Arc<T> {
    async fn deliver(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        (**self).deliver(to, body).await
    }
}

// ============================================================================
// Production implementations
// ============================================================================

/// Adapter to use Database as `ExchangeStore`
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl ExchangeStore for DatabaseStorage {
    async fn load_latest_state(&self, sender: &str) -> Result<ConvState, StorageUnavailable> {
        let latest = self.db.latest_state(sender)?;
        if let LatestState::Corrupt {
            exchange_id,
            reason,
        } = &latest
        {
            tracing::warn!(
                sender = %sender,
                exchange_id,
                reason = %reason,
                "Stored state unreadable, restarting conversation"
            );
        }
        Ok(latest.into_state())
    }

    async fn append_exchange(
        &self,
        sender: &str,
        inbound: &str,
        outbound: &str,
        state: &ConvState,
    ) -> Result<ExchangeId, StorageUnavailable> {
        let mut attempt = 1;
        loop {
            match self.db.append_exchange(sender, inbound, outbound, state) {
                Ok(id) => return Ok(id),
                Err(e) if is_busy(&e) && attempt < MAX_APPEND_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "Database busy, retrying append");
                    tokio::time::sleep(retry_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_busy(err: &DbError) -> bool {
    matches!(
        err,
        DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
            if matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
    )
}

fn retry_delay(attempt: u32) -> Duration {
    // Exponential backoff: 50ms, 100ms
    Duration::from_millis(50 << (attempt - 1))
}
