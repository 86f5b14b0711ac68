//! Database module for the bot
//!
//! Persists one append-only record per exchange, keyed by sender. Rows are
//! never updated or deleted; a sender's current state is the state column of
//! their highest-id row.

mod schema;

pub use schema::*;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("State serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ==================== Exchange Operations ====================

    /// Append an exchange record and return its id.
    ///
    /// Ids are assigned by `SQLite` and strictly increase.
    pub fn append_exchange(
        &self,
        sender: &str,
        inbound: &str,
        outbound: &str,
        state: &ConvState,
    ) -> DbResult<ExchangeId> {
        let state_json = serde_json::to_string(state)?;
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO messages (sender, inbound, outbound, state, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![sender, inbound, outbound, state_json, now.to_rfc3339()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Look up the state stored with the sender's most recent exchange.
    ///
    /// A state cell that is not JSON text is reported as `Corrupt`, never as
    /// an error, so one bad row cannot block a sender.
    pub fn latest_state(&self, sender: &str) -> DbResult<LatestState> {
        let conn = self.lock()?;
        let row: Option<(ExchangeId, SqlValue)> = conn
            .query_row(
                "SELECT id, state FROM messages WHERE sender = ?1 ORDER BY id DESC LIMIT 1",
                params![sender],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((exchange_id, cell)) = row else {
            return Ok(LatestState::FirstContact);
        };
        let state_json = match cell {
            SqlValue::Text(text) => text,
            other => {
                return Ok(LatestState::Corrupt {
                    exchange_id,
                    reason: format!("state stored as {}, expected JSON text", other.data_type()),
                });
            }
        };

        Ok(match serde_json::from_str(&state_json) {
            Ok(state) => LatestState::Restored { exchange_id, state },
            Err(e) => LatestState::Corrupt {
                exchange_id,
                reason: e.to_string(),
            },
        })
    }

    /// Get every exchange for a sender, oldest first
    pub fn exchanges_for_sender(&self, sender: &str) -> DbResult<Vec<Exchange>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, sender, inbound, outbound, state, created_at
             FROM messages WHERE sender = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![sender], parse_exchange_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Total number of recorded exchanges across all senders
    pub fn exchange_count(&self) -> DbResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .map_err(DbError::from)
    }
}

/// Parse an exchange row from the database
fn parse_exchange_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Exchange> {
    Ok(Exchange {
        id: row.get(0)?,
        sender: row.get(1)?,
        inbound: row.get(2)?,
        outbound: row.get(3)?,
        state: raw_state(row.get(4)?),
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

/// Render a stored state cell for display, decoded when it is JSON text
fn raw_state(cell: SqlValue) -> serde_json::Value {
    match cell {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Integer(i) => i.into(),
        SqlValue::Real(f) => f.into(),
        SqlValue::Text(text) => {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        }
        SqlValue::Blob(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Accepts RFC 3339 and the space-separated naive UTC form older rows use
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return naive.and_utc();
    }
    tracing::warn!(created_at = %s, "Unrecognized timestamp, showing epoch");
    DateTime::<Utc>::default()
}
