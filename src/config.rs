//! Process configuration read from the environment

use std::path::PathBuf;
use std::time::Duration;

/// Secret accepted when `WEBHOOK_SECRET` is unset. Only fit for local testing.
pub const DEFAULT_WEBHOOK_SECRET: &str = "changeme_secret";
pub const DEFAULT_DB_PATH: &str = "data/messages.db";
pub const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_secret: String,
    pub db_path: PathBuf,
    pub port: u16,
    /// Relay endpoint for outbound replies; replies are only logged when unset
    pub delivery_url: Option<String>,
    pub delivery_timeout: Duration,
}

impl Config {
    /// Load `.env` (if any) and read the configuration from the environment
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let webhook_secret =
            lookup("WEBHOOK_SECRET").unwrap_or_else(|| DEFAULT_WEBHOOK_SECRET.to_string());

        let db_path = lookup("INZEND_DB_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);

        let port = lookup("INZEND_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let delivery_url = lookup("INZEND_DELIVERY_URL").filter(|url| !url.trim().is_empty());

        let delivery_timeout = Duration::from_secs(
            lookup("INZEND_DELIVERY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DELIVERY_TIMEOUT_SECS),
        );

        Self {
            webhook_secret,
            db_path,
            port,
            delivery_url,
            delivery_timeout,
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.webhook_secret == DEFAULT_WEBHOOK_SECRET
    }
}
