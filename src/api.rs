//! HTTP API for the bot
//!
//! The provider webhook, a health check and a read-only audit view.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::db::Database;
use crate::runtime::{DatabaseStorage, MessageDelivery, ProductionProcessor};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<ProductionProcessor>,
    pub webhook_secret: Arc<str>,
}

impl AppState {
    pub fn new(db: Database, delivery: Arc<dyn MessageDelivery>, webhook_secret: &str) -> Self {
        Self {
            processor: Arc::new(ProductionProcessor::new(
                DatabaseStorage::new(db),
                delivery,
            )),
            webhook_secret: Arc::from(webhook_secret),
        }
    }
}
