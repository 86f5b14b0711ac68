//! Per-sender turn serialization
//!
//! A turn reads a sender's latest state and later appends the next one. Two
//! turns for the same sender running at once would both read the same state
//! and the later append would silently discard the earlier transition. Turns
//! for one sender therefore queue on a shared async mutex; different senders
//! never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct SenderLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn for `sender` is in flight
    pub async fn acquire(&self, sender: &str) -> SenderGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // A waiter cancelled before it got the lock leaves an entry nobody holds
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots
                .entry(sender.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        SenderGuard {
            locks: self,
            sender: sender.to_string(),
            guard: Some(slot.lock_owned().await),
        }
    }

    /// Number of senders with a turn in flight or queued
    #[allow(dead_code)] // Used in tests
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held for the duration of one turn
pub struct SenderGuard<'a> {
    locks: &'a SenderLocks,
    sender: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SenderGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // The map and this guard hold the only references: nobody is queued
        if let Some(slot) = slots.get(&self.sender) {
            if Arc::strong_count(slot) <= 2 {
                slots.remove(&self.sender);
            }
        }
        self.guard.take();
    }
}
