//! Turn processor: load → advance → deliver → append

use super::locks::SenderLocks;
use super::traits::{ExchangeStore, MessageDelivery};
use super::{InboundMessage, TurnError, TurnOutcome};
use crate::state_machine::state::{DEMO_INFO_FIELD, HANDOFF_CONTACT_FIELD};
use crate::state_machine::{transition, Step, TransitionResult};
use std::sync::Arc;

/// Generic turn processor that can work with any storage and delivery implementation
pub struct TurnProcessor<S, D>
where
    S: ExchangeStore,
    D: MessageDelivery,
{
    inner: Arc<TurnWorker<S, D>>,
}

/// State shared with the task each turn runs on
struct TurnWorker<S, D> {
    storage: S,
    delivery: D,
    locks: SenderLocks,
}

impl<S, D> TurnProcessor<S, D>
where
    S: ExchangeStore + 'static,
    D: MessageDelivery + 'static,
{
    pub fn new(storage: S, delivery: D) -> Self {
        Self {
            inner: Arc::new(TurnWorker {
                storage,
                delivery,
                locks: SenderLocks::new(),
            }),
        }
    }

    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    /// Process one inbound message for one sender.
    ///
    /// The turn runs on its own task: once started it delivers and records
    /// even if the caller stops waiting. The exchange is recorded whether or
    /// not delivery succeeded. A storage failure on either end of the turn
    /// aborts it with `TurnError`.
    pub async fn process_turn(&self, inbound: InboundMessage) -> Result<TurnOutcome, TurnError> {
        let worker = Arc::clone(&self.inner);
        tokio::spawn(async move { worker.run(inbound).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Turn task did not finish");
                TurnError::Aborted(e.to_string())
            })?
    }
}

impl<S, D> TurnWorker<S, D>
where
    S: ExchangeStore,
    D: MessageDelivery,
{
    #[tracing::instrument(
        name = "turn",
        skip_all,
        fields(turn_id = %uuid::Uuid::new_v4(), sender = %inbound.sender)
    )]
    async fn run(&self, inbound: InboundMessage) -> Result<TurnOutcome, TurnError> {
        let _guard = self.locks.acquire(&inbound.sender).await;

        let state = self
            .storage
            .load_latest_state(&inbound.sender)
            .await
            .map_err(TurnError::StateLoad)?;

        let TransitionResult { new_state, reply } = transition(&state, &inbound.text);
        tracing::debug!(from = %state.step, to = %new_state.step, "Advanced conversation");

        let delivered = match self.delivery.deliver(&inbound.sender, reply).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Reply delivery failed, recording exchange anyway");
                false
            }
        };

        let exchange_id = self
            .storage
            .append_exchange(&inbound.sender, &inbound.text, reply, &new_state)
            .await
            .map_err(TurnError::Append)?;

        tracing::info!(exchange_id, step = %new_state.step, delivered, "Turn recorded");
        if new_state.step == Step::Complete {
            tracing::info!(
                exchange_id,
                demo_info = new_state.field(DEMO_INFO_FIELD),
                handoff_contact = new_state.field(HANDOFF_CONTACT_FIELD),
                "Lead captured, awaiting human follow-up"
            );
        }

        Ok(TurnOutcome {
            exchange_id,
            reply: reply.to_string(),
            delivered,
            state: new_state,
        })
    }
}
