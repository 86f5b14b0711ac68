//! Pure state transition function
//!
//! Every (state, inbound text) pair has exactly one outcome. Malformed or
//! empty input falls through to the retry/catch-all rows instead of failing.

use super::state::{DEMO_INFO_FIELD, HANDOFF_CONTACT_FIELD};
use super::{ConvState, Step};

pub const GREETING: &str = "Hi 👋 I am the automated assistant.
Reply with:
1 - Book a demo
2 - Pricing
3 - Talk to human";
pub const DEMO_PROMPT: &str =
    "Great — to book a demo, please share your name and preferred date.";
pub const PRICING: &str =
    "We offer tiered packages starting at $2,000. Reply 'docs' for an overview.";
pub const HANDOFF_PROMPT: &str =
    "One moment — I will route you to a human. Please provide your email.";
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand. Reply with 1, 2 or 3.";
pub const DEMO_ACK: &str =
    "Thanks — a human will follow up within one business day. Reply 'menu' to see options.";
pub const HANDOFF_ACK: &str =
    "Thanks — a human will contact you. Reply 'menu' to return to main options.";
pub const BACK_TO_MENU: &str = "Reply 'menu' to see options again.";

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub reply: &'static str,
}

impl TransitionResult {
    fn new(new_state: ConvState, reply: &'static str) -> Self {
        Self { new_state, reply }
    }
}

/// Pure transition function
///
/// Given the same state and inbound text it always produces the same next
/// state and reply, with no I/O.
#[must_use]
pub fn transition(state: &ConvState, inbound: &str) -> TransitionResult {
    match &state.step {
        Step::None => TransitionResult::new(state.advanced_to(Step::Menu), GREETING),

        Step::Menu => match inbound.trim() {
            "1" => TransitionResult::new(state.advanced_to(Step::CollectDemoInfo), DEMO_PROMPT),
            "2" => TransitionResult::new(state.advanced_to(Step::Menu), PRICING),
            "3" => TransitionResult::new(state.advanced_to(Step::Handoff), HANDOFF_PROMPT),
            _ => TransitionResult::new(state.advanced_to(Step::Menu), NOT_UNDERSTOOD),
        },

        // Free text is stored as given; no format validation
        Step::CollectDemoInfo => TransitionResult::new(
            state
                .advanced_to(Step::Complete)
                .with_field(DEMO_INFO_FIELD, inbound),
            DEMO_ACK,
        ),

        Step::Handoff => TransitionResult::new(
            state
                .advanced_to(Step::Complete)
                .with_field(HANDOFF_CONTACT_FIELD, inbound),
            HANDOFF_ACK,
        ),

        Step::Complete | Step::Unrecognized(_) => {
            TransitionResult::new(state.advanced_to(Step::Menu), BACK_TO_MENU)
        }
    }
}

/// Fold `transition` over a sender's inbound history, starting from the
/// initial state.
#[must_use]
#[allow(dead_code)] // Reconstruction check, exercised by tests
pub fn replay<'a, I>(inbounds: I) -> ConvState
where
    I: IntoIterator<Item = &'a str>,
{
    inbounds
        .into_iter()
        .fold(ConvState::initial(), |state, inbound| {
            transition(&state, inbound).new_state
        })
}
