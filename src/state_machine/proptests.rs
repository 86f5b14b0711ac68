//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::{DEMO_INFO_FIELD, HANDOFF_CONTACT_FIELD};
use super::transition::*;
use super::*;
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::None),
        Just(Step::Menu),
        Just(Step::CollectDemoInfo),
        Just(Step::Handoff),
        Just(Step::Complete),
        "[a-z_]{1,12}".prop_map(Step::from),
    ]
}

fn arb_fields() -> impl Strategy<Value = BTreeMap<String, Value>> {
    proptest::collection::btree_map(
        prop_oneof![
            Just(DEMO_INFO_FIELD.to_string()),
            Just(HANDOFF_CONTACT_FIELD.to_string()),
            "[a-z]{1,8}",
        ],
        "[a-zA-Z0-9 ,@.]{0,20}".prop_map(Value::String),
        0..4,
    )
    .prop_map(|mut fields| {
        fields.remove("step");
        fields
    })
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    (arb_step(), arb_fields()).prop_map(|(step, fields)| ConvState { step, fields })
}

/// Inbound text biased towards menu choices so deep paths get exercised
fn arb_inbound() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("1".to_string()),
        Just("2".to_string()),
        Just("3".to_string()),
        Just(" 1 ".to_string()),
        Just("menu".to_string()),
        Just(String::new()),
        ".{0,30}",
    ]
}

fn is_reachable_step(step: &Step) -> bool {
    matches!(
        step,
        Step::Menu | Step::CollectDemoInfo | Step::Handoff | Step::Complete
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_transition_is_total(state in arb_state(), inbound in ".*") {
        let result = transition(&state, &inbound);
        prop_assert!(is_reachable_step(&result.new_state.step));
        prop_assert!(!result.reply.is_empty());
    }

    #[test]
    fn prop_transition_is_deterministic(state in arb_state(), inbound in arb_inbound()) {
        prop_assert_eq!(transition(&state, &inbound), transition(&state, &inbound));
    }

    #[test]
    fn prop_first_contact_always_greets(inbound in ".*") {
        let result = transition(&ConvState::initial(), &inbound);
        prop_assert_eq!(result.new_state.step, Step::Menu);
        prop_assert_eq!(result.reply, GREETING);
    }

    #[test]
    fn prop_menu_rejects_anything_but_choices(inbound in ".*") {
        let trimmed = inbound.trim();
        prop_assume!(trimmed != "1" && trimmed != "2" && trimmed != "3");
        let result = transition(&ConvState::at(Step::Menu), &inbound);
        prop_assert_eq!(result.new_state.step, Step::Menu);
        prop_assert_eq!(result.reply, NOT_UNDERSTOOD);
    }

    #[test]
    fn prop_fields_are_never_cleared(state in arb_state(), inbound in arb_inbound()) {
        let written = match state.step {
            Step::CollectDemoInfo => Some(DEMO_INFO_FIELD),
            Step::Handoff => Some(HANDOFF_CONTACT_FIELD),
            _ => None,
        };
        let result = transition(&state, &inbound);

        for (key, value) in &state.fields {
            if Some(key.as_str()) == written {
                prop_assert_eq!(result.new_state.field(key), Some(inbound.as_str()));
            } else {
                prop_assert_eq!(result.new_state.fields.get(key), Some(value));
            }
        }
        let expected_len = state.fields.len()
            + usize::from(written.is_some_and(|k| !state.fields.contains_key(k)));
        prop_assert_eq!(result.new_state.fields.len(), expected_len);
    }

    #[test]
    fn prop_replay_reconstructs_each_turn(
        inbounds in proptest::collection::vec(arb_inbound(), 0..12)
    ) {
        let mut state = ConvState::initial();
        for (n, inbound) in inbounds.iter().enumerate() {
            state = transition(&state, inbound).new_state;
            let replayed = replay(inbounds.iter().take(n + 1).map(String::as_str));
            prop_assert_eq!(&replayed, &state);
        }
    }

    #[test]
    fn prop_state_survives_serialization(state in arb_state()) {
        let json = serde_json::to_string(&state).unwrap();
        let back: ConvState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, state);
    }
}
