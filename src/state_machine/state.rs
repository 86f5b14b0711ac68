//! Conversation state types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Field written when the sender answers the demo-booking prompt
pub const DEMO_INFO_FIELD: &str = "demo_info";

/// Field written when the sender answers the handoff prompt
pub const HANDOFF_CONTACT_FIELD: &str = "handoff_contact";

// ============================================================================
// Step
// ============================================================================

/// Where a sender is in the scripted dialogue
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Step {
    /// No exchange recorded yet (or the stored state was unreadable)
    #[default]
    None,
    Menu,
    CollectDemoInfo,
    Handoff,
    Complete,
    /// A tag this build does not know; routed through the catch-all transition
    Unrecognized(String),
}

impl Step {
    pub fn as_str(&self) -> &str {
        match self {
            Step::None => "",
            Step::Menu => "menu",
            Step::CollectDemoInfo => "collect_demo_info",
            Step::Handoff => "handoff",
            Step::Complete => "complete",
            Step::Unrecognized(tag) => tag,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Step::None)
    }
}

impl From<String> for Step {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "" => Step::None,
            "menu" => Step::Menu,
            "collect_demo_info" => Step::CollectDemoInfo,
            "handoff" => Step::Handoff,
            "complete" => Step::Complete,
            _ => Step::Unrecognized(tag),
        }
    }
}

impl From<Step> for String {
    fn from(step: Step) -> Self {
        match step {
            Step::Unrecognized(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::None => f.write_str("none"),
            other => f.write_str(other.as_str()),
        }
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Conversation state for one sender.
///
/// Persisted as a flat JSON object: `{"step": "menu", "demo_info": "..."}`.
/// Free-text answers collected along the way live next to `step` and are
/// carried forward by every transition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConvState {
    #[serde(default, skip_serializing_if = "Step::is_none")]
    pub step: Step,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl ConvState {
    /// The implicit state of a sender with no recorded exchange
    pub fn initial() -> Self {
        Self::default()
    }

    #[allow(dead_code)] // Used in tests
    pub fn at(step: Step) -> Self {
        Self {
            step,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Read a collected free-text answer
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Move to `step`, keeping every accumulated field
    pub(crate) fn advanced_to(&self, step: Step) -> Self {
        Self {
            step,
            fields: self.fields.clone(),
        }
    }
}
