//! DOM events.

use serde::Serialize;

use crate::types::Value;

/// An event dispatched on a node or the window.
///
/// Handlers bound from templates receive the serialized form
/// (`{"type": ..., "detail": ..., "bubbles": ...}`) as their argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: Value,
    pub bubbles: bool,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            detail: Value::Null,
            bubbles: false,
        }
    }

    pub fn with_detail(kind: &str, detail: Value) -> Self {
        Self {
            detail,
            ..Self::new(kind)
        }
    }

    /// Make the event propagate to ancestors after the target.
    pub fn bubbling(mut self) -> Self {
        self.bubbles = true;
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
