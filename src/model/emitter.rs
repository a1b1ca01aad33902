//! Component outputs.
//!
//! A model exposes an [`EventEmitter`] per declared output. Parents subscribe
//! through `(event)` template bindings or host listeners; the model calls
//! [`EventEmitter::emit`] with a payload.

use super::bus::{Subscription, Topics};
use crate::types::Value;

const TOPIC: &str = "emit";

/// Payload-carrying notification list. Clones share the same subscribers.
#[derive(Clone, Default)]
pub struct EventEmitter {
    topics: Topics<Value>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every subscriber. Returns how many received it.
    pub fn emit(&self, payload: Value) -> usize {
        self.topics.publish(TOPIC, &payload)
    }

    pub fn subscribe(&self, handler: impl Fn(&Value) + 'static) -> Subscription {
        self.topics.subscribe(TOPIC, handler)
    }

    pub fn subscriber_count(&self) -> usize {
        self.topics.count(TOPIC)
    }
}
