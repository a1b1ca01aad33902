//! Model change protocol.
//!
//! The three primitives the binding engine is built on. A subscription made
//! here is owned by the target node: it is released by the node's teardown,
//! never by the owner it listens to.

use tracing::trace;

use super::Owner;
use crate::dom::Node;

/// Run `model_to_view` whenever `property` of `owner` changes.
pub fn subscribe_one_way(
    owner: &Owner,
    property: &str,
    node: &Node,
    attribute: &str,
    model_to_view: impl Fn() + 'static,
) {
    trace!(property, attribute, target = %node.node_name(), "one-way subscription");
    let subscription = owner.subscribe(property, model_to_view);
    node.on_teardown(subscription.into_cleanup());
}

/// Like [`subscribe_one_way`], plus run `view_to_model` whenever `node`
/// signals a change of `attribute`.
pub fn subscribe_two_way(
    owner: &Owner,
    property: &str,
    node: &Node,
    attribute: &str,
    model_to_view: impl Fn() + 'static,
    view_to_model: impl Fn() + 'static,
) {
    subscribe_one_way(owner, property, node, attribute, model_to_view);
    let subscription = node.on_change(attribute, view_to_model);
    node.on_teardown(subscription.into_cleanup());
}

/// Announce a change of `property` on `owner`. Returns how many subscribers ran.
pub fn emit_change(owner: &Owner, property: &str) -> usize {
    owner.emit(property)
}
