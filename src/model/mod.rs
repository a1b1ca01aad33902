//! Model layer - component state, change notification and lifecycle hooks.
//!
//! A component's state lives in a [`Model`]. The engine never touches the
//! model directly: it goes through a [`ModelCell`] that owns the model and a
//! [`ChangeBus`], so every write that changes a value notifies exactly the
//! subscribers of that property.
//!
//! # Architecture
//!
//! ```text
//! ModelCell ── RefCell<Box<dyn Model>>     state + hooks + methods
//!           └─ ChangeBus                   per-property subscribers
//!
//! Owner::Model(ModelRef)   ┐
//! Owner::Element(Node)     ┘ one addressable source for bindings
//! ```
//!
//! Typed models implement [`Model`] by hand; [`ModelObject`] is a dynamic
//! property bag for quick components and directive scopes.

mod bus;
mod cell;
mod emitter;
pub mod lifecycle;
mod object;
pub mod protocol;

pub use bus::{ChangeBus, Subscription, Topics};
pub use cell::{ModelCell, ModelRef};
pub use emitter::EventEmitter;
pub use lifecycle::{Hook, Hooks, Lifecycle};
pub use object::{HookFn, Method, ModelObject};

use crate::dom::Node;
use crate::types::{Value, assign, lookup, split_root};

// =============================================================================
// Model trait
// =============================================================================

/// Component state addressed by property name.
///
/// Only `property` and `set_property` are required. Implement
/// `property_names` to get change notifications for fields mutated inside
/// methods and hooks: the cell diffs those names around every call.
pub trait Model: Lifecycle + 'static {
    fn property(&self, name: &str) -> Option<Value>;

    /// Store `value` under `name`. Returns false if the model rejects it.
    fn set_property(&mut self, name: &str, value: Value) -> bool;

    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_method(&self, _name: &str) -> bool {
        false
    }

    fn call(&mut self, _method: &str, _args: &[Value]) -> Option<Value> {
        None
    }

    /// Output emitter for a declared output field.
    fn output(&self, _name: &str) -> Option<EventEmitter> {
        None
    }

    /// Receive an element for a view-child or view-binding field.
    fn attach_element(&mut self, _field: &str, _element: Node) -> bool {
        false
    }
}

// =============================================================================
// Owner
// =============================================================================

/// The object a binding path is resolved against.
///
/// An element owner that was a placeholder follows the element that
/// replaced it.
#[derive(Clone)]
pub enum Owner {
    /// A component model or directive scope.
    Model(ModelRef),
    /// A host element or captured reference.
    Element(Node),
}

impl Owner {
    pub fn read(&self, path: &str) -> Option<Value> {
        match self {
            Owner::Model(model) => model.get(path),
            Owner::Element(node) => {
                let (root, rest) = split_root(path);
                lookup(&node.current().property(root)?, rest)
            }
        }
    }

    /// Write `value` at `path`. Returns whether anything was written.
    pub fn write(&self, path: &str, value: Value) -> bool {
        match self {
            Owner::Model(model) => model.set(path, value),
            Owner::Element(node) => {
                let node = node.current();
                let (root, rest) = split_root(path);
                if rest.is_empty() {
                    node.set_property(root, value);
                    return true;
                }
                let mut base = node.property(root).unwrap_or(Value::Null);
                if !assign(&mut base, rest, value) {
                    return false;
                }
                node.set_property(root, base);
                true
            }
        }
    }

    pub fn is_callable(&self, path: &str) -> bool {
        match self {
            Owner::Model(model) => model.is_method(path),
            Owner::Element(_) => false,
        }
    }

    pub fn invoke(&self, path: &str, args: &[Value]) -> Option<Value> {
        match self {
            Owner::Model(model) => model.call(path, args),
            Owner::Element(_) => None,
        }
    }

    /// Subscribe to changes of `property`. A method depends on unknown
    /// properties, so subscribing to one listens to every change.
    pub fn subscribe(&self, property: &str, handler: impl Fn() + 'static) -> Subscription {
        match self {
            Owner::Model(model) if model.is_method(split_root(property).0) => {
                model.bus().subscribe_all(handler)
            }
            Owner::Model(model) => model.subscribe(property, handler),
            Owner::Element(node) => node.current().on_change(property, handler),
        }
    }

    pub fn emit(&self, property: &str) -> usize {
        match self {
            Owner::Model(model) => model.bus().emit(property),
            Owner::Element(node) => node.current().emit_change(property),
        }
    }
}

impl std::fmt::Debug for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Model(_) => f.write_str("Owner::Model"),
            Owner::Element(node) => write!(f, "Owner::Element({})", node.node_name()),
        }
    }
}
