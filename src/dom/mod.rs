//! Host platform - an in-memory, single-threaded DOM.
//!
//! Provides what the component runtime needs from a host: a node tree with
//! attributes and events, custom tag registration with deferred definition
//! callbacks, the four element lifecycle callbacks and attribute mutation
//! observers.
//!
//! # Example
//!
//! ```ignore
//! use spark_elements::dom::{Event, Window};
//!
//! let window = Window::new();
//! let doc = window.document();
//! let button = doc.create_element("button");
//! button.set_attribute("type", "submit");
//! doc.body().append_child(&button);
//!
//! let _sub = button.add_event_listener("click", |e| println!("{}", e.kind));
//! button.dispatch_event(&Event::new("click"));
//! ```

mod custom;
mod document;
mod event;
mod mutation;
mod node;

pub use custom::{CustomElement, CustomElementRegistry, ElementClass, is_valid_name};
pub use document::{Document, Window};
pub use event::Event;
pub use mutation::{MutationObserver, MutationRecord};
pub use node::{Node, NodeKind, WeakNode};
