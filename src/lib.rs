//! # spark-elements
//!
//! Declarative custom elements with reactive bindings for Rust.
//!
//! A component is a model (any type implementing [`Model`], or the dynamic
//! [`ModelObject`]) plus a [`ComponentDescriptor`]: a selector, a template,
//! declared inputs and outputs, host listeners. Registering it defines a
//! custom element; every element created with the selector's tag owns a fresh
//! model, renders the template into itself and keeps model fields, element
//! attributes and text in sync through targeted subscriptions.
//!
//! ## Architecture
//!
//! ```text
//! Runtime ─ Registry ─ ComponentDescriptor + model factory
//!    │
//!    └─ Window ─ CustomElementRegistry ─ ViewClass
//!                                          │ construct
//!                                          ▼
//!                   Node ── ViewInstance ── ModelCell (model + ChangeBus)
//!                                │
//!                                └─ RenderEngine ── bindings, directives
//! ```
//!
//! There is no virtual tree and no diffing: each binding subscribes to the
//! one property it reads and writes the one attribute it targets.
//!
//! ## Modules
//!
//! - [`dom`] - in-memory host platform (nodes, events, custom elements)
//! - [`model`] - models, change bus, lifecycle hooks, outputs
//! - [`template`] - template descriptions and `{{ }}` placeholders
//! - [`component`] - descriptors, registry, synthesized views
//! - [`render`] - render engine, property resolution, bindings
//! - [`directives`] - built-in `*if` and `*for`

pub mod component;
pub mod config;
pub mod directives;
pub mod dom;
pub mod error;
pub mod model;
pub mod render;
pub mod runtime;
pub mod template;
pub mod types;

pub use types::*;

pub use component::{ComponentDescriptor, Registry, ViewClass, ViewInstance};
pub use config::Config;
pub use dom::{Document, Event, Node, Window};
pub use error::{Error, Result};
pub use model::{
    EventEmitter, Hook, Hooks, Lifecycle, Model, ModelCell, ModelObject, ModelRef, Owner,
    Subscription,
};
pub use render::{Directive, DirectiveContext, PropertySource, RenderEngine};
pub use runtime::{MountHandle, Runtime};
pub use template::{TemplateNode, el, text};
