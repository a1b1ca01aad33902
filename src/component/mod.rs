//! Components - descriptors, the registry and synthesized element types.
//!
//! A component is a [`Model`](crate::model::Model) plus a
//! [`ComponentDescriptor`]. Registering both in a [`Registry`] and defining
//! a [`ViewClass`] on the platform turns every element with the selector's
//! tag into a live view.

pub mod descriptor;
pub mod host;
pub mod registry;
mod view;

pub use descriptor::{ChildRef, ComponentDescriptor, HostBindingRef, ListenerRef, PropertyRef};
pub use registry::{ComponentEntry, DirectiveDescriptor, Registry};
pub use view::{ViewClass, ViewContext, ViewInstance};
