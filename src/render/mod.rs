//! Render engine - turns templates into live host nodes.
//!
//! One [`RenderEngine`] exists per component view. It materializes the
//! component's template into the host element and wires every dynamic
//! attribute to the model. Structural directives get scoped child engines
//! whose local variables shadow the view's properties.
//!
//! # Architecture
//!
//! ```text
//! render_view(host)
//!   ├─ teardown previous output
//!   ├─ pre-pass: create every `#name` element, store as reference
//!   ├─ assign declared view children to model fields
//!   └─ create_element(template)            (recursive)
//!        ├─ Text       → text node + interpolation
//!        ├─ Element    → tag resolution, attribute dispatch, children
//!        │                 #ref  [(two-way)]  [one-way]  (event)  {{ }}
//!        ├─ Directive  → comment anchor + directive instance
//!        └─ Raw        → inserted as-is
//! ```
//!
//! Every subscription a binding makes is registered on the node it targets
//! and released by that node's teardown. Binding errors are logged, recorded
//! in [`RenderEngine::errors`] and never stop sibling nodes from rendering.

mod binding;
mod directive;
mod engine;
mod interpolate;
mod resolve;

pub use binding::{Binding, Direction};
pub use directive::{Directive, DirectiveContext};
pub use engine::{RenderEngine, WeakEngine};
pub use interpolate::substitute;
pub use resolve::PropertySource;
