//! Built-in structural directives.
//!
//! | Selector | Directive        |
//! |----------|------------------|
//! | `*if`    | [`IfDirective`]  |
//! | `*for`   | [`ForDirective`] |

mod for_directive;
mod if_directive;

pub use for_directive::{ForArgument, ForDirective};
pub use if_directive::IfDirective;

use crate::component::Registry;
use crate::error::Result;
use crate::render::Directive;

/// Register `*if` and `*for` on `registry`.
pub fn register_builtin(registry: &Registry) -> Result<()> {
    registry.register_directive("*if", |context| {
        Ok(Box::new(IfDirective::new(context)?) as Box<dyn Directive>)
    })?;
    registry.register_directive("*for", |context| {
        Ok(Box::new(ForDirective::new(context)?) as Box<dyn Directive>)
    })?;
    Ok(())
}
