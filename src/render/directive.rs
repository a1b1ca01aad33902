//! Structural directive instantiation.
//!
//! A directive replaces its template position with a comment anchor
//! (`*for=item of items`) and owns whatever it later inserts next to it.
//! The anchor's teardown destroys the directive.

use std::cell::RefCell;

use tracing::{debug, error};

use super::engine::RenderEngine;
use crate::dom::{Document, Node};
use crate::model::lifecycle::{Hook, Lifecycle, dispatch};
use crate::template::{DirectiveTemplate, TemplateNode};

/// A structural directive instance. Lifecycle hooks are its only interface
/// with the engine: `on_init` after construction, `on_destroy` at teardown.
pub trait Directive: Lifecycle {}

/// What a directive constructor receives.
#[derive(Clone)]
pub struct DirectiveContext {
    /// Engine of the template the directive appears in.
    pub engine: RenderEngine,
    /// Comment node marking the directive's position.
    pub anchor: Node,
    pub selector: String,
    /// Argument text as written.
    pub argument: String,
    /// Template the directive renders.
    pub owner: Option<TemplateNode>,
}

impl std::fmt::Debug for DirectiveContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveContext")
            .field("selector", &self.selector)
            .field("argument", &self.argument)
            .finish()
    }
}

impl RenderEngine {
    pub(crate) fn instantiate_directive(&self, document: &Document, template: &DirectiveTemplate) -> Node {
        let anchor = document.create_comment(&format!("{}={}", template.selector, template.argument));

        let Some(descriptor) = self.registry().directive(&template.selector) else {
            debug!(selector = template.selector.as_str(), "no directive registered, anchor left inert");
            return anchor;
        };

        let context = DirectiveContext {
            engine: self.clone(),
            anchor: anchor.clone(),
            selector: template.selector.clone(),
            argument: template.argument.clone(),
            owner: template.owner.as_deref().cloned(),
        };
        let mut instance = match (descriptor.constructor)(context) {
            Ok(instance) => instance,
            Err(err) => {
                error!(selector = template.selector.as_str(), error = %err, "directive construction failed");
                self.report(err);
                return anchor;
            }
        };

        dispatch(&mut *instance, Hook::OnInit);

        let slot = RefCell::new(Some(instance));
        anchor.on_teardown(Box::new(move || {
            if let Some(mut instance) = slot.take() {
                dispatch(&mut *instance, Hook::OnDestroy);
            }
        }));
        anchor
    }
}
