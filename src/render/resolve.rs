//! Property path resolution.
//!
//! A view expression (`items.length`, `#child.value`, `fullName()`) is
//! resolved to the owner it must be read from:
//!
//! 1. directive scope locals, then scope references (scoped engines only);
//! 2. a declared input's view-facing alias, rewritten to the model name;
//! 3. a captured reference (`name` or `#name`), which must be an element;
//! 4. the whole path on the model.

use tracing::trace;

use super::engine::RenderEngine;
use super::interpolate::TEXT_CONTENT;
use crate::dom::Node;
use crate::error::{Error, Result};
use crate::model::{Owner, Subscription};
use crate::types::{Value, split_root};

/// A resolved, bindable address.
#[derive(Debug, Clone)]
pub struct PropertySource {
    pub owner: Owner,
    /// Path relative to the owner.
    pub path: String,
    /// The expression ended in `()`.
    pub call: bool,
}

impl PropertySource {
    pub fn new(owner: Owner, path: &str, call: bool) -> Self {
        Self {
            owner,
            path: path.to_string(),
            call,
        }
    }

    /// Whether the path names something that exists right now.
    pub fn exists(&self) -> bool {
        self.owner.is_callable(&self.path) || self.read().is_some()
    }

    pub fn read(&self) -> Option<Value> {
        self.owner.read(&self.path)
    }

    /// Current value, invoking the path on its owner if it is a method.
    pub fn evaluate(&self) -> Option<Value> {
        if self.owner.is_callable(&self.path) {
            return self.owner.invoke(&self.path, &[]);
        }
        self.read()
    }

    pub fn write(&self, value: Value) -> bool {
        self.owner.write(&self.path, value)
    }

    pub fn subscribe(&self, handler: impl Fn() + 'static) -> Subscription {
        self.owner.subscribe(&self.path, handler)
    }
}

impl RenderEngine {
    /// Resolve a view expression to a [`PropertySource`].
    ///
    /// Fails only when the expression is empty or names a reference that is
    /// not an element. Names that resolve nowhere produce a source whose
    /// reads return nothing.
    pub fn resolve_property(&self, expression: &str) -> Result<PropertySource> {
        let expression = expression.trim();
        let (path, call) = match expression.strip_suffix("()") {
            Some(path) => (path.trim(), true),
            None => (expression, false),
        };
        if path.is_empty() {
            return Err(Error::EmptyExpression {
                context: expression.to_string(),
            });
        }
        let (root, rest) = split_root(path);
        let name = root.strip_prefix('#').unwrap_or(root);

        if let Some(parent) = self.parent() {
            if let Some(locals) = self.locals() {
                if locals.has(root) {
                    trace!(path, "resolved to directive scope");
                    return Ok(PropertySource::new(Owner::Model(locals.clone()), path, call));
                }
            }
            if let Some(node) = self.own_reference(name) {
                return element_source(name, node, rest, call);
            }
            return parent.resolve_property(expression);
        }

        let view = self.view();
        if let Some(input) = view.descriptor.input_for(root) {
            let model_path = if rest.is_empty() {
                input.model.clone()
            } else {
                format!("{}.{rest}", input.model)
            };
            trace!(path, model_path = model_path.as_str(), "resolved through input alias");
            return Ok(PropertySource::new(Owner::Model(view.model.clone()), &model_path, call));
        }

        if let Some(node) = self.own_reference(name) {
            return element_source(name, node, rest, call);
        }

        Ok(PropertySource::new(Owner::Model(view.model.clone()), path, call))
    }

    /// Make plain attribute writes on an element source signal a change.
    ///
    /// Accessor-backed properties already signal through the component's
    /// model. The watch is released with `target`.
    pub(crate) fn watch_source(&self, source: &PropertySource, target: &Node) {
        let Owner::Element(element) = &source.owner else { return };
        let element = element.current();
        let (root, _) = split_root(&source.path);
        if root.is_empty() || root == TEXT_CONTENT || element.intercepts(root) {
            return;
        }
        trace!(reference = %element.node_name(), attribute = root, "watching element source");
        let subscription = self.mutation_observer().observe(&element, Some(root));
        target.on_teardown(subscription.into_cleanup());
    }
}

fn element_source(
    name: &str,
    node: Node,
    rest: &str,
    call: bool,
) -> Result<PropertySource> {
    if !node.is_element() {
        return Err(Error::NotAnElement {
            reference: name.to_string(),
            kind: node.kind_name(),
        });
    }
    trace!(reference = name, path = rest, "resolved to reference");
    Ok(PropertySource::new(Owner::Element(node), rest, call))
}
