//! Property and event bindings.
//!
//! A binding copies the source value once when it is built and then keeps
//! the target in sync through the model change protocol. A property binding
//! is wired even when its source does not exist yet: a missing value leaves
//! the target untouched until the source appears. Only event bindings to
//! something that is not a method come out inert.

use tracing::{debug, trace};

use super::engine::RenderEngine;
use super::resolve::PropertySource;
use crate::dom::Node;
use crate::model::protocol;
use crate::types::to_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `[attr]="path"`
    ModelToView,
    /// `(event)="method"`
    ViewToModel,
    /// `[(attr)]="path"`
    Both,
}

/// Outcome of wiring one attribute.
#[derive(Debug, Clone)]
pub struct Binding {
    pub source: PropertySource,
    pub attribute: String,
    pub direction: Direction,
    /// False when an event handler was not a method and nothing was wired.
    pub live: bool,
}

impl Binding {
    fn new(source: &PropertySource, attribute: &str, direction: Direction, live: bool) -> Self {
        Self {
            source: source.clone(),
            attribute: attribute.to_string(),
            direction,
            live,
        }
    }
}

/// Event that signals a user edit of `attribute` on a built-in form control.
fn change_event(node: &Node, attribute: &str) -> Option<&'static str> {
    if attribute != "value" || node.is_custom() {
        return None;
    }
    match node.tag()? {
        "input" => Some("input"),
        "select" | "textarea" => Some("change"),
        _ => None,
    }
}

/// Closure that copies the source into `attribute` of `node`. A missing
/// source value leaves the target as it is.
fn model_to_view(source: &PropertySource, node: &Node, attribute: &str) -> impl Fn() + 'static {
    let source = source.clone();
    let node = node.downgrade();
    let attribute = attribute.to_string();
    move || {
        let Some(node) = node.upgrade() else { return };
        match source.evaluate() {
            Some(value) => node.set_property(&attribute, value),
            None => trace!(path = source.path.as_str(), "source missing, target left as is"),
        }
    }
}

impl RenderEngine {
    /// `[attribute]="source"`
    pub fn bind_one_way(&self, source: &PropertySource, node: &Node, attribute: &str) -> Binding {
        if !source.exists() {
            debug!(path = source.path.as_str(), attribute, "binding source not found yet");
        }
        self.watch_source(source, node);
        let update = model_to_view(source, node, attribute);
        update();
        protocol::subscribe_one_way(&source.owner, &source.path, node, attribute, update);
        Binding::new(source, attribute, Direction::ModelToView, true)
    }

    /// `[(attribute)]="source"`
    ///
    /// The view side is signalled by the `input`/`change` event for form
    /// controls, by the component's own model for custom elements, and by an
    /// attribute mutation observer for everything else.
    pub fn bind_two_way(&self, source: &PropertySource, node: &Node, attribute: &str) -> Binding {
        if !source.exists() {
            debug!(path = source.path.as_str(), attribute, "binding source not found yet");
        }
        self.watch_source(source, node);
        let update = model_to_view(source, node, attribute);
        update();

        let write_back = {
            let source = source.clone();
            let node = node.downgrade();
            let attribute = attribute.to_string();
            move || {
                let Some(node) = node.upgrade() else { return };
                if let Some(value) = node.property(&attribute) {
                    let current = source.read().map(|v| to_text(&v));
                    if current.as_deref() != Some(to_text(&value).as_str()) {
                        trace!(attribute = attribute.as_str(), "view to model");
                        source.write(value);
                    }
                }
            }
        };
        protocol::subscribe_two_way(&source.owner, &source.path, node, attribute, update, write_back);

        match change_event(node, attribute) {
            Some(event) => {
                let weak = node.downgrade();
                let attribute = attribute.to_string();
                let subscription = node.add_event_listener(event, move |_| {
                    if let Some(node) = weak.upgrade() {
                        node.emit_change(&attribute);
                    }
                });
                node.on_teardown(subscription.into_cleanup());
            }
            None if node.is_custom() => {}
            None => {
                let subscription = self.mutation_observer().observe(node, Some(attribute));
                node.on_teardown(subscription.into_cleanup());
            }
        }
        Binding::new(source, attribute, Direction::Both, true)
    }

    /// `(event)="method"`
    ///
    /// A declared output of a custom element is preferred over a native event
    /// of the same name. The handler receives the payload as its argument.
    pub fn bind_event(&self, source: &PropertySource, node: &Node, event: &str) -> Binding {
        if !source.owner.is_callable(&source.path) {
            debug!(handler = source.path.as_str(), event, "event handler is not a method, left inert");
            return Binding::new(source, event, Direction::ViewToModel, false);
        }
        let output = node.custom().and_then(|custom| custom.output(event));
        let subscription = match output {
            Some(emitter) => {
                let source = source.clone();
                emitter.subscribe(move |payload| {
                    source.owner.invoke(&source.path, std::slice::from_ref(payload));
                })
            }
            None => {
                let source = source.clone();
                node.add_event_listener(event, move |e| {
                    source.owner.invoke(&source.path, &[e.to_value()]);
                })
            }
        };
        node.on_teardown(subscription.into_cleanup());
        Binding::new(source, event, Direction::ViewToModel, true)
    }
}
