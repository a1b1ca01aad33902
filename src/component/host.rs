//! Host listeners and host bindings.
//!
//! Declared host listeners are bound once per attachment, after the first
//! render of that attachment, and released on detach:
//!
//! | Event            | Source                                              |
//! |------------------|-----------------------------------------------------|
//! | `window:resize`  | the window                                          |
//! | `input:change`   | reference `input`, or the host if there is none     |
//! | `click`          | the host element                                    |
//!
//! A source that exposes the event as a component output is subscribed
//! through the output; otherwise a native listener is attached if the event
//! is one the platform dispatches.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::descriptor::{HostBindingRef, ListenerRef};
use super::view::ViewInstance;
use crate::dom::Node;
use crate::model::{ModelRef, Subscription};
use crate::types::Value;

/// Native event names listeners may attach to.
pub const NATIVE_EVENTS: &[&str] = &[
    "abort", "blur", "change", "click", "close", "contextmenu", "dblclick", "error", "focus",
    "focusin", "focusout", "input", "keydown", "keypress", "keyup", "load", "mousedown",
    "mouseenter", "mouseleave", "mousemove", "mouseout", "mouseover", "mouseup", "pointerdown",
    "pointermove", "pointerup", "reset", "resize", "scroll", "select", "submit", "touchend",
    "touchmove", "touchstart", "unload", "wheel",
];

pub fn is_native_event(name: &str) -> bool {
    NATIVE_EVENTS.contains(&name)
}

/// Bind every host listener and host binding of `view`.
pub(crate) fn bind(view: &ViewInstance, element: &Node) -> Vec<Subscription> {
    let mut subscriptions = Vec::new();
    let mut seen = HashSet::new();

    for listener in &view.descriptor().host_listeners {
        if !seen.insert((listener.event.as_str(), listener.handler.as_str())) {
            warn!(event = listener.event.as_str(), handler = listener.handler.as_str(), "duplicate host listener discarded");
            continue;
        }
        if let Some(subscription) = bind_listener(view, element, listener) {
            subscriptions.push(subscription);
        }
    }
    for binding in &view.descriptor().host_bindings {
        subscriptions.push(bind_property(view.model(), element, binding));
    }
    subscriptions
}

fn bind_listener(view: &ViewInstance, element: &Node, listener: &ListenerRef) -> Option<Subscription> {
    let model = view.model();
    if !model.is_method(&listener.handler) {
        debug!(handler = listener.handler.as_str(), "host listener handler is not a method");
        return None;
    }
    let invoke = {
        let model = model.clone();
        let listener = listener.clone();
        move |payload: &Value| {
            let args = listener_args(&model, &listener, payload);
            model.call(&listener.handler, &args);
        }
    };

    let (prefix, event) = match listener.event.split_once(':') {
        Some((prefix, event)) => (Some(prefix), event),
        None => (None, listener.event.as_str()),
    };

    if prefix == Some("window") {
        let window = element.owner_document()?.window()?;
        trace!(event, "host listener on window");
        return Some(window.add_event_listener(event, move |e| invoke(&e.to_value())));
    }

    let source = match prefix {
        Some(name) => view.reference(name).unwrap_or_else(|| element.clone()),
        None => element.clone(),
    };
    if let Some(output) = source.custom().and_then(|custom| custom.output(event)) {
        trace!(event, "host listener on output");
        return Some(output.subscribe(invoke));
    }
    if is_native_event(event) {
        trace!(event, "host listener on native event");
        return Some(source.add_event_listener(event, move |e| invoke(&e.to_value())));
    }
    debug!(event, source = %source.node_name(), "no output or native event to listen to");
    None
}

/// Arguments for a host listener call. No declared arguments passes the
/// payload alone.
fn listener_args(model: &ModelRef, listener: &ListenerRef, payload: &Value) -> Vec<Value> {
    if listener.args.is_empty() {
        return vec![payload.clone()];
    }
    listener
        .args
        .iter()
        .map(|arg| match arg.as_str() {
            "$event" => payload.clone(),
            path => model.get(path).unwrap_or(Value::Null),
        })
        .collect()
}

fn bind_property(model: &ModelRef, element: &Node, binding: &HostBindingRef) -> Subscription {
    let update = {
        let model = model.clone();
        let element = element.downgrade();
        let binding = binding.clone();
        move || {
            if let Some(element) = element.upgrade() {
                let value = model.get(&binding.property).unwrap_or(Value::Null);
                element.set_property(&binding.host_property, value);
            }
        }
    };
    update();
    model.subscribe(&binding.property, update)
}
