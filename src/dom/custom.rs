//! Custom element registration.
//!
//! An [`ElementClass`] is what gets defined under a tag name; the platform
//! calls [`ElementClass::construct`] once per element it creates with that
//! tag and keeps the returned [`CustomElement`] on the node. Lifecycle
//! callbacks and attribute/property access on the node are routed through it.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::node::Node;
use crate::error::Error;
use crate::model::{EventEmitter, Subscription};
use crate::types::{Cleanup, Value};

// =============================================================================
// Traits
// =============================================================================

/// A definable element type.
pub trait ElementClass {
    /// Attribute names whose changes reach [`CustomElement::attribute_changed`].
    fn observed_attributes(&self) -> Vec<String> {
        Vec::new()
    }

    fn construct(&self, element: &Node) -> Rc<dyn CustomElement>;
}

/// Per-element behaviour attached by an [`ElementClass`].
///
/// The accessor methods form a dispatch table: for every name where
/// `intercepts` is true, attribute and property access on the node goes to
/// `read_property`/`write_property` instead of native attribute storage.
pub trait CustomElement: 'static {
    fn connected(&self, _element: &Node) {}
    fn disconnected(&self, _element: &Node) {}
    fn adopted(&self, _element: &Node) {}
    fn attribute_changed(
        &self,
        _element: &Node,
        _name: &str,
        _old: Option<&str>,
        _new: Option<&str>,
    ) {
    }

    fn intercepts(&self, _name: &str) -> bool {
        false
    }
    fn read_property(&self, _name: &str) -> Option<Value> {
        None
    }
    fn write_property(&self, _element: &Node, _name: &str, _value: Value) {}

    /// Change signal for `name`, if this element provides its own. Hands the
    /// handler back when it does not.
    fn on_property_change(
        &self,
        _name: &str,
        handler: Box<dyn Fn()>,
    ) -> Result<Subscription, Box<dyn Fn()>> {
        Err(handler)
    }
    fn emit_property_change(&self, _name: &str) -> Option<usize> {
        None
    }

    /// Component output exposed under `name`.
    fn output(&self, _name: &str) -> Option<EventEmitter> {
        None
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

// =============================================================================
// Registry
// =============================================================================

struct Definition {
    class: Rc<dyn ElementClass>,
    extends: Option<String>,
}

#[derive(Default)]
struct Definitions {
    classes: HashMap<String, Definition>,
    waiting: HashMap<String, Vec<Cleanup>>,
}

/// Tag name → element class map of a window.
#[derive(Clone, Default)]
pub struct CustomElementRegistry(Rc<RefCell<Definitions>>);

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name`. When `extends` is set the class customizes that
    /// built-in tag and is created through `create_element_is`.
    ///
    /// Callbacks waiting on `name` run before this returns.
    pub fn define(
        &self,
        name: &str,
        class: Rc<dyn ElementClass>,
        extends: Option<&str>,
    ) -> crate::Result<()> {
        if !is_valid_name(name) {
            return Err(Error::InvalidTagName(name.to_string()));
        }

        let waiting = {
            let mut defs = self.0.borrow_mut();
            if defs.classes.contains_key(name) {
                return Err(Error::AlreadyDefined(name.to_string()));
            }
            defs.classes.insert(
                name.to_string(),
                Definition {
                    class,
                    extends: extends.map(str::to_string),
                },
            );
            defs.waiting.remove(name).unwrap_or_default()
        };

        debug!(name, waiting = waiting.len(), "custom element defined");
        for callback in waiting {
            callback();
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn ElementClass>> {
        self.0.borrow().classes.get(name).map(|d| d.class.clone())
    }

    /// Built-in tag a definition extends, if any.
    pub fn extends(&self, name: &str) -> Option<String> {
        self.0.borrow().classes.get(name)?.extends.clone()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.0.borrow().classes.contains_key(name)
    }

    /// Run `callback` once `name` is defined (immediately if it already is).
    pub fn when_defined(&self, name: &str, callback: impl FnOnce() + 'static) {
        if self.is_defined(name) {
            callback();
            return;
        }
        self.0
            .borrow_mut()
            .waiting
            .entry(name.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Class for an element created with `tag` and optional `is`.
    pub(crate) fn lookup(&self, tag: &str, is: Option<&str>) -> Option<Rc<dyn ElementClass>> {
        let defs = self.0.borrow();
        let name = is.unwrap_or(tag);
        let def = defs.classes.get(name)?;
        let matches = match is {
            Some(_) => def.extends.as_deref() == Some(tag),
            None => def.extends.is_none(),
        };
        matches.then(|| def.class.clone())
    }
}

/// Custom element names start with a lowercase letter and contain a hyphen.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_lower = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    starts_lower
        && name.contains('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
}
