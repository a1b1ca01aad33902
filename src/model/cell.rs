//! ModelCell - owns a model and its change bus.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::bus::{ChangeBus, Subscription};
use super::emitter::EventEmitter;
use super::lifecycle::{self, Hook, Hooks};
use super::Model;
use crate::dom::Node;
use crate::types::{Value, assign, lookup, split_root};

/// Shared handle to a model cell.
pub type ModelRef = Rc<ModelCell>;

/// A model plus the bus that announces its property changes.
///
/// Writes emit only when the stored value actually changes. Methods and
/// hooks run "tracked": the declared property names are snapshotted before
/// the call and every property whose value differs afterwards is emitted once
/// the model borrow is released. Writes and method calls that arrive while
/// the model is busy (a method emitting an output whose subscriber writes
/// back or calls into the same model) are queued and applied, in arrival
/// order, when the running call finishes.
pub struct ModelCell {
    model: RefCell<Box<dyn Model>>,
    bus: ChangeBus,
    pending: RefCell<Vec<Deferred>>,
}

/// Work that reached a busy model.
enum Deferred {
    Write(String, Value),
    Call(String, Vec<Value>),
}

impl ModelCell {
    pub fn new(model: impl Model) -> ModelRef {
        Self::from_boxed(Box::new(model))
    }

    pub fn from_boxed(model: Box<dyn Model>) -> ModelRef {
        Rc::new(Self {
            model: RefCell::new(model),
            bus: ChangeBus::new(),
            pending: RefCell::new(Vec::new()),
        })
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Read a value by dotted path.
    pub fn get(&self, path: &str) -> Option<Value> {
        let (root, rest) = split_root(path);
        let model = self.model.try_borrow().ok()?;
        lookup(&model.property(root)?, rest)
    }

    /// Whether the root of `path` is a property or a method.
    pub fn has(&self, path: &str) -> bool {
        let (root, _) = split_root(path);
        self.model
            .try_borrow()
            .is_ok_and(|m| m.property(root).is_some() || m.is_method(root))
    }

    /// Write a value by dotted path. Emits the root property if it changed.
    pub fn set(&self, path: &str, value: Value) -> bool {
        let (root, rest) = split_root(path);
        let changed = {
            let Ok(mut model) = self.model.try_borrow_mut() else {
                trace!(path, "model busy, queueing write");
                self.pending.borrow_mut().push(Deferred::Write(path.to_string(), value));
                return false;
            };
            let old = model.property(root);
            let new_root = if rest.is_empty() {
                value
            } else {
                let mut base = old.clone().unwrap_or(Value::Null);
                if !assign(&mut base, rest, value) {
                    warn!(path, "cannot write nested path");
                    return false;
                }
                base
            };
            if old.as_ref() == Some(&new_root) {
                false
            } else {
                model.set_property(root, new_root)
            }
        };

        if changed {
            trace!(property = root, "model property changed");
            self.bus.emit(root);
        }
        changed
    }

    pub fn is_method(&self, name: &str) -> bool {
        self.model.try_borrow().is_ok_and(|m| m.is_method(name))
    }

    /// Invoke a model method, emitting every property it changed.
    ///
    /// A call made while another call on this model is running is queued
    /// and returns `None`.
    pub fn call(&self, method: &str, args: &[Value]) -> Option<Value> {
        match self.tracked(|model| model.call(method, args)) {
            Some(result) => result,
            None => {
                trace!(method, "model busy, queueing call");
                self.pending
                    .borrow_mut()
                    .push(Deferred::Call(method.to_string(), args.to_vec()));
                None
            }
        }
    }

    /// Run a lifecycle hook if declared. Returns whether it ran.
    pub fn run_hook(&self, hook: Hook) -> bool {
        let Some(ran) = self.tracked(|model| lifecycle::dispatch(model, hook)) else {
            debug!(hook = hook.name(), "model busy, hook skipped");
            return false;
        };
        if ran {
            trace!(hook = hook.name(), "lifecycle hook");
        }
        ran
    }

    pub fn hooks(&self) -> Hooks {
        self.model.try_borrow().map(|m| m.hooks()).unwrap_or_default()
    }

    pub fn output(&self, name: &str) -> Option<EventEmitter> {
        self.model.try_borrow().ok()?.output(name)
    }

    pub fn attach_element(&self, field: &str, element: Node) -> bool {
        self.model
            .try_borrow_mut()
            .is_ok_and(|mut m| m.attach_element(field, element))
    }

    pub fn subscribe(&self, property: &str, handler: impl Fn() + 'static) -> Subscription {
        self.bus.subscribe(property, handler)
    }

    /// Run `f` on the model and emit what it changed. `None` when the model
    /// is already borrowed.
    fn tracked<R>(&self, f: impl FnOnce(&mut dyn Model) -> R) -> Option<R> {
        let (result, changed) = {
            let Ok(mut model) = self.model.try_borrow_mut() else {
                return None;
            };
            let names = model.property_names();
            let before: Vec<Option<Value>> = names.iter().map(|n| model.property(n)).collect();
            let result = f(&mut **model);
            let changed: Vec<String> = names
                .into_iter()
                .zip(before)
                .filter(|(name, old)| model.property(name) != *old)
                .map(|(name, _)| name)
                .collect();
            (result, changed)
        };

        for name in &changed {
            trace!(property = name.as_str(), "model property changed");
            self.bus.emit(name);
        }

        self.drain();
        Some(result)
    }

    fn drain(&self) {
        loop {
            let queued = std::mem::take(&mut *self.pending.borrow_mut());
            if queued.is_empty() {
                return;
            }
            for work in queued {
                match work {
                    Deferred::Write(path, value) => {
                        self.set(&path, value);
                    }
                    Deferred::Call(method, args) => {
                        self.call(&method, &args);
                    }
                }
            }
        }
    }
}
