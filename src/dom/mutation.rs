//! Attribute mutation observers.
//!
//! Records are delivered synchronously, from inside the attribute write that
//! produced them, and only when the value actually changed.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use super::node::Node;
use crate::model::Subscription;

/// One observed attribute change.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub target: Node,
    pub attribute: String,
    pub old_value: Option<String>,
}

pub(crate) struct ObserverInner {
    callback: Box<dyn Fn(&MutationRecord)>,
    next_id: Cell<usize>,
}

impl ObserverInner {
    pub(crate) fn deliver(&self, record: &MutationRecord) {
        (self.callback)(record);
    }
}

/// A registration of an observer on a node.
pub(crate) struct Observation {
    pub(crate) id: usize,
    pub(crate) observer: Weak<ObserverInner>,
    pub(crate) attribute: Option<String>,
}

impl Observation {
    pub(crate) fn matches(&self, attribute: &str) -> bool {
        self.attribute.as_deref().is_none_or(|a| a == attribute)
    }
}

/// Watches attribute changes on any number of nodes with one callback.
#[derive(Clone)]
pub struct MutationObserver(Rc<ObserverInner>);

impl MutationObserver {
    pub fn new(callback: impl Fn(&MutationRecord) + 'static) -> Self {
        Self(Rc::new(ObserverInner {
            callback: Box::new(callback),
            next_id: Cell::new(0),
        }))
    }

    /// Watch `attribute` on `node` (every attribute when `None`).
    pub fn observe(&self, node: &Node, attribute: Option<&str>) -> Subscription {
        let id = self.0.next_id.get();
        self.0.next_id.set(id + 1);

        let observer = Rc::downgrade(&self.0);
        node.add_observation(Observation {
            id,
            observer: observer.clone(),
            attribute: attribute.map(str::to_string),
        });

        let node = node.downgrade();
        Subscription::new(move || {
            if let Some(node) = node.upgrade() {
                node.remove_observation(|o| o.id == id && Weak::ptr_eq(&o.observer, &observer));
            }
        })
    }
}
