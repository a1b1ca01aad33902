//! Node - the shared handle to an element, text, comment or fragment.
//!
//! Nodes are reference counted; parents hold their children strongly and
//! children hold their parent weakly. Cloning a [`Node`] clones the handle,
//! equality is identity.
//!
//! # Lifecycle delivery
//!
//! Inserting a subtree into a connected parent calls `connected` on every
//! custom element in it, in tree order. Removing one from a connected parent
//! calls `disconnected`. Moving a subtree into a different document calls
//! `adopted` before it is inserted.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::custom::{CustomElement, ElementClass};
use super::document::{Document, DocumentInner};
use super::event::Event;
use super::mutation::{MutationRecord, Observation, ObserverInner};
use crate::model::{ChangeBus, Subscription, Topics};
use crate::types::{Cleanup, Value, to_text};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String, is: Option<String> },
    Text,
    Comment,
    Fragment,
    Document,
}

pub(crate) struct NodeData {
    kind: NodeKind,
    /// Character data of text and comment nodes.
    data: RefCell<String>,
    attributes: RefCell<Vec<(String, String)>>,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
    document: RefCell<Weak<DocumentInner>>,
    listeners: Topics<Event>,
    changes: ChangeBus,
    custom: RefCell<Option<Rc<dyn CustomElement>>>,
    observed: RefCell<Vec<String>>,
    cleanups: RefCell<Vec<Cleanup>>,
    parented: RefCell<Vec<Cleanup>>,
    observers: RefCell<Vec<Observation>>,
    /// Element that replaced this placeholder.
    successor: RefCell<Option<Node>>,
}

/// Handle to a node in the tree.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

/// Non-owning node handle, for closures stored on the node itself.
#[derive(Clone, Default)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Element { .. } => f
                .debug_struct("Element")
                .field("tag", &self.node_name())
                .field("attributes", &*self.0.attributes.borrow())
                .field("children", &self.0.children.borrow().len())
                .finish(),
            NodeKind::Text | NodeKind::Comment => {
                write!(f, "{}({:?})", self.node_name(), self.0.data.borrow())
            }
            _ => f.write_str(&self.node_name()),
        }
    }
}

impl Node {
    pub(crate) fn new(kind: NodeKind, data: String, document: Weak<DocumentInner>) -> Self {
        Node(Rc::new(NodeData {
            kind,
            data: RefCell::new(data),
            attributes: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            document: RefCell::new(document),
            listeners: Topics::new(),
            changes: ChangeBus::new(),
            custom: RefCell::new(None),
            observed: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            parented: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            successor: RefCell::new(None),
        }))
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Customized built-in name given at creation.
    pub fn is_as(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element { is, .. } => is.as_deref(),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self.0.kind {
            NodeKind::Element { .. } => "element",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
            NodeKind::Fragment => "fragment",
            NodeKind::Document => "document",
        }
    }

    pub fn node_name(&self) -> String {
        match &self.0.kind {
            NodeKind::Element { tag, .. } => tag.clone(),
            NodeKind::Text => "#text".into(),
            NodeKind::Comment => "#comment".into(),
            NodeKind::Fragment => "#document-fragment".into(),
            NodeKind::Document => "#document".into(),
        }
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    // =========================================================================
    // Tree
    // =========================================================================

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let siblings = parent.0.children.borrow();
        let index = siblings.iter().position(|c| c == self)?;
        siblings.get(index + 1).cloned()
    }

    pub fn owner_document(&self) -> Option<Document> {
        self.0.document.borrow().upgrade().map(Document::from_inner)
    }

    /// Whether the node's root is a document.
    pub fn is_connected(&self) -> bool {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current.0.kind == NodeKind::Document
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    pub fn append_child(&self, child: &Node) {
        self.insert_before(child, None);
    }

    /// Insert `child` before `reference` (at the end when `None` or when the
    /// reference is not a child). Fragments contribute their children.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) {
        if child.0.kind == NodeKind::Fragment {
            for grandchild in child.children() {
                self.insert_before(&grandchild, reference);
            }
            return;
        }
        if child.contains(self) {
            warn!(parent = %self.node_name(), child = %child.node_name(), "refusing to insert a node into itself");
            return;
        }

        child.remove();
        if self.adopt(child) {
            for (element, custom) in child.custom_subtree() {
                custom.adopted(&element);
            }
        }

        {
            let mut children = self.0.children.borrow_mut();
            let index = reference
                .and_then(|r| children.iter().position(|c| c == r))
                .unwrap_or(children.len());
            children.insert(index, child.clone());
        }
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);

        let hooks = child.0.parented.take();
        for hook in hooks {
            hook();
        }

        if self.is_connected() {
            for (element, custom) in child.custom_subtree() {
                if element.is_connected() {
                    custom.connected(&element);
                }
            }
        }
    }

    /// Insert `node` right after this one. No-op if this node has no parent.
    pub fn insert_after(&self, node: &Node) {
        let Some(parent) = self.parent() else {
            return;
        };
        let next = self.next_sibling();
        if next.as_ref() == Some(node) {
            return;
        }
        parent.insert_before(node, next.as_ref());
    }

    /// Detach from the parent.
    pub fn remove(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        let was_connected = parent.is_connected();
        parent.0.children.borrow_mut().retain(|c| c != self);
        *self.0.parent.borrow_mut() = Weak::new();

        if was_connected {
            for (element, custom) in self.custom_subtree() {
                custom.disconnected(&element);
            }
        }
    }

    /// Put `replacement` where this node is and detach this node.
    pub fn replace_with(&self, replacement: &Node) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent.insert_before(replacement, Some(self));
        self.remove();
    }

    /// Record that `successor` took this node's place in the tree.
    pub(crate) fn forward_to(&self, successor: &Node) {
        *self.0.successor.borrow_mut() = Some(successor.clone());
    }

    /// The node standing in for this one: itself, or the element that
    /// replaced it when it was upgraded.
    pub fn current(&self) -> Node {
        let mut node = self.clone();
        loop {
            let next = node.0.successor.borrow().clone();
            match next {
                Some(next) => node = next,
                None => return node,
            }
        }
    }

    /// Run `hook` once this node gets a parent (now, if it has one).
    pub fn on_parented(&self, hook: impl FnOnce() + 'static) {
        if self.parent().is_some() {
            hook();
        } else {
            self.0.parented.borrow_mut().push(Box::new(hook));
        }
    }

    /// Move the subtree to this node's document. Returns true if it moved.
    fn adopt(&self, child: &Node) -> bool {
        let target = self.0.document.borrow().clone();
        if Weak::ptr_eq(&target, &child.0.document.borrow()) {
            return false;
        }
        child.set_document(&target);
        true
    }

    pub(crate) fn set_document(&self, document: &Weak<DocumentInner>) {
        *self.0.document.borrow_mut() = document.clone();
        for child in self.children() {
            child.set_document(document);
        }
    }

    /// Custom elements in this subtree, in tree order.
    pub(crate) fn custom_subtree(&self) -> Vec<(Node, Rc<dyn CustomElement>)> {
        let mut found = Vec::new();
        self.collect_custom(&mut found);
        found
    }

    fn collect_custom(&self, found: &mut Vec<(Node, Rc<dyn CustomElement>)>) {
        if let Some(custom) = self.custom() {
            found.push((self.clone(), custom));
        }
        for child in self.children() {
            child.collect_custom(found);
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Attribute value, routed through the element's accessor table.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        if let Some(custom) = self.intercepting(name) {
            return custom.read_property(name).map(|v| to_text(&v));
        }
        self.native_attribute(name)
    }

    /// Set an attribute, routed through the element's accessor table.
    pub fn set_attribute(&self, name: &str, value: &str) {
        if let Some(custom) = self.intercepting(name) {
            custom.write_property(self, name, Value::String(value.to_string()));
            return;
        }
        self.set_native_attribute(name, value);
    }

    /// Raw attribute storage, bypassing accessors.
    pub fn native_attribute(&self, name: &str) -> Option<String> {
        self.0
            .attributes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Write raw attribute storage. Returns false when the value is unchanged,
    /// in which case no callback or mutation record is produced.
    pub fn set_native_attribute(&self, name: &str, value: &str) -> bool {
        let old = {
            let mut attributes = self.0.attributes.borrow_mut();
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, current)) if current == value => return false,
                Some((_, current)) => Some(std::mem::replace(current, value.to_string())),
                None => {
                    attributes.push((name.to_string(), value.to_string()));
                    None
                }
            }
        };
        self.attribute_written(name, old, Some(value));
        true
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        let old = {
            let mut attributes = self.0.attributes.borrow_mut();
            let Some(index) = attributes.iter().position(|(n, _)| n == name) else {
                return false;
            };
            attributes.remove(index).1
        };
        self.attribute_written(name, Some(old), None);
        true
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Native attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0.attributes.borrow().clone()
    }

    fn attribute_written(&self, name: &str, old: Option<String>, new: Option<&str>) {
        let observed = self.0.observed.borrow().iter().any(|a| a == name);
        if observed {
            if let Some(custom) = self.custom() {
                custom.attribute_changed(self, name, old.as_deref(), new);
            }
        }
        self.notify_observers(name, old);
    }

    // =========================================================================
    // Text and properties
    // =========================================================================

    /// Character data of a text or comment node.
    pub fn data(&self) -> String {
        self.0.data.borrow().clone()
    }

    pub fn set_data(&self, data: &str) {
        *self.0.data.borrow_mut() = data.to_string();
    }

    /// Concatenated text of the subtree (comments excluded).
    pub fn text_content(&self) -> String {
        match self.0.kind {
            NodeKind::Text | NodeKind::Comment => self.data(),
            _ => {
                let mut text = String::new();
                self.collect_text(&mut text);
                text
            }
        }
    }

    fn collect_text(&self, text: &mut String) {
        for child in self.children() {
            match child.0.kind {
                NodeKind::Text => text.push_str(&child.0.data.borrow()),
                NodeKind::Comment => {}
                _ => child.collect_text(text),
            }
        }
    }

    /// Replace character data, or replace all children with one text node.
    pub fn set_text_content(&self, text: &str) {
        match self.0.kind {
            NodeKind::Text | NodeKind::Comment => self.set_data(text),
            _ => {
                for child in self.children() {
                    child.remove();
                }
                if !text.is_empty() {
                    let document = self.0.document.borrow().clone();
                    self.append_child(&Node::new(NodeKind::Text, text.to_string(), document));
                }
            }
        }
    }

    /// Property read. `textContent` is the text, intercepted names go to the
    /// element, everything else reads the attribute.
    pub fn property(&self, name: &str) -> Option<Value> {
        if name == "textContent" {
            return Some(Value::String(self.text_content()));
        }
        if let Some(custom) = self.intercepting(name) {
            return custom.read_property(name);
        }
        self.native_attribute(name).map(Value::String)
    }

    /// Property write. `null` and `false` remove a native attribute.
    pub fn set_property(&self, name: &str, value: Value) {
        if name == "textContent" {
            self.set_text_content(&to_text(&value));
            return;
        }
        if let Some(custom) = self.intercepting(name) {
            custom.write_property(self, name, value);
            return;
        }
        match value {
            Value::Null | Value::Bool(false) => {
                self.remove_attribute(name);
            }
            other => {
                self.set_native_attribute(name, &to_text(&other));
            }
        }
    }

    // =========================================================================
    // Change signals
    // =========================================================================

    /// Subscribe to the change signal of `name`. Custom elements may provide
    /// their own signal (a component's model bus); otherwise the node's bus.
    pub fn on_change(&self, name: &str, handler: impl Fn() + 'static) -> Subscription {
        let handler: Box<dyn Fn()> = Box::new(handler);
        let handler = match self.custom() {
            Some(custom) => match custom.on_property_change(name, handler) {
                Ok(subscription) => return subscription,
                Err(handler) => handler,
            },
            None => handler,
        };
        self.0.changes.subscribe(name, handler)
    }

    /// Names with change subscribers on this node's own signal.
    pub(crate) fn change_topics(&self) -> Vec<String> {
        self.0.changes.topics()
    }

    /// Signal a change of `name`. Returns how many subscribers ran.
    pub fn emit_change(&self, name: &str) -> usize {
        if let Some(count) = self.custom().and_then(|c| c.emit_property_change(name)) {
            return count;
        }
        self.0.changes.emit(name)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Register work to run when this node is torn down.
    pub fn on_teardown(&self, cleanup: Cleanup) {
        self.0.cleanups.borrow_mut().push(cleanup);
    }

    pub fn teardown_count(&self) -> usize {
        self.0.cleanups.borrow().len()
    }

    /// Run and clear the teardown work of this node and its descendants.
    pub fn teardown(&self) {
        self.teardown_own();
        for child in self.children() {
            child.teardown();
        }
    }

    /// Run and clear the teardown work of this node only.
    pub fn teardown_own(&self) {
        let cleanups = self.0.cleanups.take();
        for cleanup in cleanups {
            cleanup();
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn add_event_listener(&self, kind: &str, handler: impl Fn(&Event) + 'static) -> Subscription {
        self.0.listeners.subscribe(kind, handler)
    }

    /// Deliver `event` to this node's listeners, then to ancestors' if it
    /// bubbles. Returns how many listeners ran.
    pub fn dispatch_event(&self, event: &Event) -> usize {
        let mut delivered = self.0.listeners.publish(&event.kind, event);
        if event.bubbles {
            let mut current = self.parent();
            while let Some(node) = current {
                delivered += node.0.listeners.publish(&event.kind, event);
                current = node.parent();
            }
        }
        delivered
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.0.listeners.count(kind)
    }

    // =========================================================================
    // Custom elements
    // =========================================================================

    pub fn custom(&self) -> Option<Rc<dyn CustomElement>> {
        self.0.custom.borrow().clone()
    }

    pub fn is_custom(&self) -> bool {
        self.0.custom.borrow().is_some()
    }

    /// Downcast the attached custom element.
    pub fn custom_as<T: 'static>(&self) -> Option<Rc<T>> {
        self.custom()?.into_any().downcast::<T>().ok()
    }

    /// Attach an element class to this node.
    pub(crate) fn upgrade(&self, class: &dyn ElementClass) {
        *self.0.observed.borrow_mut() = class.observed_attributes();
        let custom = class.construct(self);
        *self.0.custom.borrow_mut() = Some(custom);
    }

    /// Whether reads and writes of `name` go to the custom element.
    pub fn intercepts(&self, name: &str) -> bool {
        self.intercepting(name).is_some()
    }

    fn intercepting(&self, name: &str) -> Option<Rc<dyn CustomElement>> {
        self.custom().filter(|c| c.intercepts(name))
    }

    // =========================================================================
    // Mutation observers
    // =========================================================================

    pub(crate) fn add_observation(&self, observation: Observation) {
        self.0.observers.borrow_mut().push(observation);
    }

    pub(crate) fn remove_observation(&self, matches: impl Fn(&Observation) -> bool) {
        self.0.observers.borrow_mut().retain(|o| !matches(o));
    }

    /// Deliver one record per observer, however many of its observations
    /// match.
    fn notify_observers(&self, attribute: &str, old_value: Option<String>) {
        let mut observers: Vec<Rc<ObserverInner>> = Vec::new();
        for observer in self
            .0
            .observers
            .borrow()
            .iter()
            .filter(|o| o.matches(attribute))
            .filter_map(|o| o.observer.upgrade())
        {
            if !observers.iter().any(|seen| Rc::ptr_eq(seen, &observer)) {
                observers.push(observer);
            }
        }
        if observers.is_empty() {
            return;
        }
        let record = MutationRecord {
            target: self.clone(),
            attribute: attribute.to_string(),
            old_value,
        };
        for observer in observers {
            observer.deliver(&record);
        }
    }
}
