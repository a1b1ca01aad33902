//! Document and Window.

use std::fmt;
use std::rc::{Rc, Weak};

use super::custom::CustomElementRegistry;
use super::event::Event;
use super::node::{Node, NodeKind};
use crate::model::{Subscription, Topics};

// =============================================================================
// Document
// =============================================================================

pub(crate) struct DocumentInner {
    node: Node,
    body: Node,
    window: Weak<WindowInner>,
}

/// A node tree rooted at a document node, with a `body` element.
#[derive(Clone)]
pub struct Document(Rc<DocumentInner>);

impl Document {
    fn new(window: Weak<WindowInner>) -> Self {
        Document(Rc::new_cyclic(|weak: &Weak<DocumentInner>| {
            let node = Node::new(NodeKind::Document, String::new(), weak.clone());
            let body = Node::new(
                NodeKind::Element {
                    tag: "body".into(),
                    is: None,
                },
                String::new(),
                weak.clone(),
            );
            node.append_child(&body);
            DocumentInner { node, body, window }
        }))
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Document(inner)
    }

    /// The document node itself (root of the tree).
    pub fn node(&self) -> Node {
        self.0.node.clone()
    }

    pub fn body(&self) -> Node {
        self.0.body.clone()
    }

    pub fn window(&self) -> Option<Window> {
        self.0.window.upgrade().map(Window)
    }

    /// Create an element. Tags defined as custom elements are constructed
    /// with their class attached.
    pub fn create_element(&self, tag: &str) -> Node {
        self.build_element(tag, None)
    }

    /// Create a customized built-in element (`<button is="fancy-button">`).
    pub fn create_element_is(&self, tag: &str, is: &str) -> Node {
        self.build_element(tag, Some(is))
    }

    fn build_element(&self, tag: &str, is: Option<&str>) -> Node {
        let tag = tag.to_ascii_lowercase();
        let node = Node::new(
            NodeKind::Element {
                tag: tag.clone(),
                is: is.map(str::to_string),
            },
            String::new(),
            Rc::downgrade(&self.0),
        );
        let class = self
            .window()
            .and_then(|w| w.custom_elements().lookup(&tag, is));
        if let Some(class) = class {
            node.upgrade(class.as_ref());
        }
        node
    }

    pub fn create_text(&self, text: &str) -> Node {
        Node::new(NodeKind::Text, text.to_string(), Rc::downgrade(&self.0))
    }

    pub fn create_comment(&self, text: &str) -> Node {
        Node::new(NodeKind::Comment, text.to_string(), Rc::downgrade(&self.0))
    }

    pub fn create_fragment(&self) -> Node {
        Node::new(NodeKind::Fragment, String::new(), Rc::downgrade(&self.0))
    }

    /// Detach `node` and move it into this document.
    pub fn adopt_node(&self, node: &Node) {
        node.remove();
        if node.owner_document().as_ref() == Some(self) {
            return;
        }
        node.set_document(&Rc::downgrade(&self.0));
        for (element, custom) in node.custom_subtree() {
            custom.adopted(&element);
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("children", &self.0.body.child_count())
            .finish()
    }
}

// =============================================================================
// Window
// =============================================================================

pub(crate) struct WindowInner {
    document: Document,
    custom_elements: CustomElementRegistry,
    listeners: Topics<Event>,
}

/// Global object: main document, custom element registry and global events.
#[derive(Clone)]
pub struct Window(Rc<WindowInner>);

impl Window {
    pub fn new() -> Self {
        Window(Rc::new_cyclic(|weak| WindowInner {
            document: Document::new(weak.clone()),
            custom_elements: CustomElementRegistry::new(),
            listeners: Topics::new(),
        }))
    }

    pub fn document(&self) -> Document {
        self.0.document.clone()
    }

    /// A second document sharing this window's element definitions.
    pub fn create_document(&self) -> Document {
        Document::new(Rc::downgrade(&self.0))
    }

    pub fn custom_elements(&self) -> CustomElementRegistry {
        self.0.custom_elements.clone()
    }

    pub fn add_event_listener(&self, kind: &str, handler: impl Fn(&Event) + 'static) -> Subscription {
        self.0.listeners.subscribe(kind, handler)
    }

    pub fn dispatch_event(&self, event: &Event) -> usize {
        self.0.listeners.publish(&event.kind, event)
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.0.listeners.count(kind)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}
