//! Template descriptions.
//!
//! A template is a static tree of [`TemplateNode`]s that the render engine
//! materializes into host nodes. Attribute names carry the binding syntax:
//!
//! | Attribute        | Meaning                                   |
//! |------------------|-------------------------------------------|
//! | `#name`          | capture the element as reference `name`   |
//! | `[attr]="path"`  | one-way binding, model → element          |
//! | `[(attr)]="path"`| two-way binding                           |
//! | `(event)="fn"`   | call model method `fn` on event           |
//! | `*dir="arg"`     | wrap the element in structural directive  |
//! | `a="x {{p}}"`    | interpolated attribute                    |
//!
//! # Example
//!
//! ```ignore
//! use spark_elements::template::{el, text};
//!
//! let tpl = el("ul").child(
//!     el("li")
//!         .attr("*for", "item of items")
//!         .text("{{ item }}"),
//! );
//! ```

pub mod expr;

use std::rc::Rc;

use crate::dom::Node;

/// Produces a fresh template for each render.
pub type TemplateFn = Rc<dyn Fn() -> TemplateNode>;

#[derive(Debug, Clone)]
pub enum TemplateNode {
    Element(ElementTemplate),
    /// Literal text, possibly with `{{ }}` placeholders.
    Text(String),
    Directive(DirectiveTemplate),
    /// A node built outside the template; inserted as-is.
    Raw(Node),
}

#[derive(Debug, Clone, Default)]
pub struct ElementTemplate {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone)]
pub struct DirectiveTemplate {
    /// Directive selector including its `*` prefix.
    pub selector: String,
    /// Raw argument text, passed to the directive unparsed.
    pub argument: String,
    /// Template the directive renders.
    pub owner: Option<Box<TemplateNode>>,
}

// =============================================================================
// Builders
// =============================================================================

pub fn el(tag: &str) -> ElementTemplate {
    ElementTemplate {
        tag: tag.to_string(),
        ..Default::default()
    }
}

pub fn text(text: &str) -> TemplateNode {
    TemplateNode::Text(text.to_string())
}

/// A `<fragment>`: its children are inserted without a wrapper.
pub fn fragment() -> ElementTemplate {
    el("fragment")
}

/// A comment node.
pub fn comment(text: &str) -> ElementTemplate {
    el("comment").attr("comment", text)
}

pub fn directive(selector: &str, argument: &str) -> DirectiveTemplate {
    DirectiveTemplate {
        selector: selector.to_string(),
        argument: argument.to_string(),
        owner: None,
    }
}

impl ElementTemplate {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn child(mut self, child: impl Into<TemplateNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = TemplateNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.child(TemplateNode::Text(text.to_string()))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Split off the first `*name` attribute as a directive owning the rest
    /// of the element.
    pub fn structural(&self) -> Option<DirectiveTemplate> {
        let index = self.attributes.iter().position(|(n, _)| n.starts_with('*'))?;
        let mut owner = self.clone();
        let (selector, argument) = owner.attributes.remove(index);
        Some(DirectiveTemplate {
            selector,
            argument,
            owner: Some(Box::new(TemplateNode::Element(owner))),
        })
    }
}

impl DirectiveTemplate {
    pub fn owner(mut self, owner: impl Into<TemplateNode>) -> Self {
        self.owner = Some(Box::new(owner.into()));
        self
    }
}

impl From<ElementTemplate> for TemplateNode {
    fn from(element: ElementTemplate) -> Self {
        TemplateNode::Element(element)
    }
}

impl From<DirectiveTemplate> for TemplateNode {
    fn from(directive: DirectiveTemplate) -> Self {
        TemplateNode::Directive(directive)
    }
}

impl From<&str> for TemplateNode {
    fn from(text: &str) -> Self {
        TemplateNode::Text(text.to_string())
    }
}

impl From<Node> for TemplateNode {
    fn from(node: Node) -> Self {
        TemplateNode::Raw(node)
    }
}
