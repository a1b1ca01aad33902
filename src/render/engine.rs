//! RenderEngine - template materialization and attribute dispatch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, error, trace};

use crate::component::{ViewContext, ViewInstance, registry::Registry};
use crate::dom::{Document, MutationObserver, Node, NodeKind, WeakNode, is_valid_name};
use crate::error::{Error, Result};
use crate::model::ModelRef;
use crate::template::{ElementTemplate, TemplateNode};

use super::interpolate::TEXT_CONTENT;

/// Materializes templates for one view, or for one directive scope.
#[derive(Clone)]
pub struct RenderEngine(Rc<EngineInner>);

/// Non-owning handle to a [`RenderEngine`].
#[derive(Clone)]
pub struct WeakEngine(Weak<EngineInner>);

impl WeakEngine {
    pub fn upgrade(&self) -> Option<RenderEngine> {
        self.0.upgrade().map(RenderEngine)
    }
}

struct EngineInner {
    view: Rc<ViewContext>,
    host: WeakNode,
    /// Set for directive scopes.
    parent: Option<RenderEngine>,
    locals: Option<ModelRef>,
    references: RefCell<HashMap<String, Node>>,
    /// Reference targets created by the pre-pass, not yet placed.
    prebuilt: RefCell<HashMap<String, Node>>,
    /// Top-level nodes this engine inserted into the host.
    rendered: RefCell<Vec<Node>>,
    /// Shared attribute observer: two-way targets and element sources.
    observer: RefCell<Option<MutationObserver>>,
    errors: RefCell<Vec<Error>>,
}

impl RenderEngine {
    pub fn new(view: Rc<ViewContext>, host: &Node) -> Self {
        Self::build(view, host.downgrade(), None, None)
    }

    fn build(
        view: Rc<ViewContext>,
        host: WeakNode,
        parent: Option<RenderEngine>,
        locals: Option<ModelRef>,
    ) -> Self {
        Self(Rc::new(EngineInner {
            view,
            host,
            parent,
            locals,
            references: RefCell::default(),
            prebuilt: RefCell::default(),
            rendered: RefCell::default(),
            observer: RefCell::default(),
            errors: RefCell::default(),
        }))
    }

    /// A child engine for a directive scope. `locals` shadow the view's
    /// properties; references captured inside stay in the scope.
    pub fn scoped(&self, locals: ModelRef) -> RenderEngine {
        Self::build(self.0.view.clone(), self.0.host.clone(), Some(self.clone()), Some(locals))
    }

    pub fn downgrade(&self) -> WeakEngine {
        WeakEngine(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &RenderEngine) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn view(&self) -> &Rc<ViewContext> {
        &self.0.view
    }

    pub fn model(&self) -> &ModelRef {
        &self.0.view.model
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.0.view.registry
    }

    pub fn parent(&self) -> Option<&RenderEngine> {
        self.0.parent.as_ref()
    }

    pub fn locals(&self) -> Option<&ModelRef> {
        self.0.locals.as_ref()
    }

    pub fn host(&self) -> Option<Node> {
        self.0.host.upgrade()
    }

    /// Reference captured by this engine or any enclosing scope.
    pub fn reference(&self, name: &str) -> Option<Node> {
        let name = name.strip_prefix('#').unwrap_or(name);
        self.own_reference(name)
            .or_else(|| self.parent().and_then(|p| p.reference(name)))
    }

    pub(crate) fn own_reference(&self, name: &str) -> Option<Node> {
        self.0.references.borrow().get(name).cloned()
    }

    /// Names of the references this engine captured.
    pub fn reference_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.references.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn rendered(&self) -> Vec<Node> {
        self.0.rendered.borrow().clone()
    }

    fn root(&self) -> RenderEngine {
        match self.parent() {
            Some(parent) => parent.root(),
            None => self.clone(),
        }
    }

    /// Configuration errors recorded while rendering, oldest first.
    pub fn errors(&self) -> Vec<Error> {
        self.root().0.errors.borrow().clone()
    }

    pub(crate) fn report(&self, error: Error) {
        self.root().0.errors.borrow_mut().push(error);
    }

    pub(crate) fn mutation_observer(&self) -> MutationObserver {
        let root = self.root();
        let mut slot = root.0.observer.borrow_mut();
        slot.get_or_insert_with(|| {
            MutationObserver::new(|record| {
                record.target.emit_change(&record.attribute);
            })
        })
        .clone()
    }

    fn document(&self) -> Result<Document> {
        self.host()
            .and_then(|host| host.owner_document())
            .ok_or(Error::ViewReleased)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render the component template into `host`, replacing earlier output.
    pub fn render_view(&self, host: &Node) -> Result<()> {
        self.teardown();
        let document = host.owner_document().ok_or(Error::ViewReleased)?;
        let view = self.0.view.clone();

        let Some(template_fn) = view.descriptor.template.clone() else {
            debug!(selector = view.descriptor.selector.as_str(), "component has no template");
            return Ok(());
        };
        let template = template_fn();

        self.prebuild_references(&document, &template);
        self.assign_view_children(None);

        if view.config.inject_styles {
            if let Some(style) = &view.descriptor.style {
                let element = document.create_element("style");
                element.set_text_content(style);
                host.append_child(&element);
                self.0.rendered.borrow_mut().push(element);
            }
        }

        let node = self.create_element(&template)?;
        let roots = match node.kind() {
            NodeKind::Fragment => node.children(),
            _ => vec![node.clone()],
        };
        host.append_child(&node);
        self.0.rendered.borrow_mut().extend(roots);
        trace!(selector = view.descriptor.selector.as_str(), "view rendered");
        Ok(())
    }

    /// Hand captured references to the model's view-child fields. With
    /// `only`, just those reference names are reassigned.
    fn assign_view_children(&self, only: Option<&[String]>) {
        let view = &self.0.view;
        for child in &view.descriptor.children {
            let name = child.selector.strip_prefix('#').unwrap_or(&child.selector);
            if only.is_some_and(|names| !names.iter().any(|n| n == name)) {
                continue;
            }
            match self.own_reference(name) {
                Some(node) => {
                    view.model.attach_element(&child.field, node);
                }
                None => debug!(field = child.field.as_str(), reference = name, "view child not found"),
            }
        }
    }

    /// Materialize one template node with its bindings. Binding errors are
    /// reported and the offending attribute is skipped.
    pub fn create_element(&self, template: &TemplateNode) -> Result<Node> {
        let document = self.document()?;
        Ok(self.materialize(&document, template))
    }

    /// Insert `template` before `reference` under `parent`, recording the
    /// inserted top-level nodes as this engine's output.
    pub fn render_into(&self, template: &TemplateNode, parent: &Node, reference: Option<&Node>) -> Result<Vec<Node>> {
        let document = self.document()?;
        if let TemplateNode::Element(element) = template {
            self.prebuild_element(&document, element);
        }
        let node = self.materialize(&document, template);
        let roots = match node.kind() {
            NodeKind::Fragment => node.children(),
            _ => vec![node.clone()],
        };
        parent.insert_before(&node, reference);
        self.0.rendered.borrow_mut().extend(roots.iter().cloned());
        Ok(roots)
    }

    /// Remove everything this engine rendered and release its bindings.
    pub fn teardown(&self) {
        let rendered = self.0.rendered.take();
        for node in &rendered {
            node.teardown();
            node.remove();
        }
        self.0.references.borrow_mut().clear();
        self.0.prebuilt.borrow_mut().clear();
    }

    fn materialize(&self, document: &Document, template: &TemplateNode) -> Node {
        match template {
            TemplateNode::Text(text) => {
                let node = document.create_text(text);
                if let Err(err) = self.interpolate(&node, TEXT_CONTENT, text) {
                    self.fail(err);
                }
                node
            }
            TemplateNode::Raw(node) => node.clone(),
            TemplateNode::Directive(directive) => self.instantiate_directive(document, directive),
            TemplateNode::Element(element) => match element.structural() {
                Some(directive) => self.instantiate_directive(document, &directive),
                None => self.materialize_element(document, element),
            },
        }
    }

    fn materialize_element(&self, document: &Document, template: &ElementTemplate) -> Node {
        let prebuilt = reference_name(template).and_then(|name| self.0.prebuilt.borrow_mut().remove(name));
        let node = match prebuilt {
            Some(node) => node,
            None => self.create_tag(document, template),
        };

        if matches!(node.kind(), NodeKind::Comment) {
            self.capture_reference(&node, template);
            return node;
        }
        if matches!(node.kind(), NodeKind::Fragment) {
            self.capture_reference(&node, template);
        } else {
            self.apply_attributes(&node, template, false);
        }
        for child in &template.children {
            let child = self.materialize(document, child);
            node.append_child(&child);
        }
        node
    }

    /// Create the node for `template.tag` without attributes or children.
    fn create_tag(&self, document: &Document, template: &ElementTemplate) -> Node {
        match template.tag.as_str() {
            "fragment" => document.create_fragment(),
            "comment" => document.create_comment(template.attribute("comment").unwrap_or("//")),
            tag => {
                let is = template.attribute("is");
                let node = match is {
                    Some(is) => document.create_element_is(tag, is),
                    None => document.create_element(tag),
                };
                if let Some(view) = ViewInstance::of(&node) {
                    view.set_parent(&self.0.view);
                } else if self.0.view.config.upgrade_placeholders {
                    let name = is.unwrap_or(tag);
                    if is_valid_name(name) {
                        self.defer_upgrade(document, &node, template, name);
                    }
                }
                node
            }
        }
    }

    // =========================================================================
    // References
    // =========================================================================

    fn prebuild_references(&self, document: &Document, template: &TemplateNode) {
        if let TemplateNode::Element(element) = template {
            self.prebuild_element(document, element);
        }
    }

    fn prebuild_element(&self, document: &Document, element: &ElementTemplate) {
        if element.structural().is_some() {
            return;
        }
        if let Some(name) = reference_name(element) {
            let node = self.create_tag(document, element);
            self.0.prebuilt.borrow_mut().insert(name.to_string(), node.clone());
            self.0.references.borrow_mut().insert(name.to_string(), node);
        }
        for child in &element.children {
            self.prebuild_references(document, child);
        }
    }

    fn capture_reference(&self, node: &Node, template: &ElementTemplate) {
        if let Some(name) = reference_name(template) {
            self.0.references.borrow_mut().insert(name.to_string(), node.clone());
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Dispatch each template attribute to its binding kind. With
    /// `dynamic_only`, plain attributes are skipped.
    fn apply_attributes(&self, node: &Node, template: &ElementTemplate, dynamic_only: bool) {
        for (name, value) in &template.attributes {
            if name == "is" {
                continue;
            }
            if let Err(err) = self.apply_attribute(node, name, value, dynamic_only) {
                self.fail(err);
            }
        }
    }

    fn apply_attribute(&self, node: &Node, name: &str, value: &str, dynamic_only: bool) -> Result<()> {
        if let Some(reference) = name.strip_prefix('#') {
            self.0.references.borrow_mut().insert(reference.to_string(), node.clone());
            return Ok(());
        }
        if let Some(attribute) = name.strip_prefix("[(").and_then(|n| n.strip_suffix(")]")) {
            let source = self.resolve_property(value)?;
            self.bind_two_way(&source, node, attribute);
            return Ok(());
        }
        if let Some(attribute) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
            let source = self.resolve_property(value)?;
            self.bind_one_way(&source, node, attribute);
            return Ok(());
        }
        if let Some(event) = name.strip_prefix('(').and_then(|n| n.strip_suffix(')')) {
            let source = self.resolve_property(value)?;
            self.bind_event(&source, node, event);
            return Ok(());
        }
        if self.interpolate(node, name, value)? > 0 || dynamic_only {
            return Ok(());
        }
        node.set_attribute(name, value);
        Ok(())
    }

    fn fail(&self, err: Error) {
        error!(error = %err, "binding skipped");
        self.report(err);
    }

    // =========================================================================
    // Placeholder upgrade
    // =========================================================================

    fn defer_upgrade(&self, document: &Document, placeholder: &Node, template: &ElementTemplate, name: &str) {
        let Some(window) = document.window() else { return };
        let registry = window.custom_elements();
        if registry.is_defined(name) {
            return;
        }
        debug!(tag = name, "placeholder created for undefined element");
        let engine = self.downgrade();
        let weak = placeholder.downgrade();
        let template = template.clone();
        registry.when_defined(name, move || {
            if let (Some(engine), Some(placeholder)) = (engine.upgrade(), weak.upgrade()) {
                engine.upgrade_placeholder(&placeholder, &template);
            }
        });
    }

    fn upgrade_placeholder(&self, placeholder: &Node, template: &ElementTemplate) {
        let Some(document) = placeholder.owner_document() else { return };
        let node = self.create_tag(&document, template);
        if !node.is_custom() {
            return;
        }
        debug!(tag = template.tag.as_str(), "upgrading placeholder");

        for (name, value) in placeholder.attributes() {
            node.set_attribute(&name, &value);
        }
        placeholder.teardown_own();
        self.apply_attributes(&node, template, true);
        for child in placeholder.children() {
            node.append_child(&child);
        }
        if placeholder.parent().is_some() {
            placeholder.replace_with(&node);
        }
        placeholder.forward_to(&node);
        self.swap_node(placeholder, &node);
        self.relay_changes(placeholder, &node);
    }

    /// Point references and rendered roots at `replacement`, then refresh
    /// the view children that named `old`.
    fn swap_node(&self, old: &Node, replacement: &Node) {
        let mut swapped = Vec::new();
        for (name, node) in self.0.references.borrow_mut().iter_mut() {
            if node == old {
                *node = replacement.clone();
                swapped.push(name.clone());
            }
        }
        for node in self.0.rendered.borrow_mut().iter_mut() {
            if node == old {
                *node = replacement.clone();
            }
        }
        if !swapped.is_empty() && self.parent().is_none() {
            self.assign_view_children(Some(&swapped));
        }
    }

    /// Sources captured against `placeholder` subscribed to its own change
    /// signal. Relay `node`'s signal for each such property, then announce
    /// each once so those bindings read the upgraded element.
    fn relay_changes(&self, placeholder: &Node, node: &Node) {
        for topic in placeholder.change_topics() {
            if !node.intercepts(&topic) {
                let watch = self.mutation_observer().observe(node, Some(&topic));
                node.on_teardown(watch.into_cleanup());
            }
            let target = placeholder.downgrade();
            let property = topic.clone();
            let relay = node.on_change(&topic, move || {
                if let Some(placeholder) = target.upgrade() {
                    placeholder.emit_change(&property);
                }
            });
            node.on_teardown(relay.into_cleanup());
            trace!(property = topic.as_str(), "relaying placeholder changes");
            placeholder.emit_change(&topic);
        }
    }
}

fn reference_name(template: &ElementTemplate) -> Option<&str> {
    template.attributes.iter().find_map(|(name, _)| name.strip_prefix('#'))
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("selector", &self.0.view.descriptor.selector)
            .field("scoped", &self.0.parent.is_some())
            .field("references", &self.reference_names())
            .finish()
    }
}
