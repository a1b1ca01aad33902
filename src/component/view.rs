//! View synthesis - the element type generated for each component.
//!
//! [`ViewClass`] is defined on the platform under the component's selector.
//! Every element the platform creates with that tag gets a [`ViewInstance`]
//! that owns a fresh model, an attribute event bus and a render engine, and
//! bridges the platform's lifecycle callbacks to the model's hooks.
//!
//! # Lifecycle
//!
//! ```text
//! attribute changed   emit on bus → on_changes          (before first attach)
//!                     emit on bus → do_check,
//!                       after_content_checked,
//!                       after_view_checked              (after first attach)
//! connected           on_changes, on_init, do_check,
//!                     after_content_init, after_content_checked
//!                     render template
//!                     assign view field, bind host
//!                     after_view_init, after_view_checked
//! adopted             replays `connected` when already in a document
//! disconnected        on_destroy, teardown render output and host bindings
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{error, trace};

use super::descriptor::ComponentDescriptor;
use super::host;
use super::registry::{ComponentEntry, Registry};
use crate::config::Config;
use crate::dom::{CustomElement, ElementClass, Node, WeakNode};
use crate::model::{ChangeBus, EventEmitter, Hook, ModelCell, ModelRef, Subscription};
use crate::render::RenderEngine;
use crate::types::{Value, to_text};

// =============================================================================
// ViewContext
// =============================================================================

/// State shared by a view and every engine rendering for it.
pub struct ViewContext {
    pub model: ModelRef,
    pub descriptor: Rc<ComponentDescriptor>,
    pub registry: Rc<Registry>,
    pub config: Config,
}

impl std::fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewContext")
            .field("selector", &self.descriptor.selector)
            .finish()
    }
}

// =============================================================================
// ViewClass
// =============================================================================

/// Element type synthesized from a registered component.
pub struct ViewClass {
    entry: Rc<ComponentEntry>,
    registry: Rc<Registry>,
    config: Config,
}

impl ViewClass {
    pub fn new(entry: Rc<ComponentEntry>, registry: Rc<Registry>, config: Config) -> Self {
        Self {
            entry,
            registry,
            config,
        }
    }

    pub fn descriptor(&self) -> &Rc<ComponentDescriptor> {
        &self.entry.descriptor
    }
}

impl ElementClass for ViewClass {
    fn observed_attributes(&self) -> Vec<String> {
        self.entry.descriptor.observed_attributes()
    }

    fn construct(&self, element: &Node) -> Rc<dyn CustomElement> {
        let model = ModelCell::from_boxed((self.entry.factory)());
        let context = Rc::new(ViewContext {
            model,
            descriptor: self.entry.descriptor.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        });
        Rc::new(ViewInstance::new(element, context))
    }
}

// =============================================================================
// ViewInstance
// =============================================================================

/// The live half of a component element.
pub struct ViewInstance {
    element: WeakNode,
    context: Rc<ViewContext>,
    engine: RenderEngine,
    /// Attribute change notifications, keyed by view-facing name.
    events: ChangeBus,
    initialized: Cell<bool>,
    host_subscriptions: RefCell<Option<Vec<Subscription>>>,
    parent: RefCell<Weak<ViewContext>>,
}

impl ViewInstance {
    fn new(element: &Node, context: Rc<ViewContext>) -> Self {
        for input in &context.descriptor.inputs {
            let value = context.model.get(&input.model).unwrap_or(Value::Null);
            if !value.is_null() {
                element.set_native_attribute(input.view_name(), &to_text(&value));
            }
        }
        Self {
            element: element.downgrade(),
            engine: RenderEngine::new(context.clone(), element),
            context,
            events: ChangeBus::new(),
            initialized: Cell::new(false),
            host_subscriptions: RefCell::new(None),
            parent: RefCell::new(Weak::new()),
        }
    }

    /// View attached to `element`, if it is a component element.
    pub fn of(element: &Node) -> Option<Rc<ViewInstance>> {
        element.custom_as::<ViewInstance>()
    }

    pub fn model(&self) -> &ModelRef {
        &self.context.model
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn context(&self) -> &Rc<ViewContext> {
        &self.context
    }

    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.context.descriptor
    }

    pub fn element(&self) -> Option<Node> {
        self.element.upgrade()
    }

    /// Reference captured by this view's template.
    pub fn reference(&self, name: &str) -> Option<Node> {
        self.engine.reference(name)
    }

    /// Whether the first attachment has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub fn is_host_bound(&self) -> bool {
        self.host_subscriptions.borrow().is_some()
    }

    /// Subscribe to changes of the observed attribute `name`.
    pub fn on_attribute(&self, name: &str, handler: impl Fn() + 'static) -> Subscription {
        self.events.subscribe(name, handler)
    }

    /// View of the component whose template created this element.
    pub fn parent(&self) -> Option<Rc<ViewContext>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: &Rc<ViewContext>) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
    }

    // -------------------------------------------------------------------------
    // Sequences
    // -------------------------------------------------------------------------

    fn run_hooks(&self, hooks: &[Hook]) {
        for hook in hooks {
            self.context.model.run_hook(*hook);
        }
    }

    fn attach(&self, element: &Node) {
        let descriptor = &self.context.descriptor;
        trace!(selector = descriptor.selector.as_str(), "attach");

        self.run_hooks(&Hook::ATTACH_BEFORE_RENDER);
        if let Err(err) = self.engine.render_view(element) {
            error!(selector = descriptor.selector.as_str(), error = %err, "render failed");
            self.engine.report(err);
        }
        if let Some(field) = &descriptor.view {
            self.context.model.attach_element(field, element.clone());
        }
        if !self.is_host_bound() {
            let subscriptions = host::bind(self, element);
            *self.host_subscriptions.borrow_mut() = Some(subscriptions);
        }
        self.run_hooks(&Hook::ATTACH_AFTER_RENDER);
        self.initialized.set(true);
    }

    fn detach(&self) {
        trace!(selector = self.context.descriptor.selector.as_str(), "detach");
        self.context.model.run_hook(Hook::OnDestroy);
        self.engine.teardown();
        self.host_subscriptions.borrow_mut().take();
    }
}

impl CustomElement for ViewInstance {
    fn connected(&self, element: &Node) {
        self.attach(element);
    }

    fn disconnected(&self, _element: &Node) {
        self.detach();
    }

    fn adopted(&self, element: &Node) {
        if element.is_connected() {
            self.attach(element);
        }
    }

    fn attribute_changed(&self, _element: &Node, name: &str, old: Option<&str>, new: Option<&str>) {
        if old == new {
            return;
        }
        self.events.emit(name);
        if self.initialized.get() {
            self.run_hooks(&Hook::RECHECK);
        } else {
            self.context.model.run_hook(Hook::OnChanges);
        }
    }

    fn intercepts(&self, name: &str) -> bool {
        self.context.descriptor.input_for(name).is_some()
    }

    fn read_property(&self, name: &str) -> Option<Value> {
        let input = self.context.descriptor.input_for(name)?;
        self.context.model.get(&input.model)
    }

    fn write_property(&self, element: &Node, name: &str, value: Value) {
        let Some(input) = self.context.descriptor.input_for(name) else { return };
        self.context.model.set(&input.model, value.clone());
        if value.is_null() {
            element.remove_attribute(name);
        } else {
            element.set_native_attribute(name, &to_text(&value));
        }
    }

    fn on_property_change(
        &self,
        name: &str,
        handler: Box<dyn Fn()>,
    ) -> Result<Subscription, Box<dyn Fn()>> {
        match self.context.descriptor.input_for(name) {
            Some(input) => Ok(self.context.model.subscribe(&input.model, handler)),
            None => Err(handler),
        }
    }

    fn emit_property_change(&self, name: &str) -> Option<usize> {
        let input = self.context.descriptor.input_for(name)?;
        Some(self.context.model.bus().emit(&input.model))
    }

    fn output(&self, name: &str) -> Option<EventEmitter> {
        let output = self.context.descriptor.output_for(name)?;
        self.context.model.output(&output.model)
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl std::fmt::Debug for ViewInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewInstance")
            .field("selector", &self.context.descriptor.selector)
            .field("initialized", &self.initialized.get())
            .field("host_bound", &self.is_host_bound())
            .finish()
    }
}
