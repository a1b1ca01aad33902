//! Runtime - ties a window, a component registry and a configuration.
//!
//! # Usage
//!
//! ```ignore
//! let runtime = Runtime::new()?;
//! runtime.component(
//!     ComponentDescriptor::new("hello-card")
//!         .input("name")
//!         .template(|| el("p").text("Hello {{name}}!").into()),
//!     || ModelObject::new().with("name", json!("Ann")),
//! )?;
//!
//! let handle = runtime.mount("hello-card")?;
//! assert_eq!(handle.element().map(|e| e.text_content()), Some("Hello Ann!".into()));
//! handle.unmount();
//! ```

use std::rc::Rc;

use tracing::debug;

use crate::component::{ComponentDescriptor, ComponentEntry, Registry, ViewClass, ViewInstance};
use crate::config::Config;
use crate::directives;
use crate::dom::{Document, Node, Window, is_valid_name};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::render::{Directive, DirectiveContext};

// =============================================================================
// Runtime
// =============================================================================

pub struct Runtime {
    window: Window,
    registry: Rc<Registry>,
    config: Config,
}

impl Runtime {
    /// Runtime on a fresh window with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_window(Window::new(), config)
    }

    /// Runtime defining its components on an existing window.
    pub fn with_window(window: Window, config: Config) -> Result<Self> {
        let registry = Rc::new(Registry::new());
        if config.builtin_directives {
            directives::register_builtin(&registry)?;
        }
        Ok(Self {
            window,
            registry,
            config,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> Document {
        self.window.document()
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a component backed by model type `M` and define its element.
    pub fn component<M: Model>(
        &self,
        descriptor: ComponentDescriptor,
        factory: impl Fn() -> M + 'static,
    ) -> Result<()> {
        validate(&descriptor)?;
        let entry = self.registry.register_component(descriptor, factory)?;
        self.define(entry)
    }

    /// Register a component whose model is built dynamically.
    pub fn component_dynamic(
        &self,
        descriptor: ComponentDescriptor,
        factory: impl Fn() -> Box<dyn Model> + 'static,
    ) -> Result<()> {
        validate(&descriptor)?;
        let entry = self.registry.register_dynamic(descriptor, factory)?;
        self.define(entry)
    }

    /// Register a structural directive under comma-separated selectors.
    pub fn directive(
        &self,
        selectors: &str,
        constructor: impl Fn(DirectiveContext) -> Result<Box<dyn Directive>> + 'static,
    ) -> Result<()> {
        self.registry.register_directive(selectors, constructor)
    }

    fn define(&self, entry: Rc<ComponentEntry>) -> Result<()> {
        let selector = entry.descriptor.selector.clone();
        let extends = entry.descriptor.extends.clone();
        let class = ViewClass::new(entry, self.registry.clone(), self.config.clone());
        self.window
            .custom_elements()
            .define(&selector, Rc::new(class), extends.as_deref())?;
        debug!(selector = selector.as_str(), "component defined");
        Ok(())
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Create a detached element for a registered component.
    pub fn create(&self, selector: &str) -> Result<Node> {
        let descriptor = self
            .registry
            .descriptor(selector)
            .ok_or_else(|| Error::UnknownComponent(selector.to_string()))?;
        let document = self.document();
        Ok(match &descriptor.extends {
            Some(tag) => document.create_element_is(tag, selector),
            None => document.create_element(selector),
        })
    }

    /// Create a component element and append it to the document body.
    pub fn mount(&self, selector: &str) -> Result<MountHandle> {
        let element = self.create(selector)?;
        self.document().body().append_child(&element);
        debug!(selector, "mounted");
        Ok(MountHandle {
            element: Some(element),
        })
    }
}

fn validate(descriptor: &ComponentDescriptor) -> Result<()> {
    if is_valid_name(&descriptor.selector) {
        Ok(())
    } else {
        Err(Error::InvalidTagName(descriptor.selector.clone()))
    }
}

// =============================================================================
// MountHandle
// =============================================================================

/// A mounted component. Dropping the handle removes the element.
pub struct MountHandle {
    element: Option<Node>,
}

impl MountHandle {
    pub fn element(&self) -> Option<&Node> {
        self.element.as_ref()
    }

    pub fn view(&self) -> Option<Rc<ViewInstance>> {
        self.element.as_ref().and_then(ViewInstance::of)
    }

    /// Remove the element from the document, running its destroy sequence.
    pub fn unmount(mut self) {
        if let Some(element) = self.element.take() {
            element.remove();
        }
    }

    /// Keep the element mounted after the handle is gone.
    pub fn detach(mut self) -> Option<Node> {
        self.element.take()
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        if let Some(element) = self.element.take() {
            element.remove();
        }
    }
}
