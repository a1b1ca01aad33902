//! Registry - components by model type and selector, directives by selector.
//!
//! One registry is shared by a runtime and every view it synthesizes. It is
//! an explicit object: two runtimes never see each other's registrations.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::descriptor::ComponentDescriptor;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::render::{Directive, DirectiveContext};

/// Builds a fresh model for each element instance.
pub type ModelFactory = Rc<dyn Fn() -> Box<dyn Model>>;

/// Builds a directive instance for each anchor.
pub type DirectiveConstructor = Rc<dyn Fn(DirectiveContext) -> Result<Box<dyn Directive>>>;

/// A registered component.
pub struct ComponentEntry {
    pub descriptor: Rc<ComponentDescriptor>,
    pub factory: ModelFactory,
    pub model_type: Option<TypeId>,
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("selector", &self.descriptor.selector)
            .field("typed", &self.model_type.is_some())
            .finish()
    }
}

/// A registered directive. One descriptor may answer to several selectors.
pub struct DirectiveDescriptor {
    pub selectors: Vec<String>,
    pub constructor: DirectiveConstructor,
}

#[derive(Default)]
pub struct Registry {
    components: RefCell<HashMap<String, Rc<ComponentEntry>>>,
    by_type: RefCell<HashMap<TypeId, String>>,
    directives: RefCell<HashMap<String, Rc<DirectiveDescriptor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Register a component backed by model type `M`.
    pub fn register_component<M: Model>(
        &self,
        descriptor: ComponentDescriptor,
        factory: impl Fn() -> M + 'static,
    ) -> Result<Rc<ComponentEntry>> {
        let factory: ModelFactory = Rc::new(move || Box::new(factory()) as Box<dyn Model>);
        let entry = self.insert(descriptor, factory, Some(TypeId::of::<M>()))?;
        self.by_type
            .borrow_mut()
            .entry(TypeId::of::<M>())
            .or_insert_with(|| entry.descriptor.selector.clone());
        Ok(entry)
    }

    /// Register a component whose model is built dynamically.
    pub fn register_dynamic(
        &self,
        descriptor: ComponentDescriptor,
        factory: impl Fn() -> Box<dyn Model> + 'static,
    ) -> Result<Rc<ComponentEntry>> {
        self.insert(descriptor, Rc::new(factory), None)
    }

    fn insert(
        &self,
        descriptor: ComponentDescriptor,
        factory: ModelFactory,
        model_type: Option<TypeId>,
    ) -> Result<Rc<ComponentEntry>> {
        let selector = descriptor.selector.clone();
        let mut components = self.components.borrow_mut();
        if components.contains_key(&selector) {
            return Err(Error::DuplicateSelector(selector));
        }
        let entry = Rc::new(ComponentEntry {
            descriptor: Rc::new(descriptor),
            factory,
            model_type,
        });
        components.insert(selector.clone(), entry.clone());
        debug!(selector = selector.as_str(), "component registered");
        Ok(entry)
    }

    pub fn component(&self, selector: &str) -> Option<Rc<ComponentEntry>> {
        self.components.borrow().get(selector).cloned()
    }

    pub fn component_of<M: Model>(&self) -> Option<Rc<ComponentEntry>> {
        let selector = self.by_type.borrow().get(&TypeId::of::<M>()).cloned()?;
        self.component(&selector)
    }

    pub fn descriptor(&self, selector: &str) -> Option<Rc<ComponentDescriptor>> {
        self.component(selector).map(|e| e.descriptor.clone())
    }

    /// Whether the component at `selector` declares output `name`.
    pub fn has_output(&self, selector: &str, name: &str) -> bool {
        self.component(selector)
            .is_some_and(|e| e.descriptor.output_for(name).is_some())
    }

    pub fn selectors(&self) -> Vec<String> {
        let mut selectors: Vec<String> = self.components.borrow().keys().cloned().collect();
        selectors.sort();
        selectors
    }

    // =========================================================================
    // Directives
    // =========================================================================

    /// Register a directive under a comma-separated list of selectors.
    pub fn register_directive(
        &self,
        selectors: &str,
        constructor: impl Fn(DirectiveContext) -> Result<Box<dyn Directive>> + 'static,
    ) -> Result<()> {
        let names: Vec<String> = selectors
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let mut directives = self.directives.borrow_mut();
        if let Some(taken) = names.iter().find(|n| directives.contains_key(*n)) {
            return Err(Error::DuplicateSelector(taken.clone()));
        }
        let descriptor = Rc::new(DirectiveDescriptor {
            selectors: names.clone(),
            constructor: Rc::new(constructor),
        });
        for name in names {
            debug!(selector = name.as_str(), "directive registered");
            directives.insert(name, descriptor.clone());
        }
        Ok(())
    }

    pub fn directive(&self, selector: &str) -> Option<Rc<DirectiveDescriptor>> {
        self.directives.borrow().get(selector).cloned()
    }
}
