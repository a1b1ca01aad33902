//! ModelObject - a dynamic model built from closures.
//!
//! Useful for components that do not warrant a hand-written struct, and used
//! internally as the local scope of structural directives.
//!
//! ```ignore
//! let model = ModelObject::new()
//!     .with("count", json!(0))
//!     .method("increment", |m, _args| {
//!         let next = m.get("count").and_then(Value::as_i64).unwrap_or(0) + 1;
//!         m.set("count", json!(next));
//!         Value::Null
//!     })
//!     .hook(Hook::OnInit, |m| m.set("ready", json!(true)))
//!     .output("changed");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::emitter::EventEmitter;
use super::lifecycle::{Hook, Hooks, Lifecycle};
use super::Model;
use crate::dom::Node;
use crate::types::Value;

/// Method body: receives the model and the call arguments.
pub type Method = Rc<dyn Fn(&mut ModelObject, &[Value]) -> Value>;

/// Lifecycle hook body.
pub type HookFn = Rc<dyn Fn(&mut ModelObject)>;

/// Property bag implementing [`Model`].
#[derive(Clone, Default)]
pub struct ModelObject {
    properties: BTreeMap<String, Value>,
    methods: HashMap<String, Method>,
    hooks: HashMap<Hook, HookFn>,
    outputs: HashMap<String, EventEmitter>,
    elements: HashMap<String, Node>,
}

impl ModelObject {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn method(
        mut self,
        name: &str,
        body: impl Fn(&mut ModelObject, &[Value]) -> Value + 'static,
    ) -> Self {
        self.methods.insert(name.to_string(), Rc::new(body));
        self
    }

    /// Declare a lifecycle hook. Only hooks registered here are invoked.
    pub fn hook(mut self, hook: Hook, body: impl Fn(&mut ModelObject) + 'static) -> Self {
        self.hooks.insert(hook, Rc::new(body));
        self
    }

    /// Declare an output with a fresh emitter.
    pub fn output(self, name: &str) -> Self {
        self.output_emitter(name, EventEmitter::new())
    }

    /// Declare an output backed by an existing emitter.
    pub fn output_emitter(mut self, name: &str, emitter: EventEmitter) -> Self {
        self.outputs.insert(name.to_string(), emitter);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_string(), value);
    }

    pub fn emitter(&self, name: &str) -> Option<&EventEmitter> {
        self.outputs.get(name)
    }

    /// Element assigned to a view-child or view-binding field.
    pub fn element(&self, field: &str) -> Option<&Node> {
        self.elements.get(field)
    }

    fn run(&mut self, hook: Hook) {
        if let Some(body) = self.hooks.get(&hook).cloned() {
            body(self);
        }
    }
}

impl Lifecycle for ModelObject {
    fn hooks(&self) -> Hooks {
        self.hooks
            .keys()
            .fold(Hooks::empty(), |acc, hook| acc | hook.flag())
    }

    fn on_changes(&mut self) {
        self.run(Hook::OnChanges);
    }
    fn on_init(&mut self) {
        self.run(Hook::OnInit);
    }
    fn do_check(&mut self) {
        self.run(Hook::DoCheck);
    }
    fn after_content_init(&mut self) {
        self.run(Hook::AfterContentInit);
    }
    fn after_content_checked(&mut self) {
        self.run(Hook::AfterContentChecked);
    }
    fn after_view_init(&mut self) {
        self.run(Hook::AfterViewInit);
    }
    fn after_view_checked(&mut self) {
        self.run(Hook::AfterViewChecked);
    }
    fn on_destroy(&mut self) {
        self.run(Hook::OnDestroy);
    }
}

impl Model for ModelObject {
    fn property(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }

    fn set_property(&mut self, name: &str, value: Value) -> bool {
        self.properties.insert(name.to_string(), value);
        true
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn is_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Option<Value> {
        let body = self.methods.get(method).cloned()?;
        Some(body(self, args))
    }

    fn output(&self, name: &str) -> Option<EventEmitter> {
        self.outputs.get(name).cloned()
    }

    fn attach_element(&mut self, field: &str, element: Node) -> bool {
        self.elements.insert(field.to_string(), element);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lifecycle::dispatch;
    use serde_json::json;

    #[test]
    fn test_declared_hooks_follow_registration() {
        let mut model = ModelObject::new()
            .hook(Hook::OnInit, |m| m.set("ready", json!(true)))
            .hook(Hook::OnDestroy, |_| {});
        assert_eq!(model.hooks(), Hooks::ON_INIT | Hooks::ON_DESTROY);

        assert!(dispatch(&mut model, Hook::OnInit));
        assert!(!dispatch(&mut model, Hook::DoCheck));
        assert_eq!(model.get("ready"), Some(&json!(true)));
    }

    #[test]
    fn test_call_passes_arguments() {
        let mut model = ModelObject::new().method("echo", |_, args| args[0].clone());
        assert!(model.is_method("echo"));
        assert_eq!(model.call("echo", &[json!("hi")]), Some(json!("hi")));
        assert_eq!(model.call("missing", &[]), None);
    }
}
