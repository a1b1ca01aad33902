//! Component descriptors - the declaration-time description of a component.
//!
//! The metadata half is plain data and can be loaded from JSON; the template
//! factory is attached in code.
//!
//! ```ignore
//! let descriptor = ComponentDescriptor::new("user-card")
//!     .input_as("userName", "name")
//!     .output("selected")
//!     .host_listener("click", "onClick")
//!     .template(|| el("span").text("{{ name }}").into());
//! ```

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::template::{TemplateFn, TemplateNode};

// =============================================================================
// References
// =============================================================================

/// A model field exposed to the view, optionally under another name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    /// Field name on the model.
    pub model: String,
    /// Attribute/event name seen by templates. Defaults to `model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl PropertyRef {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            view: None,
        }
    }

    pub fn aliased(model: &str, view: &str) -> Self {
        Self {
            model: model.to_string(),
            view: Some(view.to_string()),
        }
    }

    pub fn view_name(&self) -> &str {
        self.view.as_deref().unwrap_or(&self.model)
    }
}

/// A model field that receives a captured template reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub field: String,
    /// Reference name, with or without the leading `#`.
    pub selector: String,
}

/// A host event wired to a model method.
///
/// `event` may be prefixed with `window:` (global events) or `name:` (a
/// captured reference). `args` lists what to pass: `$event` is the event
/// payload, anything else is a model path. Empty `args` passes the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerRef {
    pub event: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub handler: String,
}

/// A model property mirrored onto a host element property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostBindingRef {
    pub property: String,
    pub host_property: String,
}

// =============================================================================
// ComponentDescriptor
// =============================================================================

/// Everything the runtime needs to synthesize a component's element type.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub selector: String,
    #[serde(default)]
    pub style: Option<String>,
    /// Built-in tag this component customizes.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub inputs: Vec<PropertyRef>,
    #[serde(default)]
    pub outputs: Vec<PropertyRef>,
    #[serde(default)]
    pub children: Vec<ChildRef>,
    #[serde(default)]
    pub host_listeners: Vec<ListenerRef>,
    #[serde(default)]
    pub host_bindings: Vec<HostBindingRef>,
    /// Model field that receives the host element after rendering.
    #[serde(default)]
    pub view: Option<String>,
    #[serde(skip)]
    pub template: Option<TemplateFn>,
}

impl ComponentDescriptor {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            ..Default::default()
        }
    }

    /// Load the metadata part from JSON. Attach the template with
    /// [`ComponentDescriptor::template`].
    pub fn from_manifest(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn template(mut self, template: impl Fn() -> TemplateNode + 'static) -> Self {
        self.template = Some(Rc::new(template));
        self
    }

    pub fn style(mut self, style: &str) -> Self {
        self.style = Some(style.to_string());
        self
    }

    pub fn extends(mut self, tag: &str) -> Self {
        self.extends = Some(tag.to_string());
        self
    }

    pub fn input(mut self, model: &str) -> Self {
        self.inputs.push(PropertyRef::new(model));
        self
    }

    pub fn input_as(mut self, model: &str, view: &str) -> Self {
        self.inputs.push(PropertyRef::aliased(model, view));
        self
    }

    pub fn output(mut self, model: &str) -> Self {
        self.outputs.push(PropertyRef::new(model));
        self
    }

    pub fn output_as(mut self, model: &str, view: &str) -> Self {
        self.outputs.push(PropertyRef::aliased(model, view));
        self
    }

    pub fn child(mut self, field: &str, selector: &str) -> Self {
        self.children.push(ChildRef {
            field: field.to_string(),
            selector: selector.to_string(),
        });
        self
    }

    pub fn host_listener(self, event: &str, handler: &str) -> Self {
        self.host_listener_with(event, handler, &[])
    }

    pub fn host_listener_with(mut self, event: &str, handler: &str, args: &[&str]) -> Self {
        self.host_listeners.push(ListenerRef {
            event: event.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            handler: handler.to_string(),
        });
        self
    }

    pub fn host_binding(mut self, property: &str, host_property: &str) -> Self {
        self.host_bindings.push(HostBindingRef {
            property: property.to_string(),
            host_property: host_property.to_string(),
        });
        self
    }

    pub fn view(mut self, field: &str) -> Self {
        self.view = Some(field.to_string());
        self
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Input declared under view-facing name `view`.
    pub fn input_for(&self, view: &str) -> Option<&PropertyRef> {
        self.inputs.iter().find(|i| i.view_name() == view)
    }

    /// Output declared under view-facing name `view`.
    pub fn output_for(&self, view: &str) -> Option<&PropertyRef> {
        self.outputs.iter().find(|o| o.view_name() == view)
    }

    /// View-facing input names; the element's observed attributes.
    pub fn observed_attributes(&self) -> Vec<String> {
        self.inputs.iter().map(|i| i.view_name().to_string()).collect()
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("selector", &self.selector)
            .field("extends", &self.extends)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("children", &self.children)
            .field("host_listeners", &self.host_listeners)
            .field("host_bindings", &self.host_bindings)
            .field("view", &self.view)
            .field("template", &self.template.is_some())
            .finish()
    }
}
