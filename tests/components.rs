//! Component behaviour through the public API: registration, bindings,
//! interpolation, lifecycle ordering, host listeners and placeholders.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use spark_elements::dom::MutationObserver;
use spark_elements::{
    ComponentDescriptor, Error, Event, Hook, Lifecycle, Model, ModelObject, Node, Runtime, Value,
    ViewInstance, el,
};

/// Route `tracing` output to the test harness; filter with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let count_clone = count.clone();
    (count, move || count_clone.set(count_clone.get() + 1))
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_lookup_returns_identical_descriptor() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("user-card").input("name"), ModelObject::new)
        .unwrap();

    let a = runtime.registry().descriptor("user-card").unwrap();
    let b = runtime.registry().component_of::<ModelObject>().unwrap().descriptor.clone();
    assert!(Rc::ptr_eq(&a, &b));
    assert!(runtime.window().custom_elements().is_defined("user-card"));
}

#[test]
fn test_duplicate_registration_fails() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("user-card"), ModelObject::new)
        .unwrap();
    let err = runtime
        .component(ComponentDescriptor::new("user-card"), ModelObject::new)
        .unwrap_err();
    assert_eq!(err, Error::DuplicateSelector("user-card".into()));
}

// =============================================================================
// Bindings
// =============================================================================

#[test]
fn test_one_way_binding_updates_once_per_write() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-title")
                .template(|| el("span").attr("#label", "").attr("[title]", "caption").into()),
            || ModelObject::new().with("caption", json!("a")).with("other", json!(0)),
        )
        .unwrap();

    let handle = runtime.mount("x-title").unwrap();
    let view = handle.view().unwrap();
    let span = view.reference("label").unwrap();
    assert_eq!(span.get_attribute("title").as_deref(), Some("a"));

    let (writes, bump) = counter();
    let observer = MutationObserver::new(move |_| bump());
    let _watch = observer.observe(&span, Some("title"));

    view.model().set("caption", json!("b"));
    assert_eq!(writes.get(), 1);
    assert_eq!(span.get_attribute("title").as_deref(), Some("b"));

    view.model().set("other", json!(1));
    assert_eq!(writes.get(), 1, "Unrelated writes do not touch the attribute");

    view.model().set("caption", json!("b"));
    assert_eq!(writes.get(), 1, "Equal writes are suppressed");
}

#[test]
fn test_two_way_text_input_updates_model_once() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-form")
                .template(|| el("input").attr("#field", "").attr("[(value)]", "name").into()),
            || ModelObject::new().with("name", json!("Ann")),
        )
        .unwrap();

    let handle = runtime.mount("x-form").unwrap();
    let view = handle.view().unwrap();
    let field = view.reference("field").unwrap();
    assert_eq!(field.get_attribute("value").as_deref(), Some("Ann"));

    let (changes, bump) = counter();
    let _sub = view.model().subscribe("name", bump);

    field.set_attribute("value", "Bo");
    assert_eq!(changes.get(), 0, "Attribute writes alone are not user input");

    field.dispatch_event(&Event::new("input"));
    assert_eq!(changes.get(), 1);
    assert_eq!(view.model().get("name"), Some(json!("Bo")));
    assert_eq!(field.get_attribute("value").as_deref(), Some("Bo"));
}

#[test]
fn test_two_way_plain_element_uses_mutation_observer() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-panel")
                .template(|| el("div").attr("#panel", "").attr("[(title)]", "heading").into()),
            || ModelObject::new().with("heading", json!("one")),
        )
        .unwrap();

    let handle = runtime.mount("x-panel").unwrap();
    let view = handle.view().unwrap();
    let panel = view.reference("panel").unwrap();

    panel.set_attribute("title", "two");
    assert_eq!(view.model().get("heading"), Some(json!("two")));

    view.model().set("heading", json!("three"));
    assert_eq!(panel.get_attribute("title").as_deref(), Some("three"));
}

#[test]
fn test_two_way_with_nested_component() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("x-counter").input("count"), || {
            ModelObject::new().with("count", json!(0))
        })
        .unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-host")
                .template(|| el("x-counter").attr("#counter", "").attr("[(count)]", "total").into()),
            || ModelObject::new().with("total", json!(3)),
        )
        .unwrap();

    let handle = runtime.mount("x-host").unwrap();
    let view = handle.view().unwrap();
    let counter = ViewInstance::of(&view.reference("counter").unwrap()).unwrap();
    assert_eq!(counter.model().get("count"), Some(json!(3)));

    counter.model().set("count", json!(5));
    assert_eq!(view.model().get("total"), Some(json!(5)));

    view.model().set("total", json!(8));
    assert_eq!(counter.model().get("count"), Some(json!(8)));
}

#[test]
fn test_missing_source_binds_once_it_appears() {
    init_tracing();
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-late-source")
                .template(|| el("span").attr("#s", "").attr("[title]", "nothing.here").into()),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-late-source").unwrap();
    let view = handle.view().unwrap();
    let span = view.reference("s").unwrap();
    assert_eq!(span.get_attribute("title"), None);
    assert!(view.engine().errors().is_empty());

    view.model().set("nothing", json!({ "here": "x" }));
    assert_eq!(span.get_attribute("title").as_deref(), Some("x"));
}

#[test]
fn test_two_way_input_creates_missing_model_property() {
    init_tracing();
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-draft")
                .template(|| el("input").attr("#field", "").attr("[(value)]", "draft").into()),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-draft").unwrap();
    let view = handle.view().unwrap();
    let field = view.reference("field").unwrap();
    assert_eq!(field.get_attribute("value"), None);

    field.set_attribute("value", "typed");
    field.dispatch_event(&Event::new("input"));
    assert_eq!(view.model().get("draft"), Some(json!("typed")));

    view.model().set("draft", json!("reset"));
    assert_eq!(field.get_attribute("value").as_deref(), Some("reset"));
}

#[test]
fn test_reference_attribute_propagates_to_bindings() {
    init_tracing();
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-mirror").template(|| {
                el("section")
                    .child(el("span").attr("#label", "").attr("title", "a"))
                    .child(el("p").attr("#out", "").text("{{#label.title}}"))
                    .child(el("b").attr("#copy", "").attr("[title]", "label.title"))
                    .into()
            }),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-mirror").unwrap();
    let view = handle.view().unwrap();
    let label = view.reference("label").unwrap();
    let out = view.reference("out").unwrap();
    let copy = view.reference("copy").unwrap();
    assert_eq!(out.text_content(), "a");
    assert_eq!(copy.get_attribute("title").as_deref(), Some("a"));

    label.set_attribute("title", "b");
    assert_eq!(out.text_content(), "b");
    assert_eq!(copy.get_attribute("title").as_deref(), Some("b"));

    handle.unmount();
    label.set_attribute("title", "c");
    assert_eq!(out.text_content(), "b", "Bindings are released with the view");
}

#[test]
fn test_configuration_errors_are_recorded_and_siblings_render() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-broken").template(|| {
                el("div")
                    .child(el("comment").attr("#note", "").attr("comment", "n"))
                    .child(el("span").attr("[title]", "#note.data"))
                    .child(el("span").attr("[title]", "  "))
                    .child(el("b").text("ok"))
                    .into()
            }),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-broken").unwrap();
    let view = handle.view().unwrap();
    assert_eq!(handle.element().unwrap().text_content(), "ok");
    assert_eq!(
        view.engine().errors(),
        vec![
            Error::NotAnElement {
                reference: "note".into(),
                kind: "comment",
            },
            Error::EmptyExpression { context: String::new() },
        ]
    );
}

// =============================================================================
// Interpolation
// =============================================================================

#[test]
fn test_interpolation_updates_same_text_node() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-greet")
                .template(|| el("p").attr("#p", "").text("Hello {{name}}!").into()),
            || ModelObject::new().with("name", json!("Ann")),
        )
        .unwrap();

    let handle = runtime.mount("x-greet").unwrap();
    let view = handle.view().unwrap();
    let p = view.reference("p").unwrap();
    let text = p.first_child().unwrap();
    assert_eq!(text.data(), "Hello Ann!");

    view.model().set("name", json!("Bo"));
    assert_eq!(p.first_child(), Some(text.clone()));
    assert_eq!(text.data(), "Hello Bo!");
}

#[test]
fn test_interpolated_attribute_and_method_call() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-full").template(|| {
                el("span")
                    .attr("#s", "")
                    .attr("title", "{{ first }} {{ last }}")
                    .text("{{ fullName() }}")
                    .into()
            }),
            || {
                ModelObject::new()
                    .with("first", json!("Ada"))
                    .with("last", json!("Lovelace"))
                    .method("fullName", |m, _| {
                        let first = m.get("first").cloned().unwrap_or(Value::Null);
                        let last = m.get("last").cloned().unwrap_or(Value::Null);
                        json!(format!("{} {}", first.as_str().unwrap_or(""), last.as_str().unwrap_or("")))
                    })
            },
        )
        .unwrap();

    let handle = runtime.mount("x-full").unwrap();
    let view = handle.view().unwrap();
    let span = view.reference("s").unwrap();
    assert_eq!(span.get_attribute("title").as_deref(), Some("Ada Lovelace"));
    assert_eq!(span.text_content(), "Ada Lovelace");

    view.model().set("last", json!("King"));
    assert_eq!(span.get_attribute("title").as_deref(), Some("Ada King"));
    assert_eq!(span.text_content(), "Ada King");
}

// =============================================================================
// Attributes and lifecycle
// =============================================================================

#[test]
fn test_equal_attribute_write_is_silent() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("x-label").input("label"), || {
            ModelObject::new().with("label", json!("x"))
        })
        .unwrap();

    let handle = runtime.mount("x-label").unwrap();
    let element = handle.element().unwrap();
    let view = handle.view().unwrap();
    assert_eq!(element.get_attribute("label").as_deref(), Some("x"));

    let (attribute_events, bump_attribute) = counter();
    let (model_events, bump_model) = counter();
    let _a = view.on_attribute("label", bump_attribute);
    let _b = view.model().subscribe("label", bump_model);

    element.set_attribute("label", "x");
    assert_eq!((attribute_events.get(), model_events.get()), (0, 0));

    element.set_attribute("label", "y");
    assert_eq!((attribute_events.get(), model_events.get()), (1, 1));
    assert_eq!(view.model().get("label"), Some(json!("y")));
}

fn logging_model(log: &Rc<RefCell<Vec<Hook>>>) -> ModelObject {
    let hooks = [
        Hook::OnChanges,
        Hook::OnInit,
        Hook::DoCheck,
        Hook::AfterContentInit,
        Hook::AfterContentChecked,
        Hook::AfterViewInit,
        Hook::AfterViewChecked,
        Hook::OnDestroy,
    ];
    let mut model = ModelObject::new().with("label", json!("a"));
    for hook in hooks {
        let log = log.clone();
        model = model.hook(hook, move |_| log.borrow_mut().push(hook));
    }
    model
}

#[test]
fn test_first_attachment_hook_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::new().unwrap();
    let factory_log = log.clone();
    runtime
        .component(ComponentDescriptor::new("x-hooks").input("label"), move || {
            logging_model(&factory_log)
        })
        .unwrap();

    let handle = runtime.mount("x-hooks").unwrap();
    assert_eq!(
        log.take(),
        vec![
            Hook::OnChanges,
            Hook::OnInit,
            Hook::DoCheck,
            Hook::AfterContentInit,
            Hook::AfterContentChecked,
            Hook::AfterViewInit,
            Hook::AfterViewChecked,
        ]
    );

    handle.element().unwrap().set_attribute("label", "b");
    assert_eq!(
        log.take(),
        vec![Hook::DoCheck, Hook::AfterContentChecked, Hook::AfterViewChecked],
        "After first attachment attribute changes run the check sequence"
    );

    handle.unmount();
    assert_eq!(log.take(), vec![Hook::OnDestroy]);
}

#[test]
fn test_attribute_change_before_attach_runs_on_changes() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::new().unwrap();
    let factory_log = log.clone();
    runtime
        .component(ComponentDescriptor::new("x-early").input("label"), move || {
            logging_model(&factory_log)
        })
        .unwrap();

    let element = runtime.create("x-early").unwrap();
    element.set_attribute("label", "b");
    assert_eq!(log.take(), vec![Hook::OnChanges]);
}

#[test]
fn test_adoption_replays_attachment() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::new().unwrap();
    let factory_log = log.clone();
    runtime
        .component(
            ComponentDescriptor::new("x-moved").template(|| el("i").text("{{label}}").into()),
            move || logging_model(&factory_log),
        )
        .unwrap();

    let handle = runtime.mount("x-moved").unwrap();
    let element = handle.detach().unwrap();
    log.take();

    let other = runtime.window().create_document();
    other.body().append_child(&element);

    let replay = log.take();
    assert_eq!(replay.first(), Some(&Hook::OnDestroy));
    assert_eq!(&replay[1..], &Hook::ATTACH_BEFORE_RENDER.iter().chain(Hook::ATTACH_AFTER_RENDER.iter()).copied().collect::<Vec<_>>()[..]);
    assert_eq!(element.text_content(), "a", "Rendered again in the new document");
    assert_eq!(element.owner_document(), Some(other));
}

// =============================================================================
// Host listeners, outputs and host bindings
// =============================================================================

fn clicker() -> ModelObject {
    ModelObject::new()
        .with("clicks", json!(0))
        .with("step", json!(2))
        .with("last", Value::Null)
        .method("onClick", |m, args| {
            let clicks = m.get("clicks").and_then(Value::as_i64).unwrap_or(0);
            let step = args.get(1).and_then(Value::as_i64).unwrap_or(1);
            m.set("clicks", json!(clicks + step));
            m.set("last", args.first().cloned().unwrap_or(Value::Null));
            Value::Null
        })
}

#[test]
fn test_host_listener_on_native_event() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-click").host_listener_with("click", "onClick", &["$event", "step"]),
            clicker,
        )
        .unwrap();

    let handle = runtime.mount("x-click").unwrap();
    let view = handle.view().unwrap();
    handle.element().unwrap().dispatch_event(&Event::with_detail("click", json!("d")));

    assert_eq!(view.model().get("clicks"), Some(json!(2)));
    assert_eq!(view.model().get("last.detail"), Some(json!("d")));
}

#[test]
fn test_named_host_listener_targets_reference() {
    init_tracing();
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-named")
                .host_listener("btn:click", "onClick")
                .template(|| el("button").attr("#btn", "").text("go").into()),
            clicker,
        )
        .unwrap();

    let handle = runtime.mount("x-named").unwrap();
    let view = handle.view().unwrap();
    let host = handle.element().unwrap();

    host.dispatch_event(&Event::new("click"));
    assert_eq!(view.model().get("clicks"), Some(json!(0)), "The host itself is not listened to");

    view.reference("btn").unwrap().dispatch_event(&Event::new("click"));
    assert_eq!(view.model().get("clicks"), Some(json!(1)));
}

#[test]
fn test_named_host_listener_falls_back_to_host() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("x-unnamed").host_listener("missing:click", "onClick"), clicker)
        .unwrap();

    let handle = runtime.mount("x-unnamed").unwrap();
    let view = handle.view().unwrap();
    handle.element().unwrap().dispatch_event(&Event::new("click"));
    assert_eq!(view.model().get("clicks"), Some(json!(1)));
}

#[test]
fn test_window_listener_released_on_unmount() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("x-resize").host_listener("window:resize", "onClick"), clicker)
        .unwrap();

    let handle = runtime.mount("x-resize").unwrap();
    let view = handle.view().unwrap();
    assert_eq!(runtime.window().listener_count("resize"), 1);

    runtime.window().dispatch_event(&Event::new("resize"));
    assert_eq!(view.model().get("clicks"), Some(json!(1)));

    handle.unmount();
    assert_eq!(runtime.window().listener_count("resize"), 0);
}

#[test]
fn test_duplicate_host_listener_is_discarded() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-twice")
                .host_listener("click", "onClick")
                .host_listener("click", "onClick"),
            clicker,
        )
        .unwrap();

    let handle = runtime.mount("x-twice").unwrap();
    assert_eq!(handle.element().unwrap().listener_count("click"), 1);
}

#[test]
fn test_event_binding_on_component_output() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("x-picker").output("picked"), || {
            ModelObject::new().output("picked")
        })
        .unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-shop")
                .template(|| el("x-picker").attr("#picker", "").attr("(picked)", "onPick").into()),
            || {
                ModelObject::new().with("choice", Value::Null).method("onPick", |m, args| {
                    m.set("choice", args.first().cloned().unwrap_or(Value::Null));
                    Value::Null
                })
            },
        )
        .unwrap();

    let handle = runtime.mount("x-shop").unwrap();
    let view = handle.view().unwrap();
    let picker = ViewInstance::of(&view.reference("picker").unwrap()).unwrap();
    assert!(picker.parent().is_some());

    picker.model().output("picked").unwrap().emit(json!(42));
    assert_eq!(view.model().get("choice"), Some(json!(42)));
}

#[test]
fn test_host_binding_mirrors_model() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(ComponentDescriptor::new("x-role").host_binding("role", "aria-role"), || {
            ModelObject::new().with("role", json!("button"))
        })
        .unwrap();

    let handle = runtime.mount("x-role").unwrap();
    let element = handle.element().unwrap();
    assert_eq!(element.get_attribute("aria-role").as_deref(), Some("button"));

    handle.view().unwrap().model().set("role", json!("link"));
    assert_eq!(element.get_attribute("aria-role").as_deref(), Some("link"));
}

/// Typed model recording which elements it receives.
struct Fields {
    seen: Rc<RefCell<Vec<(String, String)>>>,
}

impl Lifecycle for Fields {}

impl Model for Fields {
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set_property(&mut self, _name: &str, _value: Value) -> bool {
        false
    }

    fn attach_element(&mut self, field: &str, element: Node) -> bool {
        self.seen.borrow_mut().push((field.to_string(), element.node_name()));
        true
    }
}

#[test]
fn test_view_children_then_view_field_are_assigned() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::new().unwrap();
    let factory_seen = seen.clone();
    runtime
        .component(
            ComponentDescriptor::new("x-fields")
                .view("host")
                .child("title", "#heading")
                .template(|| el("section").child(el("h1").attr("#heading", "").text("t")).into()),
            move || Fields {
                seen: factory_seen.clone(),
            },
        )
        .unwrap();

    let _handle = runtime.mount("x-fields").unwrap();
    assert_eq!(
        seen.take(),
        vec![
            ("title".to_string(), "h1".to_string()),
            ("host".to_string(), "x-fields".to_string()),
        ]
    );
    assert!(runtime.registry().component_of::<Fields>().is_some());
}

#[test]
fn test_style_is_injected_first() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-styled")
                .style("b { color: red }")
                .template(|| el("b").text("x").into()),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-styled").unwrap();
    let first = handle.element().unwrap().first_child().unwrap();
    assert_eq!(first.tag(), Some("style"));
    assert_eq!(first.text_content(), "b { color: red }");
}

// =============================================================================
// Placeholders
// =============================================================================

#[test]
fn test_placeholder_upgrade_carries_attributes() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-parent").template(|| {
                el("x-late")
                    .attr("#late", "")
                    .attr("title", "t")
                    .attr("[label]", "caption")
                    .child(el("em").text("projected"))
                    .into()
            }),
            || ModelObject::new().with("caption", json!("hello")),
        )
        .unwrap();

    let handle = runtime.mount("x-parent").unwrap();
    let view = handle.view().unwrap();
    let placeholder = view.reference("late").unwrap();
    assert!(!placeholder.is_custom());
    assert_eq!(placeholder.get_attribute("label").as_deref(), Some("hello"));

    runtime
        .component(
            ComponentDescriptor::new("x-late")
                .input("label")
                .template(|| el("i").text("{{label}}").into()),
            || ModelObject::new().with("label", Value::Null),
        )
        .unwrap();

    let late = view.reference("late").unwrap();
    assert!(late.is_custom());
    assert!(late.is_connected());
    assert!(!placeholder.is_connected());
    assert_eq!(late.get_attribute("title").as_deref(), Some("t"));

    let child = ViewInstance::of(&late).unwrap();
    assert_eq!(child.model().get("label"), Some(json!("hello")));
    assert_eq!(late.text_content(), "projectedhello");

    view.model().set("caption", json!("bye"));
    assert_eq!(child.model().get("label"), Some(json!("bye")));
    assert_eq!(late.text_content(), "projectedbye");
}

#[test]
fn test_placeholder_upgrade_refreshes_view_child_and_sources() {
    init_tracing();
    let slots = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::new().unwrap();
    let factory_slots = slots.clone();
    runtime
        .component(
            ComponentDescriptor::new("x-frame").child("late", "#late").template(|| {
                el("section")
                    .child(el("x-tardy").attr("#late", "").attr("title", "before"))
                    .child(el("p").attr("#out", "").text("{{#late.title}}"))
                    .into()
            }),
            move || Slots {
                nodes: factory_slots.clone(),
            },
        )
        .unwrap();

    let handle = runtime.mount("x-frame").unwrap();
    let view = handle.view().unwrap();
    let out = view.reference("out").unwrap();
    assert_eq!(out.text_content(), "before");
    let placeholder = view.reference("late").unwrap();
    assert_eq!(slots.borrow().last().map(|(_, n)| n.clone()), Some(placeholder.clone()));

    runtime
        .component(ComponentDescriptor::new("x-tardy"), ModelObject::new)
        .unwrap();

    let late = view.reference("late").unwrap();
    assert!(late.is_custom());
    assert_eq!(
        slots.borrow().last().cloned(),
        Some(("late".to_string(), late.clone())),
        "The view child follows the upgraded element"
    );

    late.set_attribute("title", "after");
    assert_eq!(out.text_content(), "after");
}

/// Typed model keeping the elements handed to its view-child fields.
struct Slots {
    nodes: Rc<RefCell<Vec<(String, Node)>>>,
}

impl Lifecycle for Slots {}

impl Model for Slots {
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set_property(&mut self, _name: &str, _value: Value) -> bool {
        false
    }

    fn attach_element(&mut self, field: &str, element: Node) -> bool {
        self.nodes.borrow_mut().push((field.to_string(), element));
        true
    }
}

// =============================================================================
// Customized built-ins
// =============================================================================

fn fancy_button() -> ComponentDescriptor {
    ComponentDescriptor::new("x-fancy")
        .extends("button")
        .template(|| el("b").text("{{label}}").into())
}

#[test]
fn test_customized_builtin_created_through_runtime() {
    init_tracing();
    let runtime = Runtime::new().unwrap();
    runtime
        .component(fancy_button(), || ModelObject::new().with("label", json!("go")))
        .unwrap();

    let handle = runtime.mount("x-fancy").unwrap();
    let element = handle.element().unwrap();
    assert_eq!(element.tag(), Some("button"));
    assert!(element.is_custom());
    assert_eq!(element.text_content(), "go");
}

#[test]
fn test_customized_builtin_in_template_uses_is() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(fancy_button(), || ModelObject::new().with("label", json!("go")))
        .unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-toolbar")
                .template(|| el("button").attr("is", "x-fancy").attr("#fancy", "").into()),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-toolbar").unwrap();
    let view = handle.view().unwrap();
    let fancy = view.reference("fancy").unwrap();
    assert_eq!(fancy.tag(), Some("button"));
    assert!(fancy.is_custom());
    assert!(ViewInstance::of(&fancy).unwrap().parent().is_some());
    assert_eq!(fancy.text_content(), "go");

    let plain = runtime.document().create_element("button");
    assert!(!plain.is_custom(), "Plain buttons stay built-in");
}
