//! Structural directives: anchors, custom directives and the built-in
//! `*if` / `*for`.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;

use spark_elements::template::{directive, text};
use spark_elements::{
    ComponentDescriptor, Config, Directive, Error, Hooks, Lifecycle, ModelObject, Node, Runtime, el,
};

struct Counting {
    inits: Rc<Cell<u32>>,
    destroys: Rc<Cell<u32>>,
}

impl Lifecycle for Counting {
    fn hooks(&self) -> Hooks {
        Hooks::ON_INIT | Hooks::ON_DESTROY
    }

    fn on_init(&mut self) {
        self.inits.set(self.inits.get() + 1);
    }

    fn on_destroy(&mut self) {
        self.destroys.set(self.destroys.get() + 1);
    }
}

impl Directive for Counting {}

fn bare_runtime() -> Runtime {
    Runtime::with_config(Config {
        builtin_directives: false,
        ..Config::default()
    })
    .unwrap()
}

fn list_component(runtime: &Runtime) {
    runtime
        .component(
            ComponentDescriptor::new("x-list").template(|| {
                el("ul")
                    .attr("#list", "")
                    .child(el("li").attr("*for", "item of items"))
                    .into()
            }),
            || ModelObject::new().with("items", json!([])),
        )
        .unwrap();
}

fn list(runtime: &Runtime) -> (spark_elements::MountHandle, Node) {
    let handle = runtime.mount("x-list").unwrap();
    let list = handle.view().unwrap().reference("list").unwrap();
    (handle, list)
}

// =============================================================================
// Anchors
// =============================================================================

#[test]
fn test_registered_directive_gets_anchor_and_one_init() {
    let runtime = bare_runtime();
    let inits = Rc::new(Cell::new(0));
    let destroys = Rc::new(Cell::new(0));
    let (i, d) = (inits.clone(), destroys.clone());
    runtime
        .directive("*for", move |_| {
            Ok(Box::new(Counting {
                inits: i.clone(),
                destroys: d.clone(),
            }))
        })
        .unwrap();
    list_component(&runtime);

    let (handle, list) = list(&runtime);
    let anchors: Vec<Node> = list.children();
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].kind_name(), "comment");
    assert_eq!(anchors[0].data(), "*for=item of items");
    assert_eq!(inits.get(), 1);

    handle.unmount();
    assert_eq!(destroys.get(), 1, "Anchor teardown destroys the directive");
}

#[test]
fn test_unregistered_directive_leaves_inert_anchor() {
    let runtime = bare_runtime();
    list_component(&runtime);

    let (_handle, list) = list(&runtime);
    let children = list.children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].data(), "*for=item of items");
}

#[test]
fn test_explicit_directive_node() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-explicit").template(|| {
                el("div")
                    .child(directive("*if", "on").owner(el("span").text("yes")))
                    .into()
            }),
            || ModelObject::new().with("on", json!(true)),
        )
        .unwrap();

    let handle = runtime.mount("x-explicit").unwrap();
    assert_eq!(handle.element().unwrap().text_content(), "yes");
}

// =============================================================================
// *if
// =============================================================================

#[test]
fn test_if_toggles_owner_template() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-toggle").template(|| {
                el("div")
                    .child(el("p").attr("*if", "visible").text("shown"))
                    .child(el("p").attr("*if", "!visible").text("hidden"))
                    .into()
            }),
            || ModelObject::new().with("visible", json!(true)),
        )
        .unwrap();

    let handle = runtime.mount("x-toggle").unwrap();
    let element = handle.element().unwrap().clone();
    let model = handle.view().unwrap().model().clone();
    assert_eq!(element.text_content(), "shown");

    model.set("visible", json!(false));
    assert_eq!(element.text_content(), "hidden");

    model.set("visible", json!(true));
    assert_eq!(element.text_content(), "shown");
}

#[test]
fn test_if_with_empty_argument_is_a_configuration_error() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-bad-if")
                .template(|| el("div").child(el("p").attr("*if", " ! ")).child(text("after")).into()),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-bad-if").unwrap();
    let view = handle.view().unwrap();
    assert_eq!(handle.element().unwrap().text_content(), "after");
    assert_eq!(
        view.engine().errors(),
        vec![Error::InvalidDirectiveArgument {
            selector: "*if".into(),
            argument: " ! ".into(),
        }]
    );
}

// =============================================================================
// *for
// =============================================================================

#[test]
fn test_for_renders_rows_with_index() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-rows").template(|| {
                el("ul")
                    .attr("#list", "")
                    .child(el("li").attr("*for", "let item of items; index as i").text("{{i}}:{{item}}"))
                    .into()
            }),
            || ModelObject::new().with("items", json!(["a", "b"])),
        )
        .unwrap();

    let handle = runtime.mount("x-rows").unwrap();
    let view = handle.view().unwrap();
    let list = view.reference("list").unwrap();
    assert_eq!(list.text_content(), "0:a1:b");
    let first_row = list.children()[1].clone();

    view.model().set("items", json!(["x"]));
    assert_eq!(list.text_content(), "0:x");
    assert_eq!(list.child_count(), 2);
    assert_eq!(list.children()[1], first_row, "Rows are reused by position");

    view.model().set("items", json!(["x", "y", "z"]));
    assert_eq!(list.text_content(), "0:x1:y2:z");

    view.model().set("items", json!([]));
    assert_eq!(list.child_count(), 1, "Only the anchor remains");
}

#[test]
fn test_for_rows_bind_to_view_properties() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-prefixed").template(|| {
                el("ul")
                    .attr("#list", "")
                    .child(el("li").attr("*for", "item of items").text("{{prefix}}{{item.name}}"))
                    .into()
            }),
            || {
                ModelObject::new()
                    .with("prefix", json!("- "))
                    .with("items", json!([{ "name": "one" }, { "name": "two" }]))
            },
        )
        .unwrap();

    let handle = runtime.mount("x-prefixed").unwrap();
    let view = handle.view().unwrap();
    let list = view.reference("list").unwrap();
    assert_eq!(list.text_content(), "- one- two");

    view.model().set("prefix", json!("* "));
    assert_eq!(list.text_content(), "* one* two");
}

#[test]
fn test_for_with_malformed_argument() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-bad-for")
                .template(|| el("ul").child(el("li").attr("*for", "items")).into()),
            ModelObject::new,
        )
        .unwrap();

    let handle = runtime.mount("x-bad-for").unwrap();
    assert_eq!(
        handle.view().unwrap().engine().errors(),
        vec![Error::InvalidDirectiveArgument {
            selector: "*for".into(),
            argument: "items".into(),
        }]
    );
}

#[test]
fn test_unmount_tears_down_rows() {
    let runtime = Runtime::new().unwrap();
    runtime
        .component(
            ComponentDescriptor::new("x-teardown").template(|| {
                el("ul").child(el("li").attr("*for", "item of items").text("{{item}}")).into()
            }),
            || ModelObject::new().with("items", json!([1, 2, 3])),
        )
        .unwrap();

    let handle = runtime.mount("x-teardown").unwrap();
    let model = handle.view().unwrap().model().clone();
    assert!(model.bus().subscriber_count("items") > 0);

    handle.unmount();
    assert_eq!(model.bus().total_subscribers(), 0, "Every subscription is released");
}
