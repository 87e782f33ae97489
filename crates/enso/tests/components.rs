//! Components end to end: events, methods, attributes, styles and teardown.

use std::cell::Cell;
use std::fs;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use enso::{
    AttributeType, ComponentContext, ComponentDefinition, ComponentManifest, ComponentScript,
    DefinitionError, FileLoader, InstanceId, PropertySpec, Registry, Runtime, RuntimeError,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

fn start(definition: ComponentDefinition) -> (Runtime, InstanceId) {
    let tag = definition.tag().to_string();
    let mut runtime = Runtime::new();
    runtime.define(definition).unwrap();
    let id = runtime.create(&tag).unwrap();
    let document = runtime.document();
    runtime.connect(id, document).unwrap();
    (runtime, id)
}

fn click(runtime: &mut Runtime, id: InstanceId, reference: &str) -> usize {
    let node = runtime.reference(id, reference).unwrap();
    let fired = runtime.dispatch(node, "click");
    runtime.run_frame();
    fired
}

// ============================================================================
// Events and methods
// ============================================================================

#[test]
fn test_step_handler_updates_field() {
    let registry = Registry::new();
    let template = registry
        .compile(r#"<button #b @click="() => this.count++">n={{ this.count }}</button>"#)
        .unwrap();
    let (mut runtime, id) =
        start(ComponentDefinition::new("x-step", template).property("count", PropertySpec::value(0)));
    assert_eq!(runtime.render(id).unwrap(), "<button>n=0</button>");

    click(&mut runtime, id, "b");
    click(&mut runtime, id, "b");
    assert_eq!(runtime.get(id, "count"), Some(&json!(2)));
    assert_eq!(runtime.render(id).unwrap(), "<button>n=2</button>");
}

#[test]
fn test_handler_string_with_semicolon() {
    let template = Registry::new()
        .compile(r#"<button #b @click="() => this.msg = 'a;b'">{{ this.msg }}</button>"#)
        .unwrap();
    let (mut runtime, id) =
        start(ComponentDefinition::new("x-semi", template).property("msg", PropertySpec::value("x")));

    click(&mut runtime, id, "b");
    assert_eq!(runtime.get(id, "msg"), Some(&json!("a;b")));
    assert_eq!(runtime.render(id).unwrap(), "<button>a;b</button>");
}

#[test]
fn test_events_bubble_to_ancestors() {
    let registry = Registry::new();
    let template = registry
        .compile(
            r#"<div @click="() => this.outer += 1"><span #inner @click="() => { this.inner += 1; this.last = 'inner' }">x</span></div>"#,
        )
        .unwrap();
    let definition = ComponentDefinition::new("x-bubble", template)
        .property("outer", PropertySpec::value(0))
        .property("inner", PropertySpec::value(0))
        .property("last", PropertySpec::value(""));
    let (mut runtime, id) = start(definition);

    assert_eq!(click(&mut runtime, id, "inner"), 2);
    assert_eq!(runtime.get(id, "outer"), Some(&json!(1)));
    assert_eq!(runtime.get(id, "inner"), Some(&json!(1)));
    assert_eq!(runtime.get(id, "last"), Some(&json!("inner")));
}

#[test]
fn test_event_names_are_case_insensitive() {
    let registry = Registry::new();
    let template = registry
        .compile(r#"<button #b @Click="() => this.n = 7">x</button>"#)
        .unwrap();
    let (mut runtime, id) =
        start(ComponentDefinition::new("x-case", template).property("n", PropertySpec::value(0)));

    let button = runtime.reference(id, "b").unwrap();
    assert_eq!(runtime.listener_count(button, "CLICK"), 1);
    runtime.dispatch(button, "CLICK");
    assert_eq!(runtime.get(id, "n"), Some(&json!(7)));
}

#[test]
fn test_method_handler() {
    let registry = Registry::new();
    let template = registry
        .compile(r#"<button #add @click="add">{{ this.total }}</button><i #reset @click="this.reset()"></i>"#)
        .unwrap();
    let definition = ComponentDefinition::new("x-sum", template)
        .property("total", PropertySpec::value(1))
        .property("step", PropertySpec::value(5))
        .method("add", |cx| {
            let total = cx.get("total").and_then(Value::as_i64).unwrap_or(0);
            let step = cx.get("step").and_then(Value::as_i64).unwrap_or(0);
            cx.set("total", json!(total + step));
        })
        .method("reset", |cx| cx.set("total", json!(1)));
    let (mut runtime, id) = start(definition);

    click(&mut runtime, id, "add");
    click(&mut runtime, id, "add");
    assert_eq!(runtime.render(id).unwrap(), "<button>11</button><i></i>");

    click(&mut runtime, id, "reset");
    assert_eq!(runtime.get(id, "total"), Some(&json!(1)));
}

#[test]
fn test_handler_inside_fragment_targets_component() {
    let registry = Registry::new();
    let template = registry
        .compile(r#"<p *if="this.open"><b #b @click="() => this.n = this.n + 10">{{ this.n }}</b></p>"#)
        .unwrap();
    let definition = ComponentDefinition::new("x-inner", template)
        .property("open", PropertySpec::value(true))
        .property("n", PropertySpec::value(1));
    let (mut runtime, id) = start(definition);

    click(&mut runtime, id, "b");
    assert_eq!(runtime.get(id, "n"), Some(&json!(11)));
    assert_eq!(
        runtime.render(id).unwrap(),
        "<!--enso:fragment--><p><b>11</b></p>"
    );
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_invalid_handlers_warn_when_fired() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let registry = Registry::new();
        let template = registry
            .compile(r#"<button #broken @click="alert(1)">a</button><button #missing @click="launch">b</button>"#)
            .unwrap();
        let (mut runtime, id) = start(
            ComponentDefinition::new("x-broken", template).property("n", PropertySpec::value(0)),
        );

        assert_eq!(click(&mut runtime, id, "broken"), 1);
        assert_eq!(click(&mut runtime, id, "missing"), 1);
        assert_eq!(runtime.get(id, "n"), Some(&json!(0)));
    });

    let logs = capture.contents();
    assert!(logs.contains("invalid event handler"), "{}", logs);
    assert!(logs.contains("does not define"), "{}", logs);
    assert_eq!(logs.matches("invalid event handler fired").count(), 2, "{}", logs);
}

#[test]
fn test_failing_expression_counts_as_falsy() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let registry = Registry::new();
        let template = registry
            .compile(r#"<p :title="{{ this.n + 'x' }}">{{ this.n + 'x' }}</p>"#)
            .unwrap();
        let (runtime, id) =
            start(ComponentDefinition::new("x-bad", template).property("n", PropertySpec::value(1)));
        assert_eq!(runtime.render(id).unwrap(), "<p></p>");
    });

    assert!(capture.contents().contains("expression evaluation failed"));
}

// ============================================================================
// Attributes
// ============================================================================

fn button_definition() -> ComponentDefinition {
    let template = Registry::new()
        .compile(r#"<button :disabled="{{ this.disabled }}">{{ this.label }} x{{ this.size }}</button>"#)
        .unwrap();
    ComponentDefinition::new("x-button", template)
        .property("disabled", PropertySpec::attribute(AttributeType::Boolean, false))
        .property(
            "label",
            PropertySpec::attribute(AttributeType::String, "Clicks").forced(),
        )
        .property("size", PropertySpec::attribute(AttributeType::Number, 1))
}

#[test]
fn test_forced_attribute_reflected_on_connect() {
    let (runtime, id) = start(button_definition());
    let host = runtime.host(id).unwrap();

    assert_eq!(runtime.dom().to_html(host), r#"<x-button label="Clicks"></x-button>"#);
    assert_eq!(runtime.get(id, "label"), Some(&json!("Clicks")));
    assert_eq!(runtime.get(id, "disabled"), Some(&Value::Null));
    assert_eq!(runtime.render(id).unwrap(), "<button>Clicks x</button>");
}

#[test]
fn test_property_writes_reflect_to_host() {
    let (mut runtime, id) = start(button_definition());
    let host = runtime.host(id).unwrap();

    runtime.set(id, "disabled", json!(true)).unwrap();
    runtime.set(id, "size", json!(3)).unwrap();
    assert_eq!(runtime.dom().attribute(host, "disabled"), Some(""));
    assert_eq!(runtime.dom().attribute(host, "size"), Some("3"));

    runtime.run_frame();
    assert_eq!(
        runtime.render(id).unwrap(),
        "<button disabled>Clicks x3</button>"
    );

    runtime.set(id, "disabled", json!(false)).unwrap();
    assert_eq!(runtime.dom().attribute(host, "disabled"), None);
}

#[test]
fn test_host_attributes_convert_to_properties() {
    let (mut runtime, id) = start(button_definition());

    runtime.set_host_attribute(id, "size", Some("12")).unwrap();
    runtime.set_host_attribute(id, "disabled", Some("")).unwrap();
    runtime.set_host_attribute(id, "LABEL", Some("Go")).unwrap();
    assert_eq!(runtime.get(id, "size"), Some(&json!(12)));
    assert_eq!(runtime.get(id, "disabled"), Some(&json!(true)));
    assert_eq!(runtime.get(id, "label"), Some(&json!("Go")));

    runtime.run_frame();
    assert_eq!(runtime.render(id).unwrap(), "<button disabled>Go x12</button>");

    runtime.set_host_attribute(id, "disabled", None).unwrap();
    runtime.set_host_attribute(id, "size", Some("lots")).unwrap();
    assert_eq!(runtime.get(id, "disabled"), Some(&json!(false)));
    assert_eq!(runtime.get(id, "size"), Some(&Value::Null));
}

#[test]
fn test_unrelated_host_attribute_left_alone() {
    let (mut runtime, id) = start(button_definition());
    runtime.set_host_attribute(id, "title", Some("tip")).unwrap();

    let host = runtime.host(id).unwrap();
    assert_eq!(runtime.dom().attribute(host, "title"), Some("tip"));
    assert!(!runtime.has_pending_frame());
}

// ============================================================================
// Rendering targets, styles and exposed values
// ============================================================================

#[test]
fn test_styles_and_exposed_values() {
    let template = Registry::new()
        .compile(r#"<h1 :class="{{ class_list('title', 'big' if this.big else '') }}">{{ greeting }}, {{ this.name }}</h1>"#)
        .unwrap();
    let definition = ComponentDefinition::new("x-hello", template)
        .property("name", PropertySpec::value("Ada"))
        .property("big", PropertySpec::value(true))
        .styles("h1 { margin: 0; }")
        .expose("greeting", "Hello");
    let (mut runtime, id) = start(definition);

    insta::assert_snapshot!(
        runtime.render(id).unwrap(),
        @r#"<style>h1 { margin: 0; }</style><h1 class="title big">Hello, Ada</h1>"#
    );

    runtime.set(id, "big", json!(false)).unwrap();
    runtime.run_frame();
    assert_eq!(
        runtime.render(id).unwrap(),
        r#"<style>h1 { margin: 0; }</style><h1 class="title">Hello, Ada</h1>"#
    );
}

#[test]
fn test_light_rendering_into_host() {
    let template = Registry::new().compile("<em>{{ this.word }}</em>").unwrap();
    let definition = ComponentDefinition::new("x-light", template)
        .property("word", PropertySpec::value("inline"))
        .use_shadow(false);
    let (runtime, id) = start(definition);

    let host = runtime.host(id).unwrap();
    assert_eq!(runtime.root(id), Some(host));
    assert_eq!(
        runtime.dom().to_html(runtime.document()),
        "<x-light><em>inline</em></x-light>"
    );
}

// ============================================================================
// Registration and teardown
// ============================================================================

#[test]
fn test_define_rejects_bad_tags() {
    let registry = Registry::new();
    let template = registry.compile("<p></p>").unwrap();
    let mut runtime = Runtime::new();

    let err = runtime
        .define(ComponentDefinition::new("counter", Rc::clone(&template)))
        .unwrap_err();
    assert!(matches!(err, DefinitionError::InvalidTag(_)));

    runtime
        .define(ComponentDefinition::new("x-one", Rc::clone(&template)))
        .unwrap();
    let err = runtime
        .define(ComponentDefinition::new("x-one", template))
        .unwrap_err();
    assert!(matches!(err, DefinitionError::DuplicateTag(tag) if tag == "x-one"));

    assert_eq!(
        runtime.create("x-two").unwrap_err(),
        RuntimeError::UnknownTag("x-two".into())
    );
}

struct Removal(Rc<Cell<usize>>);

impl ComponentScript for Removal {
    fn on_removed(&self, cx: &mut ComponentContext<'_>) {
        assert!(cx.reference("b").is_some());
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_disconnect_tears_down_and_reconnect_rerenders() {
    let removed = Rc::new(Cell::new(0));
    let template = Registry::new()
        .compile(r#"<button #b @click="() => this.n++">{{ this.n }}</button><i *if="this.n">on</i>"#)
        .unwrap();
    let definition = ComponentDefinition::new("x-cycle", template)
        .property("n", PropertySpec::value(1))
        .script(Removal(Rc::clone(&removed)));
    let (mut runtime, id) = start(definition);
    let button = runtime.reference(id, "b").unwrap();
    let host = runtime.host(id).unwrap();

    runtime.set(id, "n", json!(2)).unwrap();
    runtime.disconnect(id).unwrap();

    assert_eq!(removed.get(), 1);
    assert!(!runtime.is_connected(id));
    assert!(!runtime.has_pending_frame());
    assert_eq!(runtime.listener_count(button, "click"), 0);
    assert!(runtime.reference(id, "b").is_none());
    assert!(runtime.children(id).is_empty());
    assert_eq!(runtime.dom().parent(host), None);
    assert_eq!(runtime.render(id).unwrap(), "");

    runtime.set(id, "n", json!(5)).unwrap();
    assert!(!runtime.has_pending_frame());

    let document = runtime.document();
    runtime.connect(id, document).unwrap();
    assert_eq!(
        runtime.render(id).unwrap(),
        "<button>5</button><!--enso:fragment--><i>on</i>"
    );
    click(&mut runtime, id, "b");
    assert_eq!(runtime.get(id, "n"), Some(&json!(6)));

    runtime.disconnect(id).unwrap();
    runtime.disconnect(id).unwrap();
    assert_eq!(removed.get(), 2);
}

#[test]
fn test_connect_cycles_reuse_nodes_and_instances() {
    let template = Registry::new()
        .compile(r#"<div><p *if="this.show">{{ this.n }}</p><span>{{ this.n }}</span></div>"#)
        .unwrap();
    let definition = ComponentDefinition::new("x-cycle", template)
        .property("show", PropertySpec::value(true))
        .property("n", PropertySpec::value(1));
    let (mut runtime, id) = start(definition);
    let connected = (runtime.dom().len(), runtime.instance_count());
    assert_eq!(connected.1, 2);

    let document = runtime.document();
    let mut sizes = Vec::new();
    for cycle in 0..5 {
        if cycle % 2 == 1 {
            runtime.set(id, "show", json!(false)).unwrap();
            runtime.run_frame();
        }
        runtime.disconnect(id).unwrap();
        // the document and the host element
        assert_eq!(runtime.dom().len(), 2);
        assert_eq!(runtime.instance_count(), 1);

        runtime.set(id, "show", json!(true)).unwrap();
        runtime.connect(id, document).unwrap();
        sizes.push((runtime.dom().len(), runtime.instance_count()));
    }

    assert_eq!(sizes, vec![connected; 5]);
    assert_eq!(
        runtime.render(id).unwrap(),
        "<div><!--enso:fragment--><p>1</p><span>1</span></div>"
    );
}

#[test]
fn test_manifest_files_and_stats() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("card.html"),
        r#"<article><h2 *if="this.title">{{ this.title }}</h2><p>{{ this.body }}</p></article>"#,
    )
    .unwrap();
    fs::write(dir.path().join("card.css"), "article { padding: 1em; }").unwrap();
    let manifest = ComponentManifest::from_yaml(
        r#"
tag: x-card
template_file: card.html
style_files: [card.css]
properties:
  title:
    value: null
  body:
    value: Empty
"#,
    )
    .unwrap();

    let loader = FileLoader::new(dir.path());
    let definition = manifest
        .into_definition(&Registry::new(), Some(&loader))
        .unwrap();
    let (mut runtime, id) = start(definition);

    runtime.set(id, "title", json!("News")).unwrap();
    runtime.set(id, "body", json!("Fresh")).unwrap();
    runtime.run_frame();

    insta::assert_snapshot!(
        runtime.render(id).unwrap(),
        @"<style>article { padding: 1em; }</style><article><!--enso:fragment--><h2>News</h2><p>Fresh</p></article>"
    );
    insta::assert_json_snapshot!(runtime.stats(), @r#"
    {
      "passes": 1,
      "effects_run": 5,
      "mounts": 1,
      "unmounts": 0
    }
    "#);
}
