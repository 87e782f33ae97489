//! # Enso - Fine-Grained Reactive Templates
//!
//! Enso compiles markup with embedded directives into reusable blueprints and
//! keeps rendered instances in sync with component state. Only the nodes that
//! read a changed field are touched, and writes are batched into one update
//! pass per frame.
//!
//! - Templates are compiled once per [`Registry`] and cached by source text
//! - Every reactive node gets an effect, registered under the fields it reads
//! - Writes mark fields dirty; [`Runtime::run_frame`] applies them
//! - `*if` mounts and unmounts fragments without re-rendering them
//!
//! ## Core Concepts
//!
//! - [`Registry`]: ordered directive parsers plus compile caches
//! - [`Blueprint`]: compiled markup and its node definitions
//! - [`ComponentDefinition`]: tag, template, properties, styles and behavior
//! - [`Runtime`]: the live document, all instances and the frame queue
//!
//! ## Quick Start
//!
//! ```rust
//! use enso::{ComponentDefinition, PropertySpec, Registry, Runtime};
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! let template = registry
//!     .compile(r#"<button #button @click="increment">Clicked {{ this.count }} times</button>"#)
//!     .unwrap();
//!
//! let counter = ComponentDefinition::new("x-counter", template)
//!     .property("count", PropertySpec::value(0))
//!     .method("increment", |cx| {
//!         let next = cx.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
//!         cx.set("count", json!(next));
//!     });
//!
//! let mut runtime = Runtime::new();
//! runtime.define(counter).unwrap();
//! let id = runtime.create("x-counter").unwrap();
//! runtime.connect(id, runtime.document()).unwrap();
//! assert_eq!(runtime.render(id).unwrap(), "<button>Clicked 0 times</button>");
//!
//! let button = runtime.reference(id, "button").unwrap();
//! runtime.dispatch(button, "click");
//! runtime.run_frame();
//! assert_eq!(runtime.render(id).unwrap(), "<button>Clicked 1 times</button>");
//! ```
//!
//! ## Directives
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `{{ expr }}` in text | text follows the expression |
//! | `:name="…"` | attribute follows the interpolation |
//! | `@event="…"` | handler statements or a method name |
//! | `#name` | captures the node as a reference |
//! | `*if="expr"` | node exists only while `expr` is truthy |
//!
//! Expressions are minijinja expressions; the component's fields are reached
//! through `this`. Custom directives implement [`DirectiveParser`] and are
//! registered on a [`Registry`].
//!
//! ## Components from YAML
//!
//! ```rust
//! use enso::{ComponentManifest, Registry, Runtime};
//!
//! let manifest = ComponentManifest::from_yaml(
//!     r#"
//! tag: x-greeting
//! template: '<p>Hello {{ this.name }}</p>'
//! properties:
//!   name:
//!     value: world
//!     attribute: { type: String }
//! "#,
//! )
//! .unwrap();
//!
//! let registry = Registry::new();
//! let mut runtime = Runtime::new();
//! runtime.define(manifest.into_definition(&registry, None).unwrap()).unwrap();
//!
//! let id = runtime.create("x-greeting").unwrap();
//! runtime.connect(id, runtime.document()).unwrap();
//! runtime.set_host_attribute(id, "name", Some("Enso")).unwrap();
//! runtime.run_frame();
//! assert_eq!(runtime.render(id).unwrap(), "<p>Hello Enso</p>");
//! ```
//!
//! ## Logging
//!
//! Enso logs through [`tracing`]. Broken expressions and handlers are reported
//! at `warn` and rendering carries on; lifecycle events are `debug`, update
//! passes `trace`.

pub mod component;
pub mod error;
pub mod expr;
pub mod runtime;
pub mod template;

pub use component::{
    AttributeType, ComponentDefinition, ComponentManifest, ComponentScript, FileLoader,
    MemoryLoader, PropertySpec, ResourceLoader, StyleAttacher, StyleElements,
};
pub use error::{CompileError, DefinitionError, LoadError, RuntimeError};
pub use runtime::{
    ComponentContext, EffectContext, InstanceId, ProcessContext, Runtime, RuntimeStats,
};
pub use template::{Blueprint, CompileContext, DirectiveParser, NodeDefinition, Registry};

pub use enso_markup::{Dom, NodeId};
