use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use super::property::{Property, PropertySpec};
use super::script::{ComponentScript, Method};
use crate::expr::Fields;
use crate::runtime::ComponentContext;
use crate::template::Blueprint;

/// Everything needed to create instances of one custom element.
///
/// Built with chained setters and handed to
/// [`Runtime::define`](crate::Runtime::define):
///
/// ```rust
/// use enso::{ComponentDefinition, PropertySpec, Registry};
/// use serde_json::json;
///
/// let registry = Registry::new();
/// let template = registry
///     .compile(r#"<button @click="increment">{{ this.count }}</button>"#)
///     .unwrap();
///
/// let counter = ComponentDefinition::new("x-counter", template)
///     .property("count", PropertySpec::value(0))
///     .method("increment", |cx| {
///         let next = cx.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
///         cx.set("count", json!(next));
///     });
/// assert!(counter.has_method("increment"));
/// ```
#[derive(Clone)]
pub struct ComponentDefinition {
    tag: String,
    blueprint: Rc<Blueprint>,
    properties: BTreeMap<String, Property>,
    styles: Vec<String>,
    expose: Arc<BTreeMap<String, Value>>,
    methods: HashMap<String, Method>,
    script: Option<Rc<dyn ComponentScript>>,
    use_shadow: bool,
}

impl ComponentDefinition {
    pub fn new(tag: impl Into<String>, blueprint: Rc<Blueprint>) -> Self {
        Self {
            tag: tag.into(),
            blueprint,
            properties: BTreeMap::new(),
            styles: Vec::new(),
            expose: Arc::default(),
            methods: HashMap::new(),
            script: None,
            use_shadow: true,
        }
    }

    /// Declares a reactive property.
    pub fn property(mut self, name: impl Into<String>, spec: PropertySpec) -> Self {
        let name = name.into();
        let property = Property::resolve(&name, spec);
        self.properties.insert(name, property);
        self
    }

    /// Adds a style sheet.
    pub fn styles(mut self, sheet: impl Into<String>) -> Self {
        self.styles.push(sheet.into());
        self
    }

    /// Makes a value visible to template expressions under `name`.
    pub fn expose(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.expose).insert(name.into(), value.into());
        self
    }

    /// Registers a method for event handlers.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut ComponentContext<'_>) + 'static,
    {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    pub fn script(mut self, script: impl ComponentScript + 'static) -> Self {
        self.script = Some(Rc::new(script));
        self
    }

    /// Renders into a separate root instead of the host element itself.
    /// Defaults to `true`.
    pub fn use_shadow(mut self, use_shadow: bool) -> Self {
        self.use_shadow = use_shadow;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn blueprint(&self) -> &Rc<Blueprint> {
        &self.blueprint
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn property_named(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// The attribute property observing `attribute`, matched case-insensitively.
    pub fn attribute_property(&self, attribute: &str) -> Option<&Property> {
        self.properties
            .values()
            .find(|prop| prop.attribute.is_some() && prop.name.eq_ignore_ascii_case(attribute))
    }

    pub fn style_sheets(&self) -> &[String] {
        &self.styles
    }

    pub fn exposed(&self) -> &BTreeMap<String, Value> {
        &self.expose
    }

    pub(crate) fn exposed_fields(&self) -> Fields {
        Fields::new(Arc::clone(&self.expose))
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_named(&self, name: &str) -> Option<Method> {
        self.methods.get(name).cloned()
    }

    pub fn script_hooks(&self) -> Option<Rc<dyn ComponentScript>> {
        self.script.clone()
    }

    pub fn uses_shadow(&self) -> bool {
        self.use_shadow
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("ComponentDefinition")
            .field("tag", &self.tag)
            .field("properties", &self.properties)
            .field("styles", &self.styles.len())
            .field("expose", &self.expose)
            .field("methods", &methods)
            .field("script", &self.script.is_some())
            .field("use_shadow", &self.use_shadow)
            .finish()
    }
}
