//! Parser registry and compile caches.
//!
//! A [`Registry`] owns the ordered list of directive parsers and memoizes
//! everything compiled through it, keyed by source text:
//!
//! | Cache | Key | Value |
//! |-------|-----|-------|
//! | interpolations | text / attribute source | [`Interpolation`] |
//! | expressions | bare guard source | [`Interpolation`] |
//! | handlers | `@event` source | [`Handler`] |
//! | templates | markup | [`Blueprint`] |
//!
//! Compiling the same markup twice returns the same `Rc<Blueprint>`.
//! Registries are independent: custom parser sets never leak into the
//! built-in one.
//!
//! # Example
//!
//! ```rust
//! use enso::Registry;
//!
//! let registry = Registry::new();
//! let first = registry.compile("<p>{{ this.greeting }}</p>").unwrap();
//! let second = registry.compile("<p>{{ this.greeting }}</p>").unwrap();
//! assert!(std::rc::Rc::ptr_eq(&first, &second));
//! assert_eq!(first.definitions().len(), 1);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use enso_markup::{parse, Dom, NodeId};
use tracing::trace;

use super::blueprint::Blueprint;
use super::compiler;
use super::parsers::{
    AttributeParser, ConditionalParser, DirectiveParser, EventParser, ReferenceParser, TextParser,
};
use crate::error::CompileError;
use crate::expr::{Handler, Interpolation};

/// Ordered directive parsers plus compile caches.
pub struct Registry {
    node_parsers: Vec<Rc<dyn DirectiveParser>>,
    attribute_parsers: Vec<Rc<dyn DirectiveParser>>,
    interpolations: RefCell<HashMap<String, Rc<Interpolation>>>,
    expressions: RefCell<HashMap<String, Rc<Interpolation>>>,
    handlers: RefCell<HashMap<String, Rc<Handler>>>,
    templates: RefCell<HashMap<String, Rc<Blueprint>>>,
}

impl Registry {
    /// Creates a registry with the built-in parsers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_node_parser(TextParser);
        registry.register_node_parser(ConditionalParser);
        registry.register_attribute_parser(ReferenceParser);
        registry.register_attribute_parser(EventParser);
        registry.register_attribute_parser(AttributeParser);
        registry
    }

    /// Creates a registry without any parsers.
    pub fn empty() -> Self {
        Self {
            node_parsers: Vec::new(),
            attribute_parsers: Vec::new(),
            interpolations: RefCell::default(),
            expressions: RefCell::default(),
            handlers: RefCell::default(),
            templates: RefCell::default(),
        }
    }

    /// Adds a parser for text nodes and `*` directives. Earlier parsers win.
    pub fn register_node_parser(&mut self, parser: impl DirectiveParser + 'static) -> &mut Self {
        self.node_parsers.push(Rc::new(parser));
        self
    }

    /// Adds a parser offered each element attribute. Earlier parsers win.
    pub fn register_attribute_parser(
        &mut self,
        parser: impl DirectiveParser + 'static,
    ) -> &mut Self {
        self.attribute_parsers.push(Rc::new(parser));
        self
    }

    pub fn node_parsers(&self) -> &[Rc<dyn DirectiveParser>] {
        &self.node_parsers
    }

    pub fn attribute_parsers(&self) -> &[Rc<dyn DirectiveParser>] {
        &self.attribute_parsers
    }

    /// Compiles markup, reusing the blueprint of identical earlier markup.
    pub fn compile(&self, markup: &str) -> Result<Rc<Blueprint>, CompileError> {
        if let Some(blueprint) = self.templates.borrow().get(markup) {
            return Ok(Rc::clone(blueprint));
        }
        let blueprint = self.compile_uncached(markup)?;
        self.templates
            .borrow_mut()
            .insert(markup.to_string(), Rc::clone(&blueprint));
        Ok(blueprint)
    }

    /// Compiles markup without consulting or filling the template cache.
    pub fn compile_uncached(&self, markup: &str) -> Result<Rc<Blueprint>, CompileError> {
        let (dom, root) = parse(markup)?;
        self.compile_fragment(dom, root)
    }

    /// Compiles already-parsed markup rooted at `root`.
    pub fn compile_fragment(&self, dom: Dom, root: NodeId) -> Result<Rc<Blueprint>, CompileError> {
        let blueprint = compiler::compile(self, dom, root)?;
        trace!(definitions = blueprint.definitions().len(), "compiled template");
        Ok(Rc::new(blueprint))
    }

    /// Compiles (or fetches) a `{{ … }}` template.
    pub fn interpolation(&self, source: &str) -> Result<Rc<Interpolation>, CompileError> {
        cached(&self.interpolations, source, Interpolation::compile)
    }

    /// Compiles (or fetches) a bare expression.
    pub fn expression(&self, source: &str) -> Result<Rc<Interpolation>, CompileError> {
        cached(&self.expressions, source, Interpolation::expression)
    }

    /// Compiles (or fetches) an event handler.
    pub fn handler(&self, source: &str) -> Result<Rc<Handler>, CompileError> {
        cached(&self.handlers, source, Handler::compile)
    }

    /// Number of distinct templates compiled through [`compile`](Self::compile).
    pub fn cached_templates(&self) -> usize {
        self.templates.borrow().len()
    }
}

fn cached<T>(
    cache: &RefCell<HashMap<String, Rc<T>>>,
    source: &str,
    compile: impl FnOnce(&str) -> Result<T, CompileError>,
) -> Result<Rc<T>, CompileError> {
    if let Some(hit) = cache.borrow().get(source) {
        return Ok(Rc::clone(hit));
    }
    let compiled = Rc::new(compile(source)?);
    cache
        .borrow_mut()
        .insert(source.to_string(), Rc::clone(&compiled));
    Ok(compiled)
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names =
            |parsers: &[Rc<dyn DirectiveParser>]| parsers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>();
        f.debug_struct("Registry")
            .field("node_parsers", &names(&self.node_parsers))
            .field("attribute_parsers", &names(&self.attribute_parsers))
            .field("cached_templates", &self.cached_templates())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ProcessContext;
    use crate::template::{CompileContext, NodeDefinition};
    use enso_markup::Attribute;

    #[test]
    fn test_builtin_parser_order() {
        let registry = Registry::new();
        let nodes: Vec<_> = registry.node_parsers().iter().map(|p| p.name()).collect();
        let attrs: Vec<_> = registry.attribute_parsers().iter().map(|p| p.name()).collect();
        assert_eq!(nodes, vec!["text", "if"]);
        assert_eq!(attrs, vec!["reference", "event", "attribute"]);
    }

    #[test]
    fn test_interpolations_cached_by_source() {
        let registry = Registry::new();
        let a = registry.interpolation("{{ this.x }}").unwrap();
        let b = registry.interpolation("{{ this.x }}").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_errors_not_cached() {
        let registry = Registry::new();
        assert!(registry.handler("nope(1)").is_err());
        assert!(registry.handler("nope(1)").is_err());
        assert_eq!(registry.handlers.borrow().len(), 0);
    }

    #[test]
    fn test_empty_registry_claims_nothing() {
        let registry = Registry::empty();
        let blueprint = registry.compile("<p #r @click=\"go\">{{ this.a }}</p>").unwrap();
        assert!(blueprint.definitions().is_empty());
    }

    #[test]
    fn test_empty_registry_rejects_directives() {
        let registry = Registry::empty();
        assert!(registry.compile("<p *if=\"x\"></p>").is_err());
    }

    struct Upper;

    impl DirectiveParser for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn matches(&self, _dom: &Dom, _node: NodeId, attribute: Option<&Attribute>) -> bool {
            attribute.is_some_and(|attr| attr.name == "upper")
        }

        fn preprocess(
            &self,
            cx: &mut CompileContext<'_>,
            _def: &mut NodeDefinition,
            node: NodeId,
            _attribute: Option<&Attribute>,
        ) -> Result<bool, CompileError> {
            cx.dom_mut().remove_attribute(node, "upper");
            Ok(true)
        }

        fn process(&self, _def: &NodeDefinition, cx: &mut ProcessContext<'_>, node: NodeId) {
            let text = cx.dom().text_content(node).to_uppercase();
            cx.dom_mut().set_text_content(node, text);
        }
    }

    #[test]
    fn test_custom_attribute_parser() {
        let mut registry = Registry::new();
        registry.register_attribute_parser(Upper);
        let blueprint = registry.compile("<p upper>shout</p>").unwrap();
        assert_eq!(blueprint.definitions().len(), 1);
        assert_eq!(blueprint.definitions()[0].parsers[0].name(), "upper");
        assert_eq!(blueprint.to_html(), "<p>shout</p>");
    }
}
