//! Node definitions: what one marked template node needs at runtime.

use std::fmt;
use std::rc::Rc;

use super::blueprint::Blueprint;
use super::parsers::DirectiveParser;
use crate::expr::{Handler, Interpolation};

/// `:name="…"` binding.
#[derive(Debug, Clone)]
pub struct AttributeBinding {
    pub name: String,
    pub interpolation: Rc<Interpolation>,
}

/// `@name="…"` listener.
///
/// `handler` is `None` when the source failed to compile; the listener is
/// still installed and only warns when fired.
#[derive(Debug, Clone)]
pub struct EventBinding {
    pub name: String,
    pub source: String,
    pub handler: Option<Rc<Handler>>,
}

/// A structural directive that replaced its node with a placeholder.
#[derive(Debug, Clone)]
pub struct Directive {
    /// Directive name without the `*` (`"if"`).
    pub kind: String,
    /// `id` of the placeholder element left in the template.
    pub placeholder_id: String,
    /// The claimed node, compiled on its own.
    pub blueprint: Rc<Blueprint>,
    pub guard: Rc<Interpolation>,
}

impl Directive {
    /// Fields the guard reads.
    pub fn depends(&self) -> impl Iterator<Item = &str> {
        self.guard.dependencies().iter().map(String::as_str)
    }
}

/// Everything the runtime needs to know about one marked template node.
///
/// Definitions are created by the compiler and never change afterwards. The
/// `index` is written onto the node as a marker so each clone of the
/// blueprint can find its copy of the node again.
#[derive(Clone)]
pub struct NodeDefinition {
    pub index: usize,
    pub reference: Option<String>,
    pub events: Vec<EventBinding>,
    pub attrs: Vec<AttributeBinding>,
    pub content: Vec<Rc<Interpolation>>,
    pub directive: Option<Directive>,
    /// Parsers that claimed the node, in claim order; each processes it once.
    pub parsers: Vec<Rc<dyn DirectiveParser>>,
}

impl NodeDefinition {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            reference: None,
            events: Vec::new(),
            attrs: Vec::new(),
            content: Vec::new(),
            directive: None,
            parsers: Vec::new(),
        }
    }

    /// Records `parser` as a claimant unless it already is one.
    pub fn claim(&mut self, parser: &Rc<dyn DirectiveParser>) {
        if !self.parsers.iter().any(|known| Rc::ptr_eq(known, parser)) {
            self.parsers.push(Rc::clone(parser));
        }
    }

    pub fn is_claimed(&self) -> bool {
        !self.parsers.is_empty()
    }
}

impl fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("index", &self.index)
            .field("reference", &self.reference)
            .field("events", &self.events)
            .field("attrs", &self.attrs)
            .field("content", &self.content)
            .field("directive", &self.directive)
            .field(
                "parsers",
                &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
