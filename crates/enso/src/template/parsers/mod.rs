//! Directive parsers.
//!
//! A [`DirectiveParser`] handles one kind of template syntax in two phases:
//!
//! 1. **preprocess** (compile time, once per template): inspect a template
//!    node, strip the directive syntax from it and record what is needed in
//!    the node's [`NodeDefinition`]. Returning `true` claims the node.
//! 2. **process** (runtime, once per instance): given the definition and the
//!    live copy of the node, install effects, listeners and references.
//!
//! Parsers are registered on a [`Registry`](super::Registry) either as node
//! parsers (text nodes and `*` directives, which claim the whole node) or as
//! attribute parsers (offered each attribute of an element in turn).
//!
//! | Parser | Kind | Syntax |
//! |--------|------|--------|
//! | [`TextParser`] | node | `{{ expr }}` in text |
//! | [`ConditionalParser`] | node | `*if="…"` |
//! | [`ReferenceParser`] | attribute | `#name` |
//! | [`EventParser`] | attribute | `@event="…"` |
//! | [`AttributeParser`] | attribute | `:name="…"` |

mod attribute;
mod conditional;
mod event;
mod reference;
mod text;

pub use attribute::AttributeParser;
pub use conditional::ConditionalParser;
pub use event::EventParser;
pub use reference::ReferenceParser;
pub use text::TextParser;

use enso_markup::{Attribute, Dom, NodeId};

use super::definition::NodeDefinition;
use super::registry::Registry;
use crate::error::CompileError;
use crate::runtime::ProcessContext;

/// A pluggable strategy for one kind of directive.
pub trait DirectiveParser {
    /// Short identifier used in logs and debug output.
    fn name(&self) -> &str;

    /// Whether this parser handles `node` (and `attribute`, for attribute
    /// parsers or `*` directives).
    fn matches(&self, dom: &Dom, node: NodeId, attribute: Option<&Attribute>) -> bool;

    /// Rewrites the template node and fills `def`. Returns `true` to claim.
    fn preprocess(
        &self,
        cx: &mut CompileContext<'_>,
        def: &mut NodeDefinition,
        node: NodeId,
        attribute: Option<&Attribute>,
    ) -> Result<bool, CompileError>;

    /// Wires the live copy of a claimed node into its instance.
    fn process(&self, def: &NodeDefinition, cx: &mut ProcessContext<'_>, node: NodeId);
}

/// Compile-time access for [`DirectiveParser::preprocess`].
pub struct CompileContext<'a> {
    registry: &'a Registry,
    dom: &'a mut Dom,
    index: usize,
    replacement: Option<NodeId>,
}

impl<'a> CompileContext<'a> {
    pub(crate) fn new(registry: &'a Registry, dom: &'a mut Dom, index: usize) -> Self {
        Self {
            registry,
            dom,
            index,
            replacement: None,
        }
    }

    /// The registry compiling this template, for cached expressions and
    /// nested templates.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn dom(&self) -> &Dom {
        &*self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut *self.dom
    }

    /// Index the definition will receive if the node is claimed.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Swaps `node` for `replacement` in the template. The marker then goes
    /// on the replacement, and the compiler does not descend into `node`.
    pub fn replace_node(&mut self, node: NodeId, replacement: NodeId) -> bool {
        let replaced = self.dom.replace_with(node, replacement);
        if replaced {
            self.replacement = Some(replacement);
        }
        replaced
    }

    pub(crate) fn replacement(&self) -> Option<NodeId> {
        self.replacement
    }
}

/// Directive name of an attribute: the prefix stripped and lowercased.
pub(crate) fn attribute_name(attribute: &Attribute) -> String {
    attribute
        .name
        .chars()
        .skip(1)
        .collect::<String>()
        .to_ascii_lowercase()
}

pub(crate) fn has_prefix(attribute: Option<&Attribute>, prefix: char) -> bool {
    attribute.is_some_and(|attr| attr.name.starts_with(prefix) && attr.name.len() > 1)
}
