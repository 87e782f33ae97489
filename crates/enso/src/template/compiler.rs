//! The template compiler walk.
//!
//! One pre-order pass over the parsed markup. Text nodes containing `{{` and
//! elements are offered to the registry's parsers; every node a parser claims
//! gets the next definition index written onto it as a marker. Indices are
//! assigned at claim time, so they are dense and follow document order.

use std::rc::Rc;

use enso_markup::{Attribute, Dom, NodeData, NodeId};
use tracing::error;

use super::blueprint::Blueprint;
use super::definition::NodeDefinition;
use super::parsers::{CompileContext, DirectiveParser};
use super::registry::Registry;
use crate::error::CompileError;

const DIRECTIVE_PREFIX: char = '*';

pub(crate) fn compile(registry: &Registry, dom: Dom, root: NodeId) -> Result<Blueprint, CompileError> {
    let mut compiler = Compiler {
        registry,
        dom,
        definitions: Vec::new(),
    };
    compiler.walk(root)?;
    let Compiler {
        dom, definitions, ..
    } = compiler;
    Ok(Blueprint::new(dom, root, definitions))
}

struct Compiler<'r> {
    registry: &'r Registry,
    dom: Dom,
    definitions: Vec<NodeDefinition>,
}

impl Compiler<'_> {
    fn walk(&mut self, node: NodeId) -> Result<(), CompileError> {
        let descend = match self.dom.data(node) {
            NodeData::Text(text) => {
                if text.contains("{{") {
                    self.visit_text(node)?;
                }
                false
            }
            NodeData::Element { .. } => self.visit_element(node)?,
            NodeData::Fragment => true,
            NodeData::Comment(_) => false,
        };

        if descend {
            let children = self.dom.children(node).to_vec();
            for child in children {
                self.walk(child)?;
            }
        }
        Ok(())
    }

    fn visit_text(&mut self, node: NodeId) -> Result<(), CompileError> {
        let registry = self.registry;
        let mut def = NodeDefinition::new(self.definitions.len());
        for parser in registry.node_parsers() {
            if !parser.matches(&self.dom, node, None) {
                continue;
            }
            if let Some(target) = self.offer(parser, &mut def, node, None)? {
                self.claim(target, def);
                break;
            }
        }
        Ok(())
    }

    /// Returns whether the walk continues into the element's children.
    fn visit_element(&mut self, node: NodeId) -> Result<bool, CompileError> {
        let registry = self.registry;
        let mut def = NodeDefinition::new(self.definitions.len());

        let directives: Vec<Attribute> = self
            .dom
            .attributes(node)
            .iter()
            .filter(|attr| attr.name.starts_with(DIRECTIVE_PREFIX))
            .cloned()
            .collect();

        if let Some((kept, discarded)) = directives.split_first() {
            if !discarded.is_empty() {
                let names: Vec<&str> = discarded.iter().map(|attr| attr.name.as_str()).collect();
                error!(
                    kept = %kept.name,
                    discarded = ?names,
                    "only one structural directive is allowed per node"
                );
                for attr in discarded {
                    self.dom.remove_attribute(node, &attr.name);
                }
            }

            for parser in registry.node_parsers() {
                if !parser.matches(&self.dom, node, Some(kept)) {
                    continue;
                }
                if let Some(target) = self.offer(parser, &mut def, node, Some(kept))? {
                    self.claim(target, def);
                    return Ok(false);
                }
            }
            return Err(CompileError::UnsupportedDirective {
                attribute: kept.name.clone(),
            });
        }

        let attributes = self.dom.attributes(node).to_vec();
        for attribute in &attributes {
            for parser in registry.attribute_parsers() {
                if !parser.matches(&self.dom, node, Some(attribute)) {
                    continue;
                }
                if self.offer(parser, &mut def, node, Some(attribute))?.is_some() {
                    break;
                }
            }
        }
        if def.is_claimed() {
            self.claim(node, def);
        }
        Ok(true)
    }

    /// Runs one parser's preprocess step; on claim, returns the node that
    /// should carry the marker.
    fn offer(
        &mut self,
        parser: &Rc<dyn DirectiveParser>,
        def: &mut NodeDefinition,
        node: NodeId,
        attribute: Option<&Attribute>,
    ) -> Result<Option<NodeId>, CompileError> {
        let mut cx = CompileContext::new(self.registry, &mut self.dom, def.index);
        if !parser.preprocess(&mut cx, def, node, attribute)? {
            return Ok(None);
        }
        let target = cx.replacement().unwrap_or(node);
        def.claim(parser);
        Ok(Some(target))
    }

    fn claim(&mut self, node: NodeId, def: NodeDefinition) {
        self.dom.set_marker(node, def.index);
        self.definitions.push(def);
    }
}
