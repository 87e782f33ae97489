use enso_markup::{Attribute, Dom, NodeId};

use super::{attribute_name, has_prefix, CompileContext, DirectiveParser};
use crate::error::CompileError;
use crate::expr::Interpolated;
use crate::runtime::ProcessContext;
use crate::template::{AttributeBinding, NodeDefinition};

/// `:name="…"`: keeps an attribute in sync with an interpolation.
///
/// `true` renders as a valueless attribute, falsy results remove it.
#[derive(Debug, Default)]
pub struct AttributeParser;

impl DirectiveParser for AttributeParser {
    fn name(&self) -> &str {
        "attribute"
    }

    fn matches(&self, dom: &Dom, node: NodeId, attribute: Option<&Attribute>) -> bool {
        dom.is_element(node) && has_prefix(attribute, ':')
    }

    fn preprocess(
        &self,
        cx: &mut CompileContext<'_>,
        def: &mut NodeDefinition,
        node: NodeId,
        attribute: Option<&Attribute>,
    ) -> Result<bool, CompileError> {
        let Some(attribute) = attribute else {
            return Ok(false);
        };
        def.attrs.push(AttributeBinding {
            name: attribute_name(attribute),
            interpolation: cx.registry().interpolation(&attribute.value)?,
        });
        cx.dom_mut().remove_attribute(node, &attribute.name);
        Ok(true)
    }

    fn process(&self, def: &NodeDefinition, cx: &mut ProcessContext<'_>, node: NodeId) {
        for binding in &def.attrs {
            let name = binding.name.clone();
            let template = binding.interpolation.clone();
            let dependencies = binding.interpolation.dependencies();
            let effect = cx.bind(dependencies, node, None, move |cx, effect| {
                match cx.evaluate(&template) {
                    Interpolated::True => cx.dom_mut().set_attribute(effect.node, &name, ""),
                    Interpolated::Text(text) => cx.dom_mut().set_attribute(effect.node, &name, text),
                    Interpolated::Falsy => {
                        cx.dom_mut().remove_attribute(effect.node, &name);
                    }
                }
            });
            cx.run(&effect);
        }
    }
}
