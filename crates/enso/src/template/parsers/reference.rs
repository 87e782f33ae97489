use enso_markup::{Attribute, Dom, NodeId};

use super::{attribute_name, has_prefix, CompileContext, DirectiveParser};
use crate::error::CompileError;
use crate::runtime::ProcessContext;
use crate::template::NodeDefinition;

/// `#name`: exposes the live node to scripts as a named reference.
///
/// A later reference with the same name replaces the earlier one.
#[derive(Debug, Default)]
pub struct ReferenceParser;

impl DirectiveParser for ReferenceParser {
    fn name(&self) -> &str {
        "reference"
    }

    fn matches(&self, dom: &Dom, node: NodeId, attribute: Option<&Attribute>) -> bool {
        dom.is_element(node) && has_prefix(attribute, '#')
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
        def.reference = Some(attribute_name(attribute));
        cx.dom_mut().remove_attribute(node, &attribute.name);
        Ok(true)
    }

    fn process(&self, def: &NodeDefinition, cx: &mut ProcessContext<'_>, node: NodeId) {
        if let Some(name) = &def.reference {
            cx.set_ref(name, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::template::Registry;
    use crate::{ComponentDefinition, Runtime};

    #[test]
    fn test_reference_stripped_and_recorded() {
        let blueprint = Registry::new()
            .compile("<span #Display>0</span>")
            .unwrap();
        assert_eq!(blueprint.to_html(), "<span>0</span>");
        assert_eq!(
            blueprint.definitions()[0].reference.as_deref(),
            Some("display")
        );
    }

    #[test]
    fn test_duplicate_reference_keeps_last_node() {
        let blueprint = Registry::new()
            .compile("<p #item>first</p><p #item>second</p>")
            .unwrap();
        let names: Vec<_> = blueprint
            .definitions()
            .iter()
            .map(|def| def.reference.as_deref())
            .collect();
        assert_eq!(names, vec![Some("item"), Some("item")]);

        let mut runtime = Runtime::new();
        runtime
            .define(ComponentDefinition::new("x-refs", blueprint))
            .unwrap();
        let id = runtime.create("x-refs").unwrap();
        let document = runtime.document();
        runtime.connect(id, document).unwrap();

        let node = runtime.reference(id, "item").unwrap();
        assert_eq!(runtime.dom().text_content(node), "second");
    }
}
