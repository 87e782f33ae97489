use enso_markup::{Attribute, Dom, NodeId};

use super::{CompileContext, DirectiveParser};
use crate::error::CompileError;
use crate::runtime::ProcessContext;
use crate::template::NodeDefinition;

/// `{{ expr }}` inside text nodes.
///
/// The template copy of the text is blanked; the live node only shows what
/// the effect writes. Falsy results leave whatever the node displayed
/// before, so a counter bound as `{{ this.n }}` keeps its last non-zero
/// value when `n` drops to `0`.
#[derive(Debug, Default)]
pub struct TextParser;

impl DirectiveParser for TextParser {
    fn name(&self) -> &str {
        "text"
    }

    fn matches(&self, dom: &Dom, node: NodeId, attribute: Option<&Attribute>) -> bool {
        attribute.is_none() && dom.is_text(node) && dom.text(node).is_some_and(|t| t.contains("{{"))
    }

    fn preprocess(
        &self,
        cx: &mut CompileContext<'_>,
        def: &mut NodeDefinition,
        node: NodeId,
        _attribute: Option<&Attribute>,
    ) -> Result<bool, CompileError> {
        let Some(source) = cx.dom().text(node).map(str::to_string) else {
            return Ok(false);
        };
        def.content.push(cx.registry().interpolation(&source)?);
        cx.dom_mut().set_text_content(node, "");
        Ok(true)
    }

    fn process(&self, def: &NodeDefinition, cx: &mut ProcessContext<'_>, node: NodeId) {
        for interpolation in &def.content {
            let template = interpolation.clone();
            let effect = cx.bind(interpolation.dependencies(), node, None, move |cx, effect| {
                let result = cx.evaluate(&template);
                if let Some(text) = result.as_text() {
                    cx.dom_mut().set_text_content(effect.node, text);
                }
            });
            cx.run(&effect);
        }
    }
}
