use enso_markup::{Attribute, Dom, NodeId};
use tracing::debug;
use uuid::Uuid;

use super::{CompileContext, DirectiveParser};
use crate::error::CompileError;
use crate::runtime::ProcessContext;
use crate::template::{Directive, NodeDefinition};

/// Tag of the element standing in for a conditional node in templates.
pub const PLACEHOLDER_TAG: &str = "enso-placeholder";

/// Text of the comment marking a fragment's position in live output.
pub const ANCHOR_TEXT: &str = "enso:fragment";

const ATTRIBUTE: &str = "*if";

/// `*if="…"`: renders the node only while the guard is truthy.
///
/// The node is cut out of the template and compiled on its own. At runtime
/// its placeholder becomes an anchor comment, and a fragment built from the
/// nested blueprint is mounted after the anchor whenever the guard turns
/// truthy and detached when it turns falsy.
///
/// Guards containing `{{` follow interpolation rules; anything else is
/// evaluated as a bare expression.
#[derive(Debug, Default)]
pub struct ConditionalParser;

impl DirectiveParser for ConditionalParser {
    fn name(&self) -> &str {
        "if"
    }

    fn matches(&self, dom: &Dom, node: NodeId, attribute: Option<&Attribute>) -> bool {
        dom.is_element(node) && attribute.is_some_and(|attr| attr.name.eq_ignore_ascii_case(ATTRIBUTE))
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
        let guard = if attribute.value.contains("{{") {
            cx.registry().interpolation(&attribute.value)?
        } else {
            cx.registry().expression(&attribute.value)?
        };

        let mut nested = Dom::new();
        let nested_root = nested.create_fragment();
        let copy = nested.import(cx.dom(), node);
        nested.remove_attribute(copy, &attribute.name);
        nested.append_child(nested_root, copy);
        let blueprint = cx.registry().compile_fragment(nested, nested_root)?;

        let placeholder_id = format!("enso-{}-{}", cx.index(), Uuid::new_v4());
        let placeholder = cx.dom_mut().create_element(PLACEHOLDER_TAG);
        cx.dom_mut().set_attribute(placeholder, "id", placeholder_id.clone());
        if !cx.replace_node(node, placeholder) {
            return Ok(false);
        }

        def.directive = Some(Directive {
            kind: "if".into(),
            placeholder_id,
            blueprint,
            guard,
        });
        Ok(true)
    }

    fn process(&self, def: &NodeDefinition, cx: &mut ProcessContext<'_>, node: NodeId) {
        let Some(directive) = &def.directive else {
            return;
        };
        if cx.dom().attribute(node, "id") != Some(directive.placeholder_id.as_str()) {
            debug!(index = def.index, "conditional placeholder id does not match its definition");
        }

        let anchor = cx.dom_mut().create_comment(ANCHOR_TEXT);
        if cx.dom_mut().replace_with(node, anchor) {
            cx.dom_mut().remove(node);
        }
        let fragment = cx.create_fragment(directive.blueprint.clone(), anchor);

        let guard = directive.guard.clone();
        let effect = cx.bind(
            directive.guard.dependencies(),
            anchor,
            Some(fragment),
            move |cx, effect| {
                let Some(fragment) = effect.fragment else {
                    return;
                };
                if cx.evaluate(&guard).is_truthy() {
                    cx.mount(fragment);
                } else {
                    cx.unmount(fragment);
                }
            },
        );
        cx.run(&effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Registry;

    #[test]
    fn test_node_replaced_by_placeholder() {
        let blueprint = Registry::new()
            .compile(r#"<section><div *if="{{ this.show }}" class="x"><b>{{ this.show }}</b></div></section>"#)
            .unwrap();

        assert_eq!(blueprint.definitions().len(), 1);
        let directive = blueprint.definitions()[0].directive.as_ref().unwrap();
        assert_eq!(directive.kind, "if");
        assert!(directive.placeholder_id.starts_with("enso-0-"));
        assert_eq!(directive.depends().collect::<Vec<_>>(), vec!["show"]);

        let html = blueprint.to_html();
        assert!(html.starts_with(r#"<section><enso-placeholder id="enso-0-"#));
        assert!(!html.contains("<b>"));

        // The nested blueprint carries the node itself, minus the directive.
        assert_eq!(directive.blueprint.to_html(), r#"<div class="x"><b></b></div>"#);
        assert_eq!(directive.blueprint.definitions().len(), 1);
    }

    #[test]
    fn test_bare_expression_guard() {
        let blueprint = Registry::new()
            .compile(r#"<p *if="this.count > 2">many</p>"#)
            .unwrap();
        let directive = blueprint.definitions()[0].directive.as_ref().unwrap();
        assert!(directive.guard.dependencies().contains("count"));
    }

    #[test]
    fn test_placeholder_ids_unique_per_compile() {
        let registry = Registry::new();
        let a = registry.compile_uncached(r#"<p *if="{{ this.a }}">a</p>"#).unwrap();
        let b = registry.compile_uncached(r#"<p *if="{{ this.a }}">a</p>"#).unwrap();
        let id = |bp: &crate::template::Blueprint| {
            bp.definitions()[0]
                .directive
                .as_ref()
                .map(|d| d.placeholder_id.clone())
                .unwrap()
        };
        assert_ne!(id(&a), id(&b));
    }
}
