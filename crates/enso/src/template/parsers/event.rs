use enso_markup::{Attribute, Dom, NodeId};
use tracing::error;

use super::{attribute_name, has_prefix, CompileContext, DirectiveParser};
use crate::error::CompileError;
use crate::runtime::{ListenerAction, ProcessContext};
use crate::template::{EventBinding, NodeDefinition};

/// `@event="…"`: attaches a handler to the live node.
///
/// A handler that does not compile, or that calls a method the component
/// does not define, never fails the template. The error is logged and the
/// listener is replaced by one that only warns when the event fires.
#[derive(Debug, Default)]
pub struct EventParser;

impl DirectiveParser for EventParser {
    fn name(&self) -> &str {
        "event"
    }

    fn matches(&self, dom: &Dom, node: NodeId, attribute: Option<&Attribute>) -> bool {
        dom.is_element(node) && has_prefix(attribute, '@')
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
        let name = attribute_name(attribute);
        let handler = match cx.registry().handler(&attribute.value) {
            Ok(handler) => Some(handler),
            Err(e) => {
                error!(event = %name, source = %attribute.value, "invalid event handler: {}", e);
                None
            }
        };
        def.events.push(EventBinding {
            name,
            source: attribute.value.clone(),
            handler,
        });
        cx.dom_mut().remove_attribute(node, &attribute.name);
        Ok(true)
    }

    fn process(&self, def: &NodeDefinition, cx: &mut ProcessContext<'_>, node: NodeId) {
        for event in &def.events {
            let action = match &event.handler {
                Some(handler) => match handler.methods().find(|method| !cx.has_method(method)) {
                    None => ListenerAction::Run(handler.clone()),
                    Some(missing) => {
                        error!(
                            event = %event.name,
                            method = %missing,
                            "event handler calls a method the component does not define"
                        );
                        ListenerAction::Invalid
                    }
                },
                None => ListenerAction::Invalid,
            };
            cx.listen(node, &event.name, action);
        }
    }
}
