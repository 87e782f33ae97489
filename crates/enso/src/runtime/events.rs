//! Event listeners and dispatch.

use std::rc::Rc;

use enso_markup::NodeId;
use tracing::warn;

use super::context::ComponentContext;
use super::{InstanceId, Runtime};
use crate::expr::{Handler, Statement};

/// What a listener does when its event fires.
#[derive(Debug, Clone)]
pub enum ListenerAction {
    Run(Rc<Handler>),
    /// Stand-in for a handler that failed to compile or resolve.
    Invalid,
}

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub component: InstanceId,
    /// Instance whose scope handler expressions evaluate in.
    pub scope: InstanceId,
    pub action: ListenerAction,
}

impl Runtime {
    /// Fires `event` at `node`, bubbling up through its ancestors. Returns
    /// how many listeners ran.
    pub fn dispatch(&mut self, node: NodeId, event: &str) -> usize {
        let event = event.to_ascii_lowercase();
        let mut fired = 0;
        let mut current = Some(node);

        while let Some(target) = current {
            let listeners = self
                .listeners
                .get(&(target, event.clone()))
                .cloned()
                .unwrap_or_default();
            for listener in &listeners {
                self.fire(listener, &event);
                fired += 1;
            }
            current = self.dom.parent(target);
        }
        fired
    }

    /// Number of listeners attached to `node` for `event`.
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.listeners
            .get(&(node, event.to_ascii_lowercase()))
            .map_or(0, Vec::len)
    }

    fn fire(&mut self, listener: &Listener, event: &str) {
        let handler = match &listener.action {
            ListenerAction::Run(handler) => Rc::clone(handler),
            ListenerAction::Invalid => {
                warn!(event, instance = %listener.component, "invalid event handler fired");
                return;
            }
        };

        for statement in handler.statements() {
            match statement {
                Statement::Assign { field, value, .. } => {
                    let scope = self.scope_for(listener.scope);
                    let result = value
                        .eval(scope)
                        .map_err(|e| e.to_string())
                        .and_then(|v| serde_json::to_value(&v).map_err(|e| e.to_string()));
                    match result {
                        Ok(json) => {
                            if let Err(e) = self.set(listener.component, field, json) {
                                warn!(event, field = %field, "handler assignment failed: {}", e);
                            }
                        }
                        Err(e) => {
                            warn!(event, source = handler.source(), "handler evaluation failed: {}", e);
                        }
                    }
                }
                Statement::Call { method } => {
                    let Some(callback) = self
                        .slot(listener.component)
                        .as_component()
                        .and_then(|state| state.definition.method_named(method))
                    else {
                        warn!(event, method = %method, "handler method is not defined");
                        continue;
                    };
                    let mut cx = ComponentContext::new(self, listener.component);
                    callback(&mut cx);
                }
            }
        }
    }
}
