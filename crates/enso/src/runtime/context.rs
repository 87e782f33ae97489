//! Borrowed views of the runtime handed to parsers, effects and scripts.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use enso_markup::{Dom, NodeId};
use serde_json::Value;
use tracing::warn;

use super::effect::{Effect, EffectAction};
use super::events::{Listener, ListenerAction};
use super::{InstanceId, Runtime};
use crate::expr::{Interpolated, Interpolation};
use crate::template::Blueprint;

/// Runtime access for [`DirectiveParser::process`](crate::DirectiveParser::process).
///
/// Everything installed through the context belongs to the instance being
/// processed (the *owner*): effects land in its binding table, listeners and
/// references in its component.
pub struct ProcessContext<'a> {
    runtime: &'a mut Runtime,
    owner: InstanceId,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(runtime: &'a mut Runtime, owner: InstanceId) -> Self {
        Self { runtime, owner }
    }

    /// The component or fragment being processed.
    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    /// The component the owner belongs to.
    pub fn component(&self) -> InstanceId {
        self.runtime.slot(self.owner).component
    }

    pub fn dom(&self) -> &Dom {
        &self.runtime.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.runtime.dom
    }

    /// Creates an effect and registers it under every field in `fields`
    /// that resolves for the owner. Fields bound on an ancestor get a local
    /// binding on the owner; unbound fields are skipped.
    ///
    /// The effect does not run until [`run`](Self::run) or a later pass.
    pub fn bind<F>(
        &mut self,
        fields: &BTreeSet<String>,
        node: NodeId,
        fragment: Option<InstanceId>,
        action: F,
    ) -> Rc<Effect>
    where
        F: Fn(&mut EffectContext<'_>, &Effect) + 'static,
    {
        let action: EffectAction = Rc::new(action);
        let id = self.runtime.next_effect_id();
        let effect = Rc::new(Effect::new(id, self.owner, node, fragment, action));

        for field in fields {
            if !self.runtime.binding_resolves(self.owner, field) {
                continue;
            }
            let bindings = &mut self.runtime.slot_mut(self.owner).bindings;
            bindings.ensure(field);
            bindings.add_effect(field, Rc::clone(&effect));
        }
        effect
    }

    /// Runs an effect now.
    pub fn run(&mut self, effect: &Rc<Effect>) {
        self.runtime.run_effect(effect);
    }

    /// Stores `node` as a named reference of the component.
    pub fn set_ref(&mut self, name: &str, node: NodeId) {
        let component = self.component();
        if let Some(state) = self.runtime.slot_mut(component).as_component_mut() {
            state.refs.insert(name.to_string(), node);
        }
    }

    /// Attaches a listener for `event` (case-insensitive) to `node`.
    pub fn listen(&mut self, node: NodeId, event: &str, action: ListenerAction) {
        let listener = Listener {
            component: self.component(),
            scope: self.owner,
            action,
        };
        self.runtime
            .listeners
            .entry((node, event.to_ascii_lowercase()))
            .or_default()
            .push(listener);
    }

    /// Whether the component definition registers a method called `name`.
    pub fn has_method(&self, name: &str) -> bool {
        self.runtime
            .slot(self.component())
            .as_component()
            .is_some_and(|state| state.definition.has_method(name))
    }

    /// Creates an unmounted child fragment of the owner, positioned after
    /// `anchor`.
    pub fn create_fragment(&mut self, blueprint: Rc<Blueprint>, anchor: NodeId) -> InstanceId {
        self.runtime
            .create_fragment(self.owner, blueprint, anchor, BTreeMap::new())
    }

    /// Like [`create_fragment`](Self::create_fragment), with names visible
    /// only inside the fragment.
    pub fn create_fragment_with_locals(
        &mut self,
        blueprint: Rc<Blueprint>,
        anchor: NodeId,
        locals: BTreeMap<String, minijinja::Value>,
    ) -> InstanceId {
        self.runtime
            .create_fragment(self.owner, blueprint, anchor, locals)
    }
}

/// Runtime access for a running effect.
pub struct EffectContext<'a> {
    runtime: &'a mut Runtime,
    owner: InstanceId,
}

impl<'a> EffectContext<'a> {
    pub(crate) fn new(runtime: &'a mut Runtime, owner: InstanceId) -> Self {
        Self { runtime, owner }
    }

    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn dom(&self) -> &Dom {
        &self.runtime.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.runtime.dom
    }

    /// Evaluates a template in the owner's scope. Evaluation errors are
    /// logged and count as falsy.
    pub fn evaluate(&self, template: &Interpolation) -> Interpolated {
        let scope = self.runtime.scope_for(self.owner);
        match template.evaluate(&scope) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    instance = %self.owner,
                    source = template.source(),
                    "expression evaluation failed: {}",
                    e
                );
                Interpolated::Falsy
            }
        }
    }

    pub fn mount(&mut self, fragment: InstanceId) {
        self.runtime.mount(fragment);
    }

    pub fn unmount(&mut self, fragment: InstanceId) {
        self.runtime.unmount(fragment);
    }
}

/// Runtime access for lifecycle hooks and component methods.
pub struct ComponentContext<'a> {
    runtime: &'a mut Runtime,
    id: InstanceId,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(runtime: &'a mut Runtime, id: InstanceId) -> Self {
        Self { runtime, id }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.runtime.get(self.id, field)
    }

    /// Writes a field, exactly like [`Runtime::set`].
    pub fn set(&mut self, field: &str, value: Value) {
        if let Err(e) = self.runtime.set(self.id, field, value) {
            warn!(instance = %self.id, field, "failed to set field: {}", e);
        }
    }

    pub fn mark_changed(&mut self, field: &str) {
        self.runtime.mark_changed(self.id, field);
    }

    /// A node captured with `#name` in the template.
    pub fn reference(&self, name: &str) -> Option<NodeId> {
        self.runtime.reference(self.id, name)
    }

    pub fn host(&self) -> Option<NodeId> {
        self.runtime.host(self.id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.runtime.root(self.id)
    }

    pub fn dom(&self) -> &Dom {
        &self.runtime.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.runtime.dom
    }
}
