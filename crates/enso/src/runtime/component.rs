//! Component registration and lifecycle.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use enso_markup::NodeId;
use serde_json::Value;
use tracing::debug;

use super::context::ComponentContext;
use super::instance::{ComponentState, Slot};
use super::{InstanceId, Runtime};
use crate::component::{ComponentDefinition, ComponentScript};
use crate::error::{DefinitionError, RuntimeError};

impl Runtime {
    /// Registers a component definition under its tag.
    ///
    /// Tags must be lowercase, start with a letter and contain a `-`.
    pub fn define(&mut self, definition: ComponentDefinition) -> Result<(), DefinitionError> {
        let tag = definition.tag().to_string();
        if !is_valid_tag(&tag) {
            return Err(DefinitionError::InvalidTag(tag));
        }
        if self.definitions.contains_key(&tag) {
            return Err(DefinitionError::DuplicateTag(tag));
        }
        debug!(tag = %tag, "component defined");
        self.definitions.insert(tag, Rc::new(definition));
        Ok(())
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    /// Creates a detached host element for `tag` with default field values.
    pub fn create(&mut self, tag: &str) -> Result<InstanceId, RuntimeError> {
        let definition = self
            .definitions
            .get(tag)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownTag(tag.to_string()))?;

        let host = self.dom.create_element(tag);
        let fields: BTreeMap<String, Value> = definition
            .properties()
            .map(|prop| (prop.name.clone(), prop.default.clone()))
            .collect();
        let names: Vec<String> = fields.keys().cloned().collect();

        let state = ComponentState {
            definition,
            host,
            root: host,
            fields: Arc::new(fields),
            refs: HashMap::new(),
            connected: false,
        };
        let id = self.push_slot(|id| Slot::component(state, id));
        let bindings = &mut self.slot_mut(id).bindings;
        for name in &names {
            bindings.ensure(name);
        }
        Ok(id)
    }

    /// Appends the host under `parent` and renders the component.
    ///
    /// Forced attribute properties are reflected, the template is
    /// instantiated and wired, style sheets are attached and `on_start`
    /// runs. Connecting an already connected component does nothing.
    pub fn connect(&mut self, id: InstanceId, parent: NodeId) -> Result<(), RuntimeError> {
        let state = self.component_state(id)?;
        if state.connected {
            return Ok(());
        }
        let definition = Rc::clone(&state.definition);
        let host = state.host;

        self.dom.append_child(parent, host);
        for property in definition.properties().filter(|prop| prop.is_forced()) {
            self.reflect_attribute(id, &property.name);
        }

        let root = if definition.uses_shadow() {
            self.dom.create_fragment()
        } else {
            host
        };
        let slot = self.slot_mut(id);
        slot.bindings.clear_changes();
        if let Some(state) = slot.as_component_mut() {
            state.root = root;
            state.connected = true;
        }

        let blueprint = Rc::clone(definition.blueprint());
        let instance = blueprint.instantiate(&mut self.dom);
        self.process_instance(id, &blueprint, &instance.marked);
        self.dom.move_children(instance.root, root);
        self.dom.remove(instance.root);
        self.styles
            .attach(&mut self.dom, root, definition.style_sheets());

        debug!(tag = definition.tag(), instance = %id, "component connected");
        self.call_hook(id, |script, cx| script.on_start(cx));
        Ok(())
    }

    /// Runs `on_removed`, then tears the rendered instance down: fragments
    /// are retired, effects, references and listeners dropped, rendered
    /// nodes freed and the host detached. Field values are kept; connecting
    /// again re-renders.
    pub fn disconnect(&mut self, id: InstanceId) -> Result<(), RuntimeError> {
        if !self.component_state(id)?.connected {
            return Ok(());
        }
        self.call_hook(id, |script, cx| script.on_removed(cx));

        let children = std::mem::take(&mut self.slot_mut(id).children);
        for child in children {
            self.retire_fragment(child);
        }

        let slot = self.slot_mut(id);
        slot.bindings.clear_effects();
        slot.update_scheduled = false;
        let (host, root) = match slot.as_component_mut() {
            Some(state) => {
                state.refs.clear();
                state.connected = false;
                let root = std::mem::replace(&mut state.root, state.host);
                (state.host, root)
            }
            None => return Err(RuntimeError::NotAComponent(id)),
        };

        self.frame_queue.retain(|queued| *queued != id);
        self.listeners.retain(|_, listeners| {
            listeners.retain(|listener| listener.component != id);
            !listeners.is_empty()
        });
        if root == host {
            for child in self.dom.children(root).to_vec() {
                self.dom.remove(child);
            }
        } else {
            self.dom.remove(root);
        }
        self.dom.detach(host);

        debug!(instance = %id, "component disconnected");
        Ok(())
    }

    pub fn is_connected(&self, id: InstanceId) -> bool {
        self.component_state(id).is_ok_and(|state| state.connected)
    }

    /// Current value of a component field.
    pub fn get(&self, id: InstanceId, field: &str) -> Option<&Value> {
        self.component_state(id).ok()?.fields.get(field)
    }

    /// Writes a component field.
    ///
    /// The write always marks the field changed, even when the value is
    /// unchanged. Attribute properties are reflected onto the host, then
    /// `on_property_change` runs.
    pub fn set(&mut self, id: InstanceId, field: &str, value: Value) -> Result<(), RuntimeError> {
        let state = self
            .slots
            .get_mut(id.0)
            .and_then(Slot::as_component_mut)
            .ok_or(RuntimeError::NotAComponent(id))?;
        Arc::make_mut(&mut state.fields).insert(field.to_string(), value.clone());
        let reflects = state
            .definition
            .property_named(field)
            .is_some_and(|prop| prop.attribute.is_some());

        self.mark_changed(id, field);
        if reflects {
            self.reflect_attribute(id, field);
        }
        self.call_hook(id, |script, cx| script.on_property_change(cx, field, &value));
        Ok(())
    }

    /// Sets or removes an attribute on the host element, as markup or a
    /// script outside the component would. Names are case-insensitive.
    /// Attribute properties pick up the converted value.
    pub fn set_host_attribute(
        &mut self,
        id: InstanceId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let state = self.component_state(id)?;
        let host = state.host;
        let definition = Rc::clone(&state.definition);
        let name = name.to_ascii_lowercase();

        if self.dom.attribute(host, &name) == value {
            return Ok(());
        }
        match value {
            Some(value) => self.dom.set_attribute(host, &name, value),
            None => {
                self.dom.remove_attribute(host, &name);
            }
        }

        let Some(property) = definition.attribute_property(&name) else {
            return Ok(());
        };
        let Some(converter) = property.attribute else {
            return Ok(());
        };
        let converted = converter.to_prop(value);
        if self.get(id, &property.name) != Some(&converted) {
            self.set(id, &property.name, converted)?;
        }
        Ok(())
    }

    pub fn host(&self, id: InstanceId) -> Option<NodeId> {
        self.component_state(id).ok().map(|state| state.host)
    }

    /// Node the template renders into: the host, or its shadow root.
    pub fn root(&self, id: InstanceId) -> Option<NodeId> {
        self.component_state(id).ok().map(|state| state.root)
    }

    /// A node captured with `#name`.
    pub fn reference(&self, id: InstanceId, name: &str) -> Option<NodeId> {
        self.component_state(id).ok()?.refs.get(name).copied()
    }

    /// Serialized content of the component's render root.
    pub fn render(&self, id: InstanceId) -> Option<String> {
        self.root(id).map(|root| self.dom.inner_html(root))
    }

    fn component_state(&self, id: InstanceId) -> Result<&ComponentState, RuntimeError> {
        self.slots
            .get(id.0)
            .and_then(Slot::as_component)
            .ok_or(RuntimeError::NotAComponent(id))
    }

    fn reflect_attribute(&mut self, id: InstanceId, field: &str) {
        let Ok(state) = self.component_state(id) else {
            return;
        };
        let Some(converter) = state
            .definition
            .property_named(field)
            .and_then(|prop| prop.attribute)
        else {
            return;
        };
        let host = state.host;
        let value = state.fields.get(field).cloned().unwrap_or(Value::Null);
        let name = field.to_ascii_lowercase();

        let wanted = converter.to_attr(&value);
        if wanted.as_deref() == self.dom.attribute(host, &name) {
            return;
        }
        match wanted {
            Some(text) => self.dom.set_attribute(host, &name, text),
            None => {
                self.dom.remove_attribute(host, &name);
            }
        }
    }

    /// Runs a lifecycle hook of the component owning `id`, if it has a script.
    pub(crate) fn call_hook(
        &mut self,
        id: InstanceId,
        hook: impl FnOnce(&dyn ComponentScript, &mut ComponentContext<'_>),
    ) {
        let script = self
            .slot(id)
            .as_component()
            .and_then(|state| state.definition.script_hooks());
        if let Some(script) = script {
            let mut cx = ComponentContext::new(self, id);
            hook(script.as_ref(), &mut cx);
        }
    }
}

fn is_valid_tag(tag: &str) -> bool {
    tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag.contains('-')
        && !tag.ends_with('-')
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_validation() {
        assert!(is_valid_tag("x-counter"));
        assert!(is_valid_tag("my-app-2"));
        assert!(!is_valid_tag("counter"));
        assert!(!is_valid_tag("X-Counter"));
        assert!(!is_valid_tag("-x"));
        assert!(!is_valid_tag("x-"));
    }
}
