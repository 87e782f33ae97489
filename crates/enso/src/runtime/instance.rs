//! Arena slots for component and fragment instances.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use enso_markup::NodeId;
use serde_json::Value;

use super::binding::BindingTable;
use super::InstanceId;
use crate::component::ComponentDefinition;
use crate::template::Blueprint;

pub(crate) struct Slot {
    /// Parent instance; `None` for components.
    pub parent: Option<InstanceId>,
    /// The component this instance belongs to (itself for components).
    pub component: InstanceId,
    pub bindings: BindingTable,
    /// Child fragments, in creation order.
    pub children: Vec<InstanceId>,
    pub update_scheduled: bool,
    pub kind: SlotKind,
}

pub(crate) enum SlotKind {
    Component(ComponentState),
    Fragment(FragmentState),
    /// Released; waiting to be reused.
    Vacant,
}

pub(crate) struct ComponentState {
    pub definition: Rc<ComponentDefinition>,
    pub host: NodeId,
    /// Where the template renders: the host, or a separate shadow root.
    pub root: NodeId,
    /// Shared with evaluation scopes; written through `Arc::make_mut`.
    pub fields: Arc<BTreeMap<String, Value>>,
    pub refs: HashMap<String, NodeId>,
    pub connected: bool,
}

pub(crate) struct FragmentState {
    pub blueprint: Rc<Blueprint>,
    pub anchor: NodeId,
    /// Mounted root element; kept while unmounted so remounting is cheap.
    pub root: Option<NodeId>,
    pub attached: bool,
    /// Names visible to expressions inside the fragment before the
    /// component's own scope.
    pub locals: BTreeMap<String, minijinja::Value>,
}

impl Slot {
    pub fn component(state: ComponentState, id: InstanceId) -> Self {
        Self {
            parent: None,
            component: id,
            bindings: BindingTable::new(),
            children: Vec::new(),
            update_scheduled: false,
            kind: SlotKind::Component(state),
        }
    }

    pub fn fragment(state: FragmentState, parent: InstanceId, component: InstanceId) -> Self {
        Self {
            parent: Some(parent),
            component,
            bindings: BindingTable::new(),
            children: Vec::new(),
            update_scheduled: false,
            kind: SlotKind::Fragment(state),
        }
    }

    pub fn vacant(id: InstanceId) -> Self {
        Self {
            parent: None,
            component: id,
            bindings: BindingTable::new(),
            children: Vec::new(),
            update_scheduled: false,
            kind: SlotKind::Vacant,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentState> {
        match &self.kind {
            SlotKind::Component(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut ComponentState> {
        match &mut self.kind {
            SlotKind::Component(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&FragmentState> {
        match &self.kind {
            SlotKind::Fragment(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_fragment_mut(&mut self) -> Option<&mut FragmentState> {
        match &mut self.kind {
            SlotKind::Fragment(state) => Some(state),
            _ => None,
        }
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self.kind, SlotKind::Vacant)
    }

    /// Connected components and mounted fragments are attached.
    pub fn is_attached(&self) -> bool {
        match &self.kind {
            SlotKind::Component(state) => state.connected,
            SlotKind::Fragment(state) => state.attached,
            SlotKind::Vacant => false,
        }
    }
}
