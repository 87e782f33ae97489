//! The reactive runtime.
//!
//! A [`Runtime`] owns the live [`Dom`], every component and fragment
//! instance, and the queue of pending update passes. Instances live in an
//! arena and are addressed by [`InstanceId`]; fragments refer to their parent
//! by id.
//!
//! # Update flow
//!
//! ```text
//! set(field) ──► mark_changed ──► binding dirty ──► frame requested (once)
//!                                                          │
//! run_frame() ◄────────────────────────────────────────────┘
//!     └─► pre_update ─► dirty effects (each once) ─► child fragments ─► post_update
//! ```
//!
//! Writes made before [`Runtime::run_frame`] are coalesced: a field written
//! ten times re-runs its effects once, with the latest value. `run_frame`
//! stands in for the host's per-frame callback; nothing runs until it is
//! called.

mod binding;
mod component;
mod context;
mod effect;
mod events;
mod fragment;
mod instance;
mod scheduler;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use enso_markup::{Dom, NodeId};
use serde::Serialize;

pub use binding::{Binding, BindingTable};
pub use context::{ComponentContext, EffectContext, ProcessContext};
pub use effect::{Effect, EffectAction, EffectId};
pub use events::ListenerAction;

use crate::component::{ComponentDefinition, StyleAttacher, StyleElements};
use crate::expr::{Fields, Scope};
use events::Listener;
use instance::{Slot, SlotKind};

/// Handle to a component or fragment instance inside a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counters describing the work a runtime has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// Scheduled update passes run.
    pub passes: u64,
    pub effects_run: u64,
    pub mounts: u64,
    pub unmounts: u64,
}

/// Owner of the live document and all instances.
pub struct Runtime {
    dom: Dom,
    document: NodeId,
    slots: Vec<Slot>,
    free_slots: Vec<InstanceId>,
    definitions: HashMap<String, Rc<ComponentDefinition>>,
    listeners: HashMap<(NodeId, String), Vec<Listener>>,
    frame_queue: Vec<InstanceId>,
    next_effect: u64,
    stats: RuntimeStats,
    styles: Box<dyn StyleAttacher>,
}

impl Runtime {
    pub fn new() -> Self {
        let mut dom = Dom::new();
        let document = dom.create_fragment();
        Self {
            dom,
            document,
            slots: Vec::new(),
            free_slots: Vec::new(),
            definitions: HashMap::new(),
            listeners: HashMap::new(),
            frame_queue: Vec::new(),
            next_effect: 0,
            stats: RuntimeStats::default(),
            styles: Box::new(StyleElements),
        }
    }

    /// Replaces the default `<style>` element insertion.
    pub fn with_style_attacher(mut self, styles: impl StyleAttacher + 'static) -> Self {
        self.styles = Box::new(styles);
        self
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    /// Root of the live document. Components connect below it.
    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Whether an update pass is waiting for [`run_frame`](Self::run_frame).
    pub fn has_pending_frame(&self) -> bool {
        !self.frame_queue.is_empty()
    }

    /// Live component and fragment instances.
    pub fn instance_count(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Connected component or mounted fragment.
    pub fn is_attached(&self, id: InstanceId) -> bool {
        self.slots.get(id.0).is_some_and(Slot::is_attached)
    }

    /// Child fragments of an instance, in creation order.
    pub fn children(&self, id: InstanceId) -> &[InstanceId] {
        self.slots
            .get(id.0)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
        self.slots.get(id.0).and_then(|slot| slot.parent)
    }

    pub fn bindings(&self, id: InstanceId) -> Option<&BindingTable> {
        self.slots.get(id.0).map(|slot| &slot.bindings)
    }

    pub fn is_update_scheduled(&self, id: InstanceId) -> bool {
        self.slots.get(id.0).is_some_and(|slot| slot.update_scheduled)
    }

    pub(crate) fn slot(&self, id: InstanceId) -> &Slot {
        &self.slots[id.0]
    }

    pub(crate) fn slot_mut(&mut self, id: InstanceId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    pub(crate) fn push_slot(&mut self, build: impl FnOnce(InstanceId) -> Slot) -> InstanceId {
        match self.free_slots.pop() {
            Some(id) => {
                self.slots[id.0] = build(id);
                id
            }
            None => {
                let id = InstanceId(self.slots.len());
                self.slots.push(build(id));
                id
            }
        }
    }

    /// Frees a slot for reuse. Its id must not be used afterwards.
    pub(crate) fn release_slot(&mut self, id: InstanceId) {
        if self.slot(id).is_vacant() {
            return;
        }
        self.slots[id.0] = Slot::vacant(id);
        self.free_slots.push(id);
    }

    pub(crate) fn next_effect_id(&mut self) -> EffectId {
        self.next_effect += 1;
        EffectId(self.next_effect)
    }

    /// Whether `field` is bound on `id` or any instance above it.
    pub(crate) fn binding_resolves(&self, id: InstanceId, field: &str) -> bool {
        let mut current = Some(id);
        while let Some(instance) = current {
            let slot = self.slot(instance);
            if slot.bindings.contains(field) {
                return true;
            }
            current = slot.parent;
        }
        false
    }

    /// Builds the evaluation scope of an instance: fragment locals, innermost
    /// first, then the component's exposed values and `this`.
    pub(crate) fn scope_for(&self, id: InstanceId) -> minijinja::Value {
        let mut fragments = Vec::new();
        let mut current = Some(id);
        let mut scope = Scope::new();

        while let Some(instance) = current {
            let slot = self.slot(instance);
            match &slot.kind {
                SlotKind::Fragment(_) => fragments.push(instance),
                SlotKind::Component(state) => {
                    let this = Fields::new(Arc::clone(&state.fields)).into_value();
                    scope = Scope::new()
                        .with("this", this)
                        .with_fields(state.definition.exposed_fields());
                    break;
                }
                SlotKind::Vacant => break,
            }
            current = slot.parent;
        }

        for fragment in fragments.into_iter().rev() {
            let Some(state) = self.slot(fragment).as_fragment() else {
                continue;
            };
            if state.locals.is_empty() {
                continue;
            }
            let mut frame = Scope::with_parent(Arc::new(scope));
            for (name, value) in &state.locals {
                frame.insert(name.as_str(), value.clone());
            }
            scope = frame;
        }

        scope.into_value()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.definitions.keys().collect();
        tags.sort();
        f.debug_struct("Runtime")
            .field("instances", &self.instance_count())
            .field("definitions", &tags)
            .field("pending_frames", &self.frame_queue.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
