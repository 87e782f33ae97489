//! Fragments: subtrees mounted and unmounted by structural directives.
//!
//! ```text
//! created ──mount──► attached ──unmount──► detached ──mount──► attached …
//! ```
//!
//! The first mount instantiates the blueprint; later mounts reinsert the
//! same root, so output and bindings survive while detached. Changes marked
//! while detached are applied on the next mount. Retiring a fragment frees
//! its nodes and its instance slot.

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use enso_markup::NodeId;
use tracing::{debug, warn};

use super::context::ProcessContext;
use super::instance::{FragmentState, Slot};
use super::{InstanceId, Runtime};
use crate::template::Blueprint;

impl Runtime {
    pub(crate) fn create_fragment(
        &mut self,
        parent: InstanceId,
        blueprint: Rc<Blueprint>,
        anchor: NodeId,
        locals: BTreeMap<String, minijinja::Value>,
    ) -> InstanceId {
        let component = self.slot(parent).component;
        let state = FragmentState {
            blueprint,
            anchor,
            root: None,
            attached: false,
            locals,
        };
        let id = self.push_slot(|_| Slot::fragment(state, parent, component));
        self.slot_mut(parent).children.push(id);
        id
    }

    /// Inserts a fragment after its anchor.
    ///
    /// Does nothing if the fragment is already attached or its parent is
    /// not. The first mount renders the fragment and wires its directives
    /// after it is attached, so nested fragments can mount in turn.
    pub fn mount(&mut self, id: InstanceId) {
        let Some(slot) = self.slots.get(id.0) else {
            return;
        };
        let Some(state) = slot.as_fragment() else {
            return;
        };
        if state.attached {
            return;
        }
        if !slot.parent.is_some_and(|parent| self.is_attached(parent)) {
            return;
        }
        let anchor = state.anchor;
        let existing = state.root;
        let blueprint = Rc::clone(&state.blueprint);

        match existing {
            Some(root) => {
                if !self.dom.insert_after(anchor, root) {
                    warn!(fragment = %id, "fragment anchor is detached; mount skipped");
                    return;
                }
                self.set_attached(id, true);
                self.stats.mounts += 1;
                debug!(fragment = %id, "fragment remounted");
                self.update_fragment(id, &mut HashSet::new());
            }
            None => {
                let instance = blueprint.instantiate(&mut self.dom);
                let Some(root) = self.dom.first_element_child(instance.root) else {
                    self.dom.remove(instance.root);
                    warn!(fragment = %id, "fragment template has no root element");
                    return;
                };
                let marked: Vec<(usize, NodeId)> = instance
                    .marked
                    .iter()
                    .copied()
                    .filter(|&(_, node)| self.dom.contains(root, node))
                    .collect();
                let inserted = self.dom.insert_after(anchor, root);
                self.dom.remove(instance.root);
                if !inserted {
                    warn!(fragment = %id, "fragment anchor is detached; mount skipped");
                    return;
                }
                if let Some(state) = self.slot_mut(id).as_fragment_mut() {
                    state.root = Some(root);
                }
                self.set_attached(id, true);
                self.stats.mounts += 1;
                debug!(fragment = %id, "fragment mounted");
                self.process_instance(id, &blueprint, &marked);
            }
        }
    }

    /// Detaches a mounted fragment, keeping its output and bindings.
    pub fn unmount(&mut self, id: InstanceId) {
        let Some(state) = self.slots.get(id.0).and_then(|slot| slot.as_fragment()) else {
            return;
        };
        if !state.attached {
            return;
        }
        if let Some(root) = state.root {
            self.dom.detach(root);
        }
        self.set_attached(id, false);
        self.stats.unmounts += 1;
        debug!(fragment = %id, "fragment unmounted");
    }

    /// Mounted root element of a fragment, if it was ever mounted.
    pub fn fragment_root(&self, id: InstanceId) -> Option<NodeId> {
        self.slots
            .get(id.0)
            .and_then(|slot| slot.as_fragment())
            .and_then(|state| state.root)
    }

    /// Unmounts a fragment and its descendants for good, freeing their
    /// nodes and instance slots.
    pub(crate) fn retire_fragment(&mut self, id: InstanceId) {
        self.unmount(id);
        let children = std::mem::take(&mut self.slot_mut(id).children);
        for child in children {
            self.retire_fragment(child);
        }
        if let Some(root) = self.fragment_root(id) {
            self.dom.remove(root);
        }
        self.release_slot(id);
    }

    fn set_attached(&mut self, id: InstanceId, attached: bool) {
        if let Some(state) = self.slot_mut(id).as_fragment_mut() {
            state.attached = attached;
        }
    }

    /// Runs every claiming parser over the marked nodes of a fresh instance.
    pub(crate) fn process_instance(
        &mut self,
        owner: InstanceId,
        blueprint: &Blueprint,
        marked: &[(usize, NodeId)],
    ) {
        for &(index, node) in marked {
            let Some(def) = blueprint.definition(index) else {
                warn!(index, "marked node has no definition");
                continue;
            };
            self.dom.take_marker(node);
            for parser in &def.parsers {
                let mut cx = ProcessContext::new(self, owner);
                parser.process(def, &mut cx, node);
            }
        }
    }
}
