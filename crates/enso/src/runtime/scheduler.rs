//! Dirty marking and batched update passes.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;

use super::context::EffectContext;
use super::effect::{Effect, EffectId};
use super::instance::SlotKind;
use super::{InstanceId, Runtime};

impl Runtime {
    /// Marks `field` changed on `id` and every fragment below it.
    ///
    /// Instances without a binding for `field` ignore the mark. The owning
    /// component requests one update pass per dirty cycle, however many
    /// fields are marked before it runs.
    pub fn mark_changed(&mut self, id: InstanceId, field: &str) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return;
        };
        if slot.bindings.mark(field) {
            self.schedule(id);
        }
        let children = self.slot(id).children.clone();
        for child in children {
            self.mark_changed(child, field);
        }
    }

    /// Requests a pass for `id`. Fragments flag themselves and defer to
    /// their component, which queues at most one frame.
    fn schedule(&mut self, id: InstanceId) {
        let slot = self.slot_mut(id);
        match &slot.kind {
            SlotKind::Fragment(_) => {
                slot.update_scheduled = true;
                let component = slot.component;
                self.schedule(component);
            }
            SlotKind::Component(state) => {
                if slot.update_scheduled || !state.connected {
                    return;
                }
                slot.update_scheduled = true;
                self.frame_queue.push(id);
                trace!(instance = %id, "update pass requested");
            }
            SlotKind::Vacant => {}
        }
    }

    /// Runs every pass requested so far. Passes requested while this frame
    /// runs wait for the next one. Returns the number of passes taken from
    /// the queue.
    pub fn run_frame(&mut self) -> usize {
        let queue = std::mem::take(&mut self.frame_queue);
        for id in &queue {
            self.scheduled_update(*id);
        }
        queue.len()
    }

    /// Runs frames until no pass is pending, at most `limit` times.
    pub fn run_until_idle(&mut self, limit: usize) -> usize {
        let mut frames = 0;
        while frames < limit && self.has_pending_frame() {
            self.run_frame();
            frames += 1;
        }
        frames
    }

    fn scheduled_update(&mut self, id: InstanceId) {
        let slot = self.slot_mut(id);
        slot.update_scheduled = false;
        if !slot.is_attached() {
            return;
        }

        self.stats.passes += 1;
        trace!(instance = %id, "update pass");
        self.call_hook(id, |script, cx| script.pre_update(cx));

        let mut seen = HashSet::new();
        self.run_changed(id, &mut seen);
        let children = self.slot(id).children.clone();
        for child in children {
            self.update_fragment(child, &mut seen);
        }

        self.call_hook(id, |script, cx| script.post_update(cx));
    }

    /// Runs a fragment's pending effects, then its children's. Detached
    /// fragments keep their dirty bindings for the next mount.
    pub(crate) fn update_fragment(&mut self, id: InstanceId, seen: &mut HashSet<EffectId>) {
        let slot = self.slot_mut(id);
        if !slot.is_attached() {
            return;
        }
        if slot.update_scheduled {
            slot.update_scheduled = false;
            self.run_changed(id, seen);
        }
        let children = self.slot(id).children.clone();
        for child in children {
            self.update_fragment(child, seen);
        }
    }

    fn run_changed(&mut self, id: InstanceId, seen: &mut HashSet<EffectId>) {
        let effects = self.slot_mut(id).bindings.drain_changed(seen);
        for effect in effects {
            self.run_effect(&effect);
        }
    }

    pub(crate) fn run_effect(&mut self, effect: &Rc<Effect>) {
        self.stats.effects_run += 1;
        let action = effect.action();
        let mut cx = EffectContext::new(self, effect.owner);
        action(&mut cx, effect.as_ref());
    }
}
