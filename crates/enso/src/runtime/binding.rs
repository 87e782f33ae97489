//! Per-instance binding tables.
//!
//! A binding ties one field name to the effects that read it, plus a dirty
//! flag. Writing the field marks the binding; the next scheduled pass drains
//! every marked binding and runs its effects.

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use super::effect::{Effect, EffectId};

#[derive(Default)]
pub struct Binding {
    changed: bool,
    effects: Vec<Rc<Effect>>,
}

impl Binding {
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn effects(&self) -> &[Rc<Effect>] {
        &self.effects
    }
}

/// Field name → binding, for one component or fragment.
#[derive(Default)]
pub struct BindingTable {
    bindings: BTreeMap<String, Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.bindings.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Binding> {
        self.bindings.get(field)
    }

    /// Creates an empty binding for `field` if there is none.
    pub fn ensure(&mut self, field: &str) {
        if !self.bindings.contains_key(field) {
            self.bindings.insert(field.to_string(), Binding::default());
        }
    }

    /// Adds an effect to an existing binding. Returns `false` if `field` is
    /// not bound here.
    pub fn add_effect(&mut self, field: &str, effect: Rc<Effect>) -> bool {
        match self.bindings.get_mut(field) {
            Some(binding) => {
                binding.effects.push(effect);
                true
            }
            None => false,
        }
    }

    /// Marks `field` dirty. Returns `false` if `field` is not bound here.
    pub fn mark(&mut self, field: &str) -> bool {
        match self.bindings.get_mut(field) {
            Some(binding) => {
                binding.changed = true;
                true
            }
            None => false,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.bindings.values().any(|binding| binding.changed)
    }

    /// Clears every dirty flag and returns the effects to run, each once,
    /// skipping effects already in `seen`.
    pub fn drain_changed(&mut self, seen: &mut HashSet<EffectId>) -> Vec<Rc<Effect>> {
        let mut effects = Vec::new();
        for binding in self.bindings.values_mut().filter(|binding| binding.changed) {
            binding.changed = false;
            for effect in &binding.effects {
                if seen.insert(effect.id) {
                    effects.push(Rc::clone(effect));
                }
            }
        }
        effects
    }

    pub fn clear_changes(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.changed = false;
        }
    }

    /// Drops every effect, keeping the field names bound.
    pub fn clear_effects(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.changed = false;
            binding.effects.clear();
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Total number of registered effects across fields.
    pub fn effect_count(&self) -> usize {
        self.bindings.values().map(|binding| binding.effects.len()).sum()
    }
}
