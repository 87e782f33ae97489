use std::fmt;
use std::rc::Rc;

use enso_markup::NodeId;

use super::context::EffectContext;
use super::InstanceId;

/// Unique id of an effect within one runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u64);

/// The mutation an effect performs.
pub type EffectAction = Rc<dyn Fn(&mut EffectContext<'_>, &Effect)>;

/// A mutation of one live output, re-run whenever a field it reads changes.
///
/// Effects write text content, one attribute, or a fragment's mount state.
/// Running an effect twice with unchanged inputs leaves the output as it was.
pub struct Effect {
    pub id: EffectId,
    /// Instance whose scope the effect evaluates in.
    pub owner: InstanceId,
    /// Live node the effect writes to.
    pub node: NodeId,
    /// Fragment controlled by the effect, for structural directives.
    pub fragment: Option<InstanceId>,
    action: EffectAction,
}

impl Effect {
    pub fn new(
        id: EffectId,
        owner: InstanceId,
        node: NodeId,
        fragment: Option<InstanceId>,
        action: EffectAction,
    ) -> Self {
        Self {
            id,
            owner,
            node,
            fragment,
            action,
        }
    }

    pub(crate) fn action(&self) -> EffectAction {
        Rc::clone(&self.action)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("node", &self.node)
            .field("fragment", &self.fragment)
            .finish_non_exhaustive()
    }
}
