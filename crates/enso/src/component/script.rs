use std::rc::Rc;

use serde_json::Value;

use crate::runtime::ComponentContext;

/// Lifecycle hooks of a component. Every hook defaults to doing nothing.
///
/// Scripts are shared by all instances of a definition; per-instance state
/// belongs in the component's fields.
pub trait ComponentScript {
    /// After the template is rendered and attached for the first time.
    fn on_start(&self, _cx: &mut ComponentContext<'_>) {}

    /// After a property was written, once the change has been marked.
    fn on_property_change(&self, _cx: &mut ComponentContext<'_>, _name: &str, _value: &Value) {}

    /// At the start of every scheduled pass, before effects run.
    fn pre_update(&self, _cx: &mut ComponentContext<'_>) {}

    /// At the end of every scheduled pass.
    fn post_update(&self, _cx: &mut ComponentContext<'_>) {}

    /// When the component is disconnected, before it is torn down.
    fn on_removed(&self, _cx: &mut ComponentContext<'_>) {}
}

/// A named method callable from event handlers.
pub type Method = Rc<dyn Fn(&mut ComponentContext<'_>)>;
