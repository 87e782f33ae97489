//! Attaching component style sheets.

use enso_markup::{Dom, NodeId};

/// Puts a component's style sheets into its rendered root.
///
/// The host platform decides how styles are scoped; the runtime only hands
/// over the sheet texts, in declaration order.
pub trait StyleAttacher {
    fn attach(&self, dom: &mut Dom, root: NodeId, sheets: &[String]);
}

/// Inserts one `<style>` element per sheet at the start of the root.
#[derive(Debug, Default, Clone, Copy)]
pub struct StyleElements;

impl StyleAttacher for StyleElements {
    fn attach(&self, dom: &mut Dom, root: NodeId, sheets: &[String]) {
        let mut previous: Option<NodeId> = None;
        for sheet in sheets.iter().filter(|sheet| !sheet.trim().is_empty()) {
            let style = dom.create_element("style");
            let text = dom.create_text(sheet.as_str());
            dom.append_child(style, text);

            let placed = match (previous, dom.children(root).first().copied()) {
                (Some(previous), _) => dom.insert_after(previous, style),
                (None, Some(first)) => dom.insert_before(first, style),
                (None, None) => false,
            };
            if !placed {
                dom.append_child(root, style);
            }
            previous = Some(style);
        }
    }
}
