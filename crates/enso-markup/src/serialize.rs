//! HTML serialization of a [`Dom`] subtree.
//!
//! Markers are bookkeeping and never appear in the output. Attribute order is
//! insertion order, which keeps output stable for snapshot tests.

use crate::dom::{Dom, NodeData, NodeId};
use crate::parse::is_void_element;

impl Dom {
    /// Serializes `id` including its own markup.
    ///
    /// Fragments have no markup of their own, so this equals
    /// [`inner_html`](Self::inner_html) for them.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Fragment => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        out.push_str("=\"");
                        escape_into(&attr.value, true, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(tag) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeData::Text(text) => escape_into(text, false, out),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
