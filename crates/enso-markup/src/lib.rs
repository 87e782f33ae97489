//! # Enso Markup
//!
//! The rendering surface used by the Enso template engine: an arena node tree
//! ([`Dom`]), a lenient markup parser built on quick-xml, and an HTML
//! serializer.
//!
//! The engine never talks to a real browser. Everything it would do to a live
//! document (set text, toggle attributes, insert and detach subtrees) it does
//! to a [`Dom`], which makes rendered output easy to inspect:
//!
//! ```rust
//! use enso_markup::parse;
//!
//! let (mut dom, root) = parse(r#"<p class="greeting">Hi</p>"#).unwrap();
//! let p = dom.children(root)[0];
//! dom.set_text_content(p, "Hello");
//! dom.remove_attribute(p, "class");
//! assert_eq!(dom.to_html(root), "<p>Hello</p>");
//! ```
//!
//! ## Markers
//!
//! Nodes can carry a numeric marker ([`Dom::set_marker`]). Markers are copied
//! by [`Dom::import_with`], which reports each marked copy as it goes; the
//! template compiler uses this to find reactive nodes in a fresh clone.

mod dom;
mod error;
mod parse;
mod serialize;

pub use dom::{Attribute, Descendants, Dom, NodeData, NodeId};
pub use error::{MarkupError, Result};
pub use parse::{is_void_element, parse, VOID_ELEMENTS};
