//! Lenient HTML-ish markup parsing on top of quick-xml.
//!
//! Templates are HTML fragments rather than XML documents, so the reader is
//! configured to tolerate what HTML allows:
//!
//! - void elements (`<br>`, `<input>`) need no closing tag
//! - attributes may be unquoted or valueless (`<span #display>`)
//! - unmatched closing tags are dropped, unclosed elements end at EOF
//! - a bare `&` that is not an entity is kept verbatim
//! - `<`, `>` and `&` inside a `{{ … }}` span of text are literal, so
//!   `{{ this.a < 3 }}` reaches the text node unchanged
//!
//! Directive attribute names (`@click`, `:class`, `*if`, `#ref`) are ordinary
//! attribute names at this level.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::dom::{Dom, NodeId};
use crate::error::{MarkupError, Result};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parses `markup` into a fresh arena, returning it with the fragment root.
///
/// # Example
///
/// ```rust
/// use enso_markup::parse;
///
/// let (dom, root) = parse("<p>Hello <b>world</b></p>").unwrap();
/// assert_eq!(dom.text_content(root), "Hello world");
/// ```
pub fn parse(markup: &str) -> Result<(Dom, NodeId)> {
    let mut dom = Dom::new();
    let root = dom.parse_fragment(markup)?;
    Ok((dom, root))
}

impl Dom {
    /// Parses `markup` into a new detached fragment of this arena.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<NodeId> {
        let markup = protect_interpolations(markup);
        let mut reader = Reader::from_str(&markup);
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = false;
        reader.config_mut().allow_unmatched_ends = true;

        let root = self.create_fragment();
        // Open elements, innermost last. The fragment root is never popped.
        let mut open: Vec<(NodeId, String)> = vec![(root, String::new())];

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader.read_event().map_err(|e| MarkupError::Syntax {
                position,
                message: e.to_string(),
            })?;
            let parent = open.last().map(|(id, _)| *id).unwrap_or(root);

            match event {
                Event::Start(start) => {
                    let (element, tag) = self.element_from(&start, position)?;
                    self.append_child(parent, element);
                    if !is_void_element(&tag) {
                        open.push((element, tag));
                    }
                }
                Event::Empty(start) => {
                    let (element, _) = self.element_from(&start, position)?;
                    self.append_child(parent, element);
                }
                Event::End(end) => {
                    let tag = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                    if let Some(depth) = open.iter().rposition(|(_, open_tag)| *open_tag == tag) {
                        if depth > 0 {
                            open.truncate(depth);
                        }
                    }
                }
                Event::Text(text) => {
                    let content = text
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| unescape_lenient(&String::from_utf8_lossy(&text)));
                    if !content.is_empty() {
                        let node = self.create_text(content);
                        self.append_child(parent, node);
                    }
                }
                Event::CData(data) => {
                    let node = self.create_text(String::from_utf8_lossy(&data).into_owned());
                    self.append_child(parent, node);
                }
                Event::Comment(comment) => {
                    let node = self.create_comment(String::from_utf8_lossy(&comment).into_owned());
                    self.append_child(parent, node);
                }
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }

        Ok(root)
    }

    fn element_from(&mut self, start: &BytesStart<'_>, position: u64) -> Result<(NodeId, String)> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
        let element = self.create_element(&tag);

        for attribute in start.html_attributes() {
            let attribute = attribute.map_err(|e| MarkupError::Attribute {
                position,
                message: e.to_string(),
            })?;
            let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&attribute.value).into_owned());
            self.set_attribute(element, &name, value);
        }

        Ok((element, tag))
    }
}

/// Escapes markup characters inside `{{ … }}` spans that appear in text.
///
/// Tags, attribute values and comments are copied as they are; quick-xml
/// already treats quoted attribute values as opaque.
fn protect_interpolations(markup: &str) -> Cow<'_, str> {
    if !markup.contains("{{") {
        return Cow::Borrowed(markup);
    }

    let mut out = String::with_capacity(markup.len() + 16);
    let mut rest = markup;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after.find("-->").map_or(after.len(), |i| i + 3);
            out.push_str("<!--");
            out.push_str(&after[..end]);
            rest = &after[end..];
        } else if rest.starts_with('<') {
            let end = tag_end(rest);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        } else if let Some(after) = rest.strip_prefix("{{") {
            let Some(close) = after.find("}}") else {
                out.push_str(rest);
                break;
            };
            out.push_str("{{");
            for c in after[..close].chars() {
                match c {
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '&' => out.push_str("&amp;"),
                    _ => out.push(c),
                }
            }
            out.push_str("}}");
            rest = &after[close + 2..];
        } else {
            let first = rest.chars().next().map_or(1, char::len_utf8);
            let next = rest[first..]
                .find(['<', '{'])
                .map_or(rest.len(), |i| i + first);
            out.push_str(&rest[..next]);
            rest = &rest[next..];
        }
    }
    Cow::Owned(out)
}

/// Byte length of the tag starting at the front of `input`, up to and
/// including the first `>` outside quotes.
fn tag_end(input: &str) -> usize {
    let mut quote = None;
    for (i, c) in input.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            (None, _) => {}
        }
    }
    input.len()
}

/// Decodes the predefined entities and leaves anything else as written.
fn unescape_lenient(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeData;

    #[test]
    fn test_parse_nested_elements() {
        let (dom, root) = parse("<div><span>hi</span><p>there</p></div>").unwrap();
        let div = dom.children(root)[0];
        assert_eq!(dom.tag(div), Some("div"));
        assert_eq!(dom.children(div).len(), 2);
        assert_eq!(dom.text_content(div), "hithere");
    }

    #[test]
    fn test_parse_keeps_whitespace_text() {
        let (dom, root) = parse("<a> </a>\n<b></b>").unwrap();
        assert_eq!(dom.children(root).len(), 3);
        assert_eq!(dom.text(dom.children(root)[1]), Some("\n"));
    }

    #[test]
    fn test_parse_directive_attributes() {
        let (dom, root) =
            parse(r#"<button #btn @click="()=>this.count++" :class="{{ this.cls }}">x</button>"#)
                .unwrap();
        let button = dom.children(root)[0];
        assert_eq!(dom.attribute(button, "#btn"), Some(""));
        assert_eq!(dom.attribute(button, "@click"), Some("()=>this.count++"));
        assert_eq!(dom.attribute(button, ":class"), Some("{{ this.cls }}"));
    }

    #[test]
    fn test_parse_void_elements_without_close() {
        let (dom, root) = parse("<p>a<br>b</p>").unwrap();
        let p = dom.children(root)[0];
        assert_eq!(dom.children(p).len(), 3);
        assert_eq!(dom.text_content(p), "ab");
    }

    #[test]
    fn test_parse_unmatched_end_is_dropped() {
        let (dom, root) = parse("<p>a</span>b</p>").unwrap();
        let p = dom.children(root)[0];
        assert_eq!(dom.text_content(p), "ab");
    }

    #[test]
    fn test_parse_unclosed_elements_end_at_eof() {
        let (dom, root) = parse("<div><p>open").unwrap();
        assert_eq!(dom.text_content(root), "open");
    }

    #[test]
    fn test_parse_comments() {
        let (dom, root) = parse("<!-- note --><i></i>").unwrap();
        assert_eq!(dom.data(dom.children(root)[0]), &NodeData::Comment(" note ".into()));
    }

    #[test]
    fn test_parse_comparison_inside_interpolation() {
        let (dom, root) = parse("<p>{{ this.a < 3 }}</p><i>{{ b > 1 && c }}</i>").unwrap();
        assert_eq!(dom.children(root).len(), 2);
        let p = dom.children(root)[0];
        assert_eq!(dom.children(p).len(), 1);
        assert_eq!(dom.text_content(p), "{{ this.a < 3 }}");
        assert_eq!(dom.text_content(dom.children(root)[1]), "{{ b > 1 && c }}");
    }

    #[test]
    fn test_interpolation_next_to_bare_ampersand() {
        let (dom, root) = parse("<p>a & b: {{ x < y }}</p>").unwrap();
        assert_eq!(dom.text_content(root), "a & b: {{ x < y }}");
    }

    #[test]
    fn test_quoted_attribute_values_left_alone() {
        let (dom, root) =
            parse(r#"<b @click="()=>this.n++" title="{{ a > b }}">{{ n >= 2 }}</b>"#).unwrap();
        let b = dom.children(root)[0];
        assert_eq!(dom.attribute(b, "@click"), Some("()=>this.n++"));
        assert_eq!(dom.attribute(b, "title"), Some("{{ a > b }}"));
        assert_eq!(dom.text_content(b), "{{ n >= 2 }}");
    }

    #[test]
    fn test_parse_entities() {
        let (dom, root) = parse("<p>a &amp; b</p>").unwrap();
        assert_eq!(dom.text_content(root), "a & b");
    }
}
