//! Arena-backed node tree.
//!
//! [`Dom`] is the rendering surface the engine mutates. Nodes live in a single
//! arena and are addressed by [`NodeId`]; detaching a node only unlinks it from
//! its parent, so detached subtrees stay valid and can be reinserted later.
//! [`Dom::remove`] frees a subtree; its slots are reused by later nodes and
//! ids pointing into it must not be used again.
//!
//! Every node can carry a *marker*: the index of the compiled node definition
//! that claimed it. Markers survive [`Dom::import`], which is how a cloned
//! template finds its reactive nodes again without re-walking the markup.

use std::fmt;

/// Handle to a node inside a [`Dom`].
///
/// Ids are only meaningful for the `Dom` that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena slot of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Childful container without markup of its own (document fragment).
    Fragment,
    /// Element with a lowercase tag and ordered attributes.
    Element {
        tag: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    marker: Option<usize>,
    freed: bool,
}

/// Arena of nodes forming any number of trees.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl Dom {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
            marker: None,
            freed: false,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    /// Creates a detached element. Tag names are stored lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Element { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    /// Returns the tag of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.is_element(*child))
    }

    /// Returns `true` if `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Pre-order traversal of `root` and everything below it.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            stack: vec![root],
        }
    }

    // ---------------------------------------------------------------------
    // Tree mutation
    // ---------------------------------------------------------------------

    /// Unlinks a node from its parent. Returns `false` if it had none.
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.nodes[id.0].parent.take() {
            Some(parent) => {
                self.nodes[parent.0].children.retain(|child| *child != id);
                true
            }
            None => false,
        }
    }

    /// Detaches `id` and frees it together with everything below it.
    pub fn remove(&mut self, id: NodeId) {
        if self.nodes[id.0].freed {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let slot = &mut self.nodes[node.0];
            stack.append(&mut slot.children);
            slot.data = NodeData::Fragment;
            slot.parent = None;
            slot.marker = None;
            slot.freed = true;
            self.free.push(node);
        }
    }

    /// Appends `child` as the last child of `parent`, moving it if needed.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.contains(child, parent) {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn insert_at(&mut self, reference: NodeId, node: NodeId, offset: usize) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        if node == reference || self.contains(node, parent) {
            return false;
        }
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let position = siblings
            .iter()
            .position(|sibling| *sibling == reference)
            .map(|pos| pos + offset)
            .unwrap_or(siblings.len());
        siblings.insert(position, node);
        self.nodes[node.0].parent = Some(parent);
        true
    }

    /// Inserts `node` right before `reference`. No-op when `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> bool {
        self.insert_at(reference, node, 0)
    }

    /// Inserts `node` right after `reference`. No-op when `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> bool {
        self.insert_at(reference, node, 1)
    }

    /// Puts `replacement` where `old` was and detaches `old`.
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) -> bool {
        if !self.insert_before(old, replacement) {
            return false;
        }
        self.detach(old)
    }

    /// Moves every child of `from` to the end of `to`, keeping their order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.append_child(to, child);
        }
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    /// Attributes of an element, empty for every other node kind.
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.data(id) {
            NodeData::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Sets or replaces an attribute. Ignored on non-element nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            let value = value.into();
            match attributes.iter_mut().find(|attr| attr.name == name) {
                Some(existing) => existing.value = value,
                None => attributes.push(Attribute::new(name, value)),
            }
        }
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            let position = attributes.iter().position(|attr| attr.name == name)?;
            return Some(attributes.remove(position).value);
        }
        None
    }

    // ---------------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------------

    /// Value of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) | NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of all text nodes at or below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|node| match self.data(node) {
                NodeData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replaces the text of a character node, or the children of a container
    /// with a single text node. Replaced children are freed.
    pub fn set_text_content(&mut self, id: NodeId, content: impl Into<String>) {
        let content = content.into();
        if let NodeData::Text(text) | NodeData::Comment(text) = &mut self.nodes[id.0].data {
            *text = content;
            return;
        }
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
        if !content.is_empty() {
            let text = self.create_text(content);
            self.append_child(id, text);
        }
    }

    // ---------------------------------------------------------------------
    // Markers
    // ---------------------------------------------------------------------

    pub fn set_marker(&mut self, id: NodeId, index: usize) {
        self.nodes[id.0].marker = Some(index);
    }

    pub fn marker(&self, id: NodeId) -> Option<usize> {
        self.nodes[id.0].marker
    }

    pub fn take_marker(&mut self, id: NodeId) -> Option<usize> {
        self.nodes[id.0].marker.take()
    }

    // ---------------------------------------------------------------------
    // Cloning
    // ---------------------------------------------------------------------

    /// Deep-copies `node` from `source` into this arena, markers included.
    /// The copy starts detached.
    pub fn import(&mut self, source: &Dom, node: NodeId) -> NodeId {
        self.import_with(source, node, &mut |_, _| {})
    }

    /// Like [`import`](Self::import), reporting every marked copy to `visit`
    /// in document order.
    pub fn import_with(
        &mut self,
        source: &Dom,
        node: NodeId,
        visit: &mut dyn FnMut(usize, NodeId),
    ) -> NodeId {
        let original = &source.nodes[node.0];
        let copy = self.alloc(original.data.clone());
        if let Some(marker) = original.marker {
            self.nodes[copy.0].marker = Some(marker);
            visit(marker, copy);
        }
        for child in &original.children {
            let child_copy = self.import_with(source, *child, visit);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }
}

/// Iterator returned by [`Dom::descendants`].
pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(id).iter().rev().copied());
        Some(id)
    }
}
