//! Compiled templates.

use enso_markup::{Dom, NodeId};

use super::definition::NodeDefinition;

/// A compiled template: preprocessed markup plus its node definitions.
///
/// Blueprints are immutable and shared behind `Rc`. Every
/// [`instantiate`](Blueprint::instantiate) produces an independent copy of
/// the markup in the target [`Dom`].
#[derive(Debug)]
pub struct Blueprint {
    dom: Dom,
    root: NodeId,
    definitions: Vec<NodeDefinition>,
}

/// A fresh copy of a blueprint's markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Detached fragment holding the copy.
    pub root: NodeId,
    /// `(definition index, node)` for every marked node, in document order.
    pub marked: Vec<(usize, NodeId)>,
}

impl Blueprint {
    pub(crate) fn new(dom: Dom, root: NodeId, definitions: Vec<NodeDefinition>) -> Self {
        Self {
            dom,
            root,
            definitions,
        }
    }

    pub fn definitions(&self) -> &[NodeDefinition] {
        &self.definitions
    }

    pub fn definition(&self, index: usize) -> Option<&NodeDefinition> {
        self.definitions.get(index)
    }

    /// The preprocessed template markup, directive syntax stripped.
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Serializes the preprocessed markup.
    pub fn to_html(&self) -> String {
        self.dom.inner_html(self.root)
    }

    /// Copies the markup into `target`, collecting marked nodes on the way.
    pub fn instantiate(&self, target: &mut Dom) -> Instance {
        let mut marked = Vec::with_capacity(self.definitions.len());
        let root = target.import_with(&self.dom, self.root, &mut |index, node| {
            marked.push((index, node))
        });
        Instance { root, marked }
    }
}

#[cfg(test)]
mod tests {
    use crate::template::Registry;

    #[test]
    fn test_instances_are_independent() {
        let registry = Registry::new();
        let blueprint = registry
            .compile("<p>{{ this.a }}</p><i :title=\"{{ this.b }}\"></i>")
            .unwrap();

        let mut dom = enso_markup::Dom::new();
        let first = blueprint.instantiate(&mut dom);
        let second = blueprint.instantiate(&mut dom);

        assert_eq!(first.marked.len(), 2);
        assert_eq!(second.marked.len(), 2);
        assert_ne!(first.root, second.root);

        let (_, text) = first.marked[0];
        dom.set_text_content(text, "changed");
        let (_, other_text) = second.marked[0];
        assert_eq!(dom.text(other_text), Some(""));
        assert_eq!(dom.text(text), Some("changed"));
    }

    #[test]
    fn test_marked_in_document_order() {
        let registry = Registry::new();
        let blueprint = registry
            .compile("<a #first></a><b>{{ this.x }}</b><c @click=\"go\"></c>")
            .unwrap();
        let mut dom = enso_markup::Dom::new();
        let instance = blueprint.instantiate(&mut dom);
        let indices: Vec<usize> = instance.marked.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
