use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::dom_tree::{Node, NodeRef};

/// Indexes for fast drawing lookup.
#[derive(Debug, Default)]
pub struct DomIndices {
    /// Maps an element's "id" attribute to the corresponding node. The first
    /// element carrying an id owns it.
    pub id_map: HashMap<String, NodeRef>,
    /// Maps a class name to all nodes that have that class, in document order.
    pub class_map: HashMap<String, Vec<NodeRef>>,
}

impl DomIndices {
    /// Build the indices for everything below `root`.
    pub fn build(root: &NodeRef) -> Self {
        let mut indices = DomIndices::default();
        Self::traverse(root, &mut indices);
        indices
    }

    /// Recursively traverse the tree and populate the indices.
    fn traverse(node: &NodeRef, indices: &mut DomIndices) {
        match &*node.borrow() {
            Node::DocumentRoot(root) => {
                for child in &root.children {
                    Self::traverse(child, indices);
                }
            }
            Node::Element(elem) => {
                if let Some(id_value) = elem.id() {
                    indices
                        .id_map
                        .entry(id_value.to_owned())
                        .or_insert_with(|| Rc::clone(node));
                }
                for class in elem.classes() {
                    indices
                        .class_map
                        .entry(class)
                        .or_default()
                        .push(Rc::clone(node));
                }
                for child in &elem.children {
                    Self::traverse(child, indices);
                }
            }
            // Text, comments and PIs are not indexed.
            _ => {}
        }
    }

    pub fn by_id(&self, id: &str) -> Option<NodeRef> {
        self.id_map.get(id).cloned()
    }

    pub fn by_class(&self, class: &str) -> &[NodeRef] {
        self.class_map.get(class).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::svg_tree::create_svg_tree;

    #[test]
    fn test_ids_and_classes() {
        let document = create_svg_tree(
            r#"<svg><defs><pattern id="brick"/></defs><g class="IfcSpace" id="s1"/><g class="IfcSpace IfcZone"/><path id="brick"/></svg>"#,
        );
        let indices = DomIndices::build(&document.root);
        let brick = indices.by_id("brick").unwrap();
        assert!(brick.borrow().as_element().unwrap().is("pattern"));
        assert_eq!(indices.by_class("IfcSpace").len(), 2);
        assert_eq!(indices.by_class("IfcZone").len(), 1);
        assert!(indices.by_class("missing").is_empty());
    }
}
