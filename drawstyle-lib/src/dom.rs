use html5ever::{LocalName, Namespace, QualName};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;

    pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

    pub type NodeRef = Rc<RefCell<Node>>;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
        Comment(String),
        ProcessingInstruction { target: String, data: String },
    }

    #[derive(Debug, Clone)]
    pub struct DocumentRootNode {
        pub children: Vec<NodeRef>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        /// Local name as written in the drawing (`linearGradient`, not lowercased).
        pub tag: String,
        pub qual_name: QualName,
        /// Attributes in source order, keyed by qualified name (`xlink:href`, `ifc:guid`).
        pub attributes: Vec<(String, String)>,
        pub children: Vec<NodeRef>,
        pub parent: Option<Weak<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: NodeRef,
        pub doctype: RefCell<Option<Doctype>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl Default for DocumentRootNode {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: Vec::new(),
                children: Vec::new(),
                parent: None,
            }
        }

        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }

        pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
            let value = value.into();
            match self.attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, existing)) => *existing = value,
                None => self.attributes.push((name.to_owned(), value)),
            }
        }

        pub fn id(&self) -> Option<&str> {
            self.attribute("id")
        }

        /// The whitespace separated entries of the `class` attribute.
        pub fn classes(&self) -> Vec<String> {
            self.attribute("class")
                .map(|c| c.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default()
        }

        pub fn has_class(&self, class: &str) -> bool {
            self.attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|entry| entry == class))
        }

        pub fn is(&self, tag: &str) -> bool {
            self.tag.eq_ignore_ascii_case(tag)
        }
    }

    impl Node {
        pub fn as_element(&self) -> Option<&ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn children(&self) -> &[NodeRef] {
            match self {
                Node::DocumentRoot(root) => &root.children,
                Node::Element(elem) => &elem.children,
                _ => &[],
            }
        }

        pub fn children_mut(&mut self) -> Option<&mut Vec<NodeRef>> {
            match self {
                Node::DocumentRoot(root) => Some(&mut root.children),
                Node::Element(elem) => Some(&mut elem.children),
                _ => None,
            }
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
        }
    }

    pub fn new_text(text: impl Into<String>) -> NodeRef {
        Rc::new(RefCell::new(Node::Text(text.into())))
    }

    /// A detached SVG element without attributes.
    pub fn new_element(tag: &str) -> NodeRef {
        let name = QualName::new(None, Namespace::from(SVG_NAMESPACE), LocalName::from(tag));
        Rc::new(RefCell::new(Node::Element(ElementNode::new(tag.to_owned(), name))))
    }

    pub fn parent(node: &NodeRef) -> Option<NodeRef> {
        node.borrow()
            .as_element()
            .and_then(|elem| elem.parent.as_ref())
            .and_then(Weak::upgrade)
    }

    fn set_parent(child: &NodeRef, parent: Option<&NodeRef>) {
        if let Node::Element(elem) = &mut *child.borrow_mut() {
            elem.parent = parent.map(Rc::downgrade);
        }
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append_child(parent: &NodeRef, child: NodeRef) {
        set_parent(&child, Some(parent));
        if let Some(children) = parent.borrow_mut().children_mut() {
            children.push(child);
        }
    }

    /// Inserts `child` at `index` among the children of `parent` (clamped to the end).
    pub fn insert_child(parent: &NodeRef, index: usize, child: NodeRef) {
        set_parent(&child, Some(parent));
        if let Some(children) = parent.borrow_mut().children_mut() {
            let index = index.min(children.len());
            children.insert(index, child);
        }
    }

    /// Detaches `child` from `parent`. Returns false when it was not a child.
    pub fn remove_child(parent: &NodeRef, child: &NodeRef) -> bool {
        let removed = match parent.borrow_mut().children_mut() {
            Some(children) => match children.iter().position(|c| Rc::ptr_eq(c, child)) {
                Some(pos) => {
                    children.remove(pos);
                    true
                }
                None => false,
            },
            None => false,
        };
        if removed {
            set_parent(child, None);
        }
        removed
    }

    pub fn element_children(node: &NodeRef) -> Vec<NodeRef> {
        node.borrow()
            .children()
            .iter()
            .filter(|c| matches!(*c.borrow(), Node::Element(_)))
            .cloned()
            .collect()
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(node: &NodeRef) -> String {
        let mut text = String::new();
        walk(node, &mut |n| {
            if let Node::Text(t) = &*n.borrow() {
                text.push_str(t);
            }
        });
        text
    }

    /// Depth-first pre-order walk over `node` and all of its descendants.
    pub fn walk<F: FnMut(&NodeRef)>(node: &NodeRef, visit: &mut F) {
        visit(node);
        let children: Vec<NodeRef> = node.borrow().children().to_vec();
        for child in &children {
            walk(child, visit);
        }
    }

    /// Every element below `node` (inclusive) for which `predicate` holds, in document order.
    pub fn find_all<P: Fn(&ElementNode) -> bool>(node: &NodeRef, predicate: P) -> Vec<NodeRef> {
        let mut found = Vec::new();
        walk(node, &mut |n| {
            if n.borrow().as_element().is_some_and(&predicate) {
                found.push(Rc::clone(n));
            }
        });
        found
    }

    pub fn find_first<P: Fn(&ElementNode) -> bool>(node: &NodeRef, predicate: P) -> Option<NodeRef> {
        find_all(node, predicate).into_iter().next()
    }
}
