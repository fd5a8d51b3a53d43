use std::rc::Rc;

use crate::dom::dom_tree::{self, Node, NodeRef};

/// What the classifier needs to know about a clicked element.
///
/// The live drawing implements it through [`DomElement`]; tests use a fake.
pub trait ElementView: Clone {
    /// Lowercase tag name.
    fn tag_name(&self) -> String;
    fn classes(&self) -> Vec<String>;
    fn attribute(&self, name: &str) -> Option<String>;
    fn parent_element(&self) -> Option<Self>;
    /// True for the drawing's own `<svg>` element, where ancestor walks stop.
    fn is_drawing_root(&self) -> bool;

    fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    fn is_text_like(&self) -> bool {
        matches!(self.tag_name().as_str(), "text" | "tspan")
    }

    /// The nearest inclusive ancestor for which `predicate` holds.
    fn closest<P: Fn(&Self) -> bool>(&self, predicate: P) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(element) = current {
            if predicate(&element) {
                return Some(element);
            }
            current = element.parent_element();
        }
        None
    }
}

/// [`ElementView`] over a node of the parsed drawing.
#[derive(Debug, Clone)]
pub struct DomElement {
    node: NodeRef,
    root: NodeRef,
}

impl DomElement {
    /// Wraps `node`; `root` is the drawing's `<svg>` element.
    pub fn new(node: NodeRef, root: NodeRef) -> Option<Self> {
        if node.borrow().as_element().is_none() {
            return None;
        }
        Some(DomElement { node, root })
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }
}

impl ElementView for DomElement {
    fn tag_name(&self) -> String {
        match &*self.node.borrow() {
            Node::Element(elem) => elem.tag.to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    fn classes(&self) -> Vec<String> {
        self.node
            .borrow()
            .as_element()
            .map(|elem| elem.classes())
            .unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.node
            .borrow()
            .as_element()
            .and_then(|elem| elem.attribute(name))
            .map(str::to_owned)
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = dom_tree::parent(&self.node)?;
        DomElement::new(parent, Rc::clone(&self.root))
    }

    fn is_drawing_root(&self) -> bool {
        Rc::ptr_eq(&self.node, &self.root)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::ElementView;
    use std::rc::Rc;

    /// Hand-built element chain for classifier tests.
    #[derive(Debug, Clone)]
    pub struct FakeElement {
        tag: String,
        classes: Vec<String>,
        attributes: Vec<(String, String)>,
        parent: Option<Rc<FakeElement>>,
        root: bool,
    }

    impl FakeElement {
        pub fn root() -> Self {
            FakeElement {
                tag: "svg".to_owned(),
                classes: Vec::new(),
                attributes: Vec::new(),
                parent: None,
                root: true,
            }
        }

        pub fn new(tag: &str, classes: &[&str]) -> Self {
            FakeElement {
                tag: tag.to_owned(),
                classes: classes.iter().map(|c| c.to_string()).collect(),
                attributes: Vec::new(),
                parent: Some(Rc::new(FakeElement::root())),
                root: false,
            }
        }

        pub fn child(&self, tag: &str, classes: &[&str]) -> Self {
            let mut child = FakeElement::new(tag, classes);
            child.parent = Some(Rc::new(self.clone()));
            child
        }

        pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
            self.attributes.push((name.to_owned(), value.to_owned()));
            self
        }
    }

    impl ElementView for FakeElement {
        fn tag_name(&self) -> String {
            self.tag.clone()
        }

        fn classes(&self) -> Vec<String> {
            self.classes.clone()
        }

        fn attribute(&self, name: &str) -> Option<String> {
            self.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }

        fn parent_element(&self) -> Option<Self> {
            self.parent.as_deref().cloned()
        }

        fn is_drawing_root(&self) -> bool {
            self.root
        }
    }
}
