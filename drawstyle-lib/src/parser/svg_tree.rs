//! Builds the live drawing tree from SVG markup.
//!
//! html5ever parses the drawing in its foreign-content mode, which keeps SVG
//! tag and attribute casing, honours self-closing tags and turns CDATA
//! sections into text. The sink below records the result into the tree defined
//! in `crate::dom::dom_tree`.

use crate::dom::dom_tree::{self, Node, NodeRef};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use log::trace;
use std::cell::RefCell;
use std::rc::Rc;

/// Creates a tree from the provided SVG (or HTML wrapping SVG) markup.
///
/// # Arguments
///
/// * `markup` - A string slice containing the drawing.
///
/// # Returns
///
/// A `dom_tree::Document`; the drawing's `<svg>` element sits somewhere below its root.
pub fn create_svg_tree(markup: &str) -> dom_tree::Document {
    let tree_sink = SvgTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(markup)
}

/// Parses a markup fragment (one or more SVG elements) into detached nodes.
pub fn parse_fragment(markup: &str) -> Vec<NodeRef> {
    let document = create_svg_tree(&format!("<svg>{markup}</svg>"));
    let Some(wrapper) = dom_tree::find_first(&document.root, |e| e.is("svg")) else {
        return Vec::new();
    };
    let children: Vec<NodeRef> = wrapper.borrow().children().to_vec();
    for child in &children {
        dom_tree::remove_child(&wrapper, child);
    }
    children
}

fn qualified_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

/// A TreeSink building the drawing tree.
pub struct SvgTreeSink {
    document: dom_tree::Document,
    quirks_mode: RefCell<QuirksMode>,
}

impl SvgTreeSink {
    /// Creates a new `SvgTreeSink` with an empty document.
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    fn insert_at(&self, parent: &NodeRef, index: Option<usize>, child: NodeOrText<NodeRef>) {
        let node = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                // Adjacent text runs merge into one node.
                let neighbour = {
                    let parent_ref = parent.borrow();
                    let children = parent_ref.children();
                    let at = index.unwrap_or(children.len());
                    at.checked_sub(1).and_then(|i| children.get(i)).cloned()
                };
                if let Some(neighbour) = neighbour {
                    if let Node::Text(existing) = &mut *neighbour.borrow_mut() {
                        existing.push_str(&text);
                        return;
                    }
                }
                dom_tree::new_text(text.to_string())
            }
        };
        match index {
            Some(index) => dom_tree::insert_child(parent, index, node),
            None => dom_tree::append_child(parent, node),
        }
    }
}

impl Default for SvgTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// The element name handed back to html5ever.
#[derive(Debug)]
pub struct SvgElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for SvgElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for SvgTreeSink {
    type Handle = NodeRef;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = SvgElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        trace!("markup parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    /// Returns the element name for the given handle; non-elements get an empty name.
    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            Node::Element(elem) => SvgElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            _ => SvgElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let mut element = dom_tree::ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (qualified_name(&attr.name), attr.value.to_string()))
            .collect();
        Rc::new(RefCell::new(Node::Element(element)))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(text.to_string())))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        }))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.insert_at(parent, None, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if dom_tree::parent(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = dom_tree::parent(sibling) else {
            return;
        };
        let position = parent
            .borrow()
            .children()
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling));
        if let Some(position) = position {
            self.insert_at(&parent, Some(position), child);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let Node::Element(elem) = &mut *target.borrow_mut() {
            for attr in attrs {
                let key = qualified_name(&attr.name);
                if elem.attribute(&key).is_none() {
                    elem.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        if let Some(parent) = dom_tree::parent(target) {
            dom_tree::remove_child(&parent, target);
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children: Vec<NodeRef> = node.borrow().children().to_vec();
        for child in children {
            dom_tree::remove_child(node, &child);
            dom_tree::append_child(new_parent, child);
        }
    }
}
