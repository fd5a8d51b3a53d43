//! The live drawing: a parsed SVG document with the handful of structural
//! lookups the editor needs.

use std::rc::Rc;

use log::debug;

use crate::defs::DefsHost;
use crate::dom::dom_tree::{self, Document, Node, NodeRef};
use crate::editor::symbols::SymbolShape;
use crate::error::StyleError;
use crate::parser::dom_indices::DomIndices;
use crate::parser::serialize::to_markup;
use crate::parser::svg_tree::{create_svg_tree, parse_fragment};
use crate::picker::DomElement;

const SPACE_CLASS: &str = "IfcSpace";
const GUID_ATTRIBUTE: &str = "ifc:guid";

#[derive(Debug)]
pub struct SvgDocument {
    /// Owns the nodes above `svg`.
    _document: Document,
    svg: NodeRef,
}

impl SvgDocument {
    /// Parses a drawing.
    ///
    /// # Arguments
    ///
    /// * `markup` - The SVG file contents.
    ///
    /// # Returns
    ///
    /// The document, or `StyleError::MissingSvgRoot` when no `<svg>` element is found.
    pub fn parse(markup: &str) -> Result<Self, StyleError> {
        let document = create_svg_tree(markup);
        let svg = dom_tree::find_first(&document.root, |e| e.is("svg")).ok_or(StyleError::MissingSvgRoot)?;
        Ok(SvgDocument {
            _document: document,
            svg,
        })
    }

    /// The drawing's `<svg>` element.
    pub fn root(&self) -> &NodeRef {
        &self.svg
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeRef> {
        DomIndices::build(&self.svg).by_id(id)
    }

    /// The `n`th element below `<svg>` in document order, counting from zero.
    pub fn nth_element(&self, n: usize) -> Option<NodeRef> {
        let mut elements = Vec::new();
        dom_tree::walk(&self.svg, &mut |node| {
            if !Rc::ptr_eq(node, &self.svg) && node.borrow().as_element().is_some() {
                elements.push(Rc::clone(node));
            }
        });
        elements.into_iter().nth(n)
    }

    /// Wraps `node` for the element classifier.
    pub fn element(&self, node: &NodeRef) -> Option<DomElement> {
        DomElement::new(Rc::clone(node), Rc::clone(&self.svg))
    }

    fn first_defs(&self) -> Option<NodeRef> {
        dom_tree::find_first(&self.svg, |e| e.is("defs"))
    }

    /// The definitions container, created as the first child of `<svg>` when missing.
    pub fn defs(&mut self) -> NodeRef {
        if let Some(defs) = self.first_defs() {
            return defs;
        }
        debug!("drawing has no <defs>, creating one");
        let defs = dom_tree::new_element("defs");
        dom_tree::insert_child(&self.svg, 0, Rc::clone(&defs));
        defs
    }

    fn style_element(&self) -> Option<NodeRef> {
        dom_tree::find_first(&self.svg, |e| e.is("style"))
    }

    /// Text of the embedded `<style>` element, without CDATA markers.
    pub fn style_text(&self) -> Option<String> {
        let style = self.style_element()?;
        let text = dom_tree::text_content(&style);
        let text = text.trim();
        let text = text.strip_prefix("<![CDATA[").unwrap_or(text);
        let text = text.strip_suffix("]]>").unwrap_or(text);
        Some(text.to_owned())
    }

    /// Replaces the text of the embedded `<style>` element, creating
    /// `<style type="text/css">` as the first child of `<svg>` when missing.
    pub fn set_style_text(&mut self, css: &str) {
        let style = match self.style_element() {
            Some(style) => style,
            None => {
                let style = dom_tree::new_element("style");
                if let Some(elem) = style.borrow_mut().as_element_mut() {
                    elem.set_attribute("type", "text/css");
                }
                dom_tree::insert_child(&self.svg, 0, Rc::clone(&style));
                style
            }
        };
        let old: Vec<NodeRef> = style.borrow().children().to_vec();
        for child in &old {
            dom_tree::remove_child(&style, child);
        }
        dom_tree::append_child(&style, dom_tree::new_text(css));
    }

    /// Serializes the `<svg>` element.
    pub fn to_markup(&self) -> String {
        to_markup(&self.svg)
    }

    /// Guids of every `g.IfcSpace` carrying an `ifc:guid`, in document order.
    pub fn space_guids(&self) -> Vec<String> {
        dom_tree::find_all(&self.svg, |e| e.is("g") && e.has_class(SPACE_CLASS))
            .iter()
            .filter_map(|node| {
                node.borrow()
                    .as_element()
                    .and_then(|e| e.attribute(GUID_ATTRIBUTE))
                    .map(str::to_owned)
            })
            .collect()
    }

    /// The outline of the symbol definition `<g id>`.
    pub fn symbol_shape(&self, id: &str) -> Option<SymbolShape> {
        let group = self.find_by_id(id)?;
        if !group.borrow().as_element().is_some_and(|e| e.is("g")) {
            return None;
        }
        let children = dom_tree::element_children(&group)
            .iter()
            .filter_map(|child| match &*child.borrow() {
                Node::Element(elem) => Some(elem.tag.to_ascii_lowercase()),
                _ => None,
            })
            .collect();
        Some(SymbolShape::new(id, children))
    }
}

impl DefsHost for SvgDocument {
    fn has_definition(&self, id: &str) -> bool {
        self.first_defs()
            .is_some_and(|defs| dom_tree::find_first(&defs, |e| e.id() == Some(id)).is_some())
    }

    fn insert_definition(&mut self, markup: &str) {
        let defs = self.defs();
        for node in parse_fragment(markup) {
            dom_tree::append_child(&defs, node);
        }
    }
}
