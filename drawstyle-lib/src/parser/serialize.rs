//! Writes the drawing tree back out as SVG markup.

use crate::dom::dom_tree::{Node, NodeRef};

/// Elements whose text is emitted inside a CDATA section.
const CDATA_ELEMENTS: &[&str] = &["style", "script"];

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

fn write_cdata(out: &mut String, text: &str) {
    out.push_str("<![CDATA[");
    // A literal `]]>` has to be split across two sections.
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}

/// Serializes `node` and its descendants.
///
/// # Arguments
///
/// * `node` - The node to write; a document root writes all of its children.
///
/// # Returns
///
/// XML markup. Childless elements are self-closing and the text of `<style>`
/// elements is wrapped in CDATA.
pub fn to_markup(node: &NodeRef) -> String {
    let mut out = String::new();
    write_node(&mut out, node, false);
    out
}

fn write_node(out: &mut String, node: &NodeRef, raw_text: bool) {
    match &*node.borrow() {
        Node::DocumentRoot(root) => {
            for child in &root.children {
                write_node(out, child, false);
            }
        }
        Node::Element(elem) => {
            out.push('<');
            out.push_str(&elem.tag);
            for (name, value) in &elem.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
            if elem.children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            let cdata = CDATA_ELEMENTS.iter().any(|t| elem.is(t));
            for child in &elem.children {
                write_node(out, child, cdata);
            }
            out.push_str("</");
            out.push_str(&elem.tag);
            out.push('>');
        }
        Node::Text(text) if raw_text => write_cdata(out, text),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
    }
}
