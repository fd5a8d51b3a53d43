use drawstyle_lib::dom::dom_tree::{self, Node, NodeRef};
use drawstyle_lib::parser::svg_tree::create_svg_tree;
use drawstyle_lib::picker::{classify, CandidateKind, Classification, ElementView, IgnoreReason};
use drawstyle_lib::svg::SvgDocument;
use pretty_assertions::assert_eq;

fn collect_structure(node: &NodeRef) -> String {
    let mut output = String::new();
    traverse_node(node, 0, &mut output);
    output
}

fn traverse_node(node: &NodeRef, depth: usize, output: &mut String) {
    match &*node.borrow() {
        Node::DocumentRoot(root) => {
            for child in &root.children {
                traverse_node(child, depth, output);
            }
        }
        Node::Element(elem) => {
            let classes = elem.classes();
            if classes.is_empty() {
                *output += &format!("{}<{}>\n", "  ".repeat(depth), elem.tag);
            } else {
                *output += &format!("{}<{} .{}>\n", "  ".repeat(depth), elem.tag, classes.join("."));
            }
            for child in &elem.children {
                traverse_node(child, depth + 1, output);
            }
        }
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                *output += &format!("{}{}\n", "  ".repeat(depth), trimmed);
            }
        }
        Node::Comment(_) | Node::ProcessingInstruction { .. } => {}
    }
}

fn classify_id(document: &SvgDocument, id: &str) -> Classification {
    let node = document.find_by_id(id).unwrap();
    classify(&document.element(&node).unwrap())
}

#[test]
fn test_svg_structure_keeps_case_and_cdata() {
    let markup = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg">
    <defs>
        <linearGradient id="fade"/>
    </defs>
    <style type="text/css"><![CDATA[
        .cut > path { fill: none; }
    ]]></style>
    <g class="IfcWall cut">
        <text class="PredefinedType-TEXT">A &amp; B</text>
    </g>
</svg>"#;
    let document = create_svg_tree(markup);
    let svg = dom_tree::find_first(&document.root, |e| e.is("svg")).unwrap();

    let expected = "<svg>\n  <defs>\n    <linearGradient>\n  <style>\n    .cut > path { fill: none; }\n  <g .IfcWall.cut>\n    <text .PredefinedType-TEXT>\n      A & B\n";
    assert_eq!(collect_structure(&svg), expected);
}

#[test]
fn test_classification_through_dom_adapter() {
    let document = SvgDocument::parse(
        r#"<svg>
    <g class="IfcWall material-concrete layer-material-plaster"><path id="layered"/></g>
    <g class="IfcSlab surface material-oak"><path id="surface"/></g>
    <g class="IfcSpace"><path id="space"/></g>
    <g class="IfcWall projection"><path id="projection"/></g>
    <text class="PredefinedType-TEXT"><tspan id="label">A</tspan></text>
    <text><tspan id="plain">B</tspan></text>
    <rect id="canvas"/>
</svg>"#,
    )
    .unwrap();

    // Any layer material makes the material compound, whatever family it names.
    assert_eq!(
        classify_id(&document, "layered"),
        Classification::Candidates {
            ideal: ".layer-material-plaster".to_owned(),
            priority: vec![".layer-material-plaster".to_owned()],
            kind: CandidateKind::Shape,
        }
    );
    assert!(matches!(
        classify_id(&document, "surface"),
        Classification::Candidates { ref ideal, .. } if ideal == ".surface.material-oak"
    ));
    assert_eq!(classify_id(&document, "space"), Classification::Ignored(IgnoreReason::Space));
    assert_eq!(
        classify_id(&document, "projection"),
        Classification::Ignored(IgnoreReason::Projection)
    );
    assert_eq!(classify_id(&document, "plain"), Classification::DefaultText);
    assert_eq!(classify_id(&document, "canvas"), Classification::NoSelector);

    let tspan = document.find_by_id("label").unwrap();
    let element = document.element(&tspan).unwrap();
    assert_eq!(element.tag_name(), "tspan");
    assert!(element.parent_element().unwrap().has_class("PredefinedType-TEXT"));
}
