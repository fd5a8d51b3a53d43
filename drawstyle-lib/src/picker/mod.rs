//! Element classifier: turns a clicked drawing element into the selectors that
//! should govern it.
//!
//! The style precedence encoded here is
//! predefined type > layer material > surface material > material > surface.

pub mod element;

use log::debug;

pub use element::{DomElement, ElementView};

/// Why a click was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Inside an `.IfcSpace` region; spaces are styled from the default-rule bar.
    Space,
    Projection,
    /// A `.cut` region without a resolved material.
    GenericCut,
}

/// How a located rule is turned into a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Plain text: any hit in the priority list binds to that rule.
    PlainText,
    /// Shapes and typed text: only a perfect match binds.
    Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ignored(IgnoreReason),
    /// A symbol instance; `id` is the referenced definition.
    Symbol { id: String },
    /// Text without classes, styled by the default text rule.
    DefaultText,
    /// Nothing resolvable was hit (e.g. the empty canvas).
    NoSelector,
    Candidates {
        ideal: String,
        priority: Vec<String>,
        kind: CandidateKind,
    },
}

const TEXT_LEADER: &str = "PredefinedType-TEXTLEADER";
const BASE_TEXT: &str = "PredefinedType-TEXT";

fn has_predefined_type(classes: &[String]) -> bool {
    classes.iter().any(|c| c.starts_with("PredefinedType-"))
}

fn is_meaningful(class: &str) -> bool {
    class.starts_with("material-")
        || class.starts_with("Ifc")
        || class.contains("surface")
        || class.contains("cut")
        || class.starts_with("layer-material-")
        || class.starts_with("PredefinedType-")
}

fn with_prefix<'a>(classes: &'a [String], prefix: &str) -> Vec<&'a str> {
    classes
        .iter()
        .filter(|c| c.starts_with(prefix))
        .map(String::as_str)
        .collect()
}

/// First ancestor (inclusive) below the drawing root carrying a meaningful class,
/// or the clicked element itself when there is none.
fn find_target<E: ElementView>(clicked: &E) -> E {
    let mut current = Some(clicked.clone());
    while let Some(element) = current {
        if element.is_drawing_root() {
            break;
        }
        if element.classes().iter().any(|c| is_meaningful(c)) {
            return element;
        }
        current = element.parent_element();
    }
    clicked.clone()
}

/// Classifies a clicked element.
///
/// # Arguments
///
/// * `clicked` - The element the click landed on.
///
/// # Returns
///
/// The terminal [`Classification`]; candidate selectors still have to be
/// resolved against the current index.
pub fn classify<E: ElementView>(clicked: &E) -> Classification {
    if clicked.closest(|e| e.has_class("IfcSpace")).is_some() {
        debug!("ignored click inside an IfcSpace");
        return Classification::Ignored(IgnoreReason::Space);
    }
    if let Some(symbol_use) = clicked.closest(|e| e.tag_name() == "use") {
        let href = symbol_use
            .attribute("href")
            .or_else(|| symbol_use.attribute("xlink:href"))
            .unwrap_or_default();
        let id = href.strip_prefix('#').unwrap_or(&href).to_owned();
        debug!("clicked symbol instance `{id}`");
        return Classification::Symbol { id };
    }

    let classes = clicked.classes();
    if clicked.is_text_like() && !has_predefined_type(&classes) {
        return classify_plain_text(&classes);
    }
    classify_shape(clicked)
}

fn classify_plain_text(classes: &[String]) -> Classification {
    let Some(first) = classes.first() else {
        debug!("text without classes uses the default text rule");
        return Classification::DefaultText;
    };
    let primary = classes
        .iter()
        .find(|c| *c != "annotation" && !c.starts_with("Ifc") && !c.starts_with("GlobalId-"))
        .unwrap_or(first);
    Classification::Candidates {
        ideal: format!("text.{primary}, tspan.{primary}"),
        priority: vec![format!("tspan.{primary}"), format!("text.{primary}")],
        kind: CandidateKind::PlainText,
    }
}

fn classify_shape<E: ElementView>(clicked: &E) -> Classification {
    let target = find_target(clicked);
    let classes = target.classes();
    let parent_classes = target
        .parent_element()
        .map(|p| p.classes())
        .unwrap_or_default();

    if classes.iter().any(|c| c == "projection") {
        debug!("ignored click on a projection element");
        return Classification::Ignored(IgnoreReason::Projection);
    }
    let is_cut = classes.iter().any(|c| c == "cut");
    let is_surface = classes.iter().any(|c| c == "surface");
    let materials = with_prefix(&classes, "material-");
    if is_cut && materials.is_empty() {
        debug!("ignored click on a cut element without material");
        return Classification::Ignored(IgnoreReason::GenericCut);
    }
    let layer_materials = with_prefix(&classes, "layer-material-");
    let parent_layer_materials = with_prefix(&parent_classes, "layer-material-");
    let predefined = classes.iter().find(|c| c.starts_with("PredefinedType-"));

    let (ideal, priority) = if let Some(predefined) = predefined {
        predefined_type_selectors(predefined, &classes, target.is_text_like())
    } else if let Some(layer) = layer_materials.first() {
        let ideal = format!(".{layer}");
        (ideal.clone(), vec![ideal])
    } else if let Some(layer) = parent_layer_materials.first() {
        let ideal = format!(".{layer}");
        (ideal.clone(), vec![ideal])
    } else if is_surface && !materials.is_empty() {
        let ideal = format!(".surface.{}", materials[0]);
        (ideal.clone(), vec![ideal, ".surface".to_owned()])
    } else if !materials.is_empty() && !is_compound_material(&classes) {
        let ideal = format!(".{}", materials[0]);
        let name = &materials[0]["material-".len()..];
        (ideal.clone(), vec![ideal, format!(".layer-material-{name}")])
    } else if is_surface {
        (".surface".to_owned(), vec![".surface".to_owned()])
    } else {
        debug!("no selector derivable for clicked element");
        return Classification::NoSelector;
    };

    debug!("ideal selector `{ideal}`, search priority {priority:?}");
    Classification::Candidates {
        ideal,
        priority,
        kind: CandidateKind::Shape,
    }
}

/// Any `layer-material-*` class on the element makes its material compound,
/// whatever material family it names.
fn is_compound_material(classes: &[String]) -> bool {
    classes.iter().any(|c| c.starts_with("layer-material-"))
}

fn predefined_type_selectors(
    predefined: &str,
    classes: &[String],
    text_like: bool,
) -> (String, Vec<String>) {
    if predefined == TEXT_LEADER {
        return if text_like {
            (
                format!("text.{TEXT_LEADER}, tspan.{TEXT_LEADER}"),
                vec![format!("tspan.{TEXT_LEADER}"), format!("text.{TEXT_LEADER}")],
            )
        } else {
            let ideal = format!("path.{TEXT_LEADER}");
            (ideal.clone(), vec![ideal])
        };
    }

    let mut modifiers: Vec<&str> = classes
        .iter()
        .map(String::as_str)
        .filter(|c| {
            !c.starts_with("Ifc")
                && !c.starts_with("GlobalId-")
                && !c.starts_with("PredefinedType-")
                && *c != "cut"
                && *c != "surface"
        })
        .collect();
    modifiers.sort_unstable();

    let base_text = text_like && predefined == BASE_TEXT && modifiers.is_empty();
    let (base, mut ideal) = if base_text {
        (
            format!("tspan.{BASE_TEXT}"),
            format!("text.{BASE_TEXT}, tspan.{BASE_TEXT}"),
        )
    } else {
        let base = format!(".{predefined}");
        (base.clone(), base)
    };

    // Most specific first, dropping trailing modifiers one at a time.
    let mut priority = Vec::new();
    for keep in (0..=modifiers.len()).rev() {
        let mut selector = base.clone();
        for modifier in &modifiers[..keep] {
            selector.push('.');
            selector.push_str(modifier);
        }
        if keep == modifiers.len() && keep > 0 {
            ideal = selector.clone();
        }
        if !priority.contains(&selector) {
            priority.push(selector);
        }
    }
    if base_text {
        for fallback in [
            format!("tspan.{BASE_TEXT}"),
            format!("text.{BASE_TEXT}"),
            format!(".{BASE_TEXT}"),
        ] {
            if !priority.contains(&fallback) {
                priority.push(fallback);
            }
        }
    }
    (ideal, priority)
}

#[cfg(test)]
mod tests {
    use super::element::fake::FakeElement;
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidates(classification: Classification) -> (String, Vec<String>, CandidateKind) {
        match classification {
            Classification::Candidates {
                ideal,
                priority,
                kind,
            } => (ideal, priority, kind),
            other => panic!("expected candidates, got {other:?}"),
        }
    }

    #[test]
    fn test_space_and_symbol_short_circuit() {
        let space = FakeElement::new("g", &["IfcSpace"]).child("path", &["material-brick"]);
        assert_eq!(classify(&space), Classification::Ignored(IgnoreReason::Space));

        let symbol = FakeElement::new("use", &[]).with_attribute("xlink:href", "#level-tag");
        assert_eq!(
            classify(&symbol.child("path", &[])),
            Classification::Symbol {
                id: "level-tag".to_owned()
            }
        );
        let symbol = FakeElement::new("use", &[]).with_attribute("href", "#north-arrow");
        assert_eq!(
            classify(&symbol),
            Classification::Symbol {
                id: "north-arrow".to_owned()
            }
        );
    }

    #[test]
    fn test_plain_text_primary_class() {
        assert_eq!(classify(&FakeElement::new("text", &[])), Classification::DefaultText);

        let (ideal, priority, kind) = candidates(classify(&FakeElement::new(
            "tspan",
            &["annotation", "IfcAnnotation", "GlobalId-12", "Room"],
        )));
        assert_eq!(ideal, "text.Room, tspan.Room");
        assert_eq!(priority, vec!["tspan.Room", "text.Room"]);
        assert_eq!(kind, CandidateKind::PlainText);

        let (ideal, _, _) = candidates(classify(&FakeElement::new("text", &["IfcDoor"])));
        assert_eq!(ideal, "text.IfcDoor, tspan.IfcDoor");
    }

    #[test]
    fn test_projection_and_generic_cut_are_ignored() {
        let projection = FakeElement::new("path", &["projection", "material-brick"]);
        assert_eq!(
            classify(&projection),
            Classification::Ignored(IgnoreReason::Projection)
        );
        let cut = FakeElement::new("g", &["IfcWall", "cut"]).child("path", &[]);
        assert_eq!(classify(&cut), Classification::Ignored(IgnoreReason::GenericCut));
    }

    #[test]
    fn test_compound_material_goes_to_layer_branch() {
        let (ideal, priority, _) = candidates(classify(&FakeElement::new(
            "path",
            &["material-wood", "layer-material-wood-a"],
        )));
        assert_eq!(ideal, ".layer-material-wood-a");
        assert_eq!(priority, vec![".layer-material-wood-a"]);
    }

    #[test]
    fn test_compound_detection_ignores_material_family() {
        // The layer class need not belong to the same material.
        let (ideal, _, _) = candidates(classify(&FakeElement::new(
            "path",
            &["material-wood", "layer-material-steel"],
        )));
        assert_eq!(ideal, ".layer-material-steel");
    }

    #[test]
    fn test_parent_layer_material() {
        let layer = FakeElement::new("g", &["layer-material-insulation"]);
        let clicked = layer.child("path", &["IfcWallStandardCase", "material-insulation"]);
        let (ideal, _, _) = candidates(classify(&clicked));
        assert_eq!(ideal, ".layer-material-insulation");
    }

    #[test]
    fn test_surface_and_material_branches() {
        let (ideal, priority, _) = candidates(classify(&FakeElement::new(
            "path",
            &["surface", "material-concrete"],
        )));
        assert_eq!(ideal, ".surface.material-concrete");
        assert_eq!(priority, vec![".surface.material-concrete", ".surface"]);

        let wall = FakeElement::new("g", &["IfcWall", "cut", "material-brick"]);
        let (ideal, priority, _) = candidates(classify(&wall.child("path", &[])));
        assert_eq!(ideal, ".material-brick");
        assert_eq!(priority, vec![".material-brick", ".layer-material-brick"]);

        let (ideal, _, _) = candidates(classify(&FakeElement::new("path", &["surface"])));
        assert_eq!(ideal, ".surface");
    }

    #[test]
    fn test_no_selector() {
        assert_eq!(
            classify(&FakeElement::new("path", &["IfcSlab"])),
            Classification::NoSelector
        );
        assert_eq!(classify(&FakeElement::root()), Classification::NoSelector);
    }

    #[test]
    fn test_base_text_predefined_type_on_tspan() {
        let (ideal, priority, kind) =
            candidates(classify(&FakeElement::new("tspan", &["PredefinedType-TEXT"])));
        assert_eq!(ideal, "text.PredefinedType-TEXT, tspan.PredefinedType-TEXT");
        assert_eq!(
            priority,
            vec![
                "tspan.PredefinedType-TEXT",
                "text.PredefinedType-TEXT",
                ".PredefinedType-TEXT"
            ]
        );
        assert_eq!(kind, CandidateKind::Shape);
    }

    #[test]
    fn test_predefined_type_modifiers_drop_from_the_end() {
        let (ideal, priority, _) = candidates(classify(&FakeElement::new(
            "path",
            &["IfcAnnotation", "PredefinedType-LINEWORK", "thick", "dashed", "surface"],
        )));
        assert_eq!(ideal, ".PredefinedType-LINEWORK.dashed.thick");
        assert_eq!(
            priority,
            vec![
                ".PredefinedType-LINEWORK.dashed.thick",
                ".PredefinedType-LINEWORK.dashed",
                ".PredefinedType-LINEWORK"
            ]
        );

        let (ideal, priority, _) = candidates(classify(&FakeElement::new(
            "text",
            &["PredefinedType-TEXT", "title"],
        )));
        assert_eq!(ideal, ".PredefinedType-TEXT.title");
        assert_eq!(priority, vec![".PredefinedType-TEXT.title", ".PredefinedType-TEXT"]);
    }

    #[test]
    fn test_text_leader() {
        let (ideal, priority, _) =
            candidates(classify(&FakeElement::new("path", &["PredefinedType-TEXTLEADER"])));
        assert_eq!(ideal, "path.PredefinedType-TEXTLEADER");
        assert_eq!(priority, vec!["path.PredefinedType-TEXTLEADER"]);

        let (ideal, priority, _) =
            candidates(classify(&FakeElement::new("text", &["PredefinedType-TEXTLEADER"])));
        assert_eq!(
            ideal,
            "text.PredefinedType-TEXTLEADER, tspan.PredefinedType-TEXTLEADER"
        );
        assert_eq!(
            priority,
            vec!["tspan.PredefinedType-TEXTLEADER", "text.PredefinedType-TEXTLEADER"]
        );
    }
}
