//! Maps selectors to the comment-delimited category blocks of the stylesheet.

use std::fmt;

/// The named blocks a stylesheet is organized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    IfcSpace,
    Markers,
    Symbol,
    Pattern,
    GenericDefaultText,
    TextTspan,
    PredefinedText,
    PredefinedLinework,
    PredefinedMaterials,
    PredefinedAnnotations,
    Material,
    EpSet,
    Default,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::IfcSpace,
        Category::Markers,
        Category::Symbol,
        Category::Pattern,
        Category::GenericDefaultText,
        Category::TextTspan,
        Category::PredefinedText,
        Category::PredefinedLinework,
        Category::PredefinedMaterials,
        Category::PredefinedAnnotations,
        Category::Material,
        Category::EpSet,
        Category::Default,
    ];

    /// The label used in the block's `--- LABEL ---` comment.
    pub fn label(self) -> &'static str {
        match self {
            Category::IfcSpace => "IFCSPACE STYLES",
            Category::Markers => "MARKERS STYLES",
            Category::Symbol => "SYMBOL STYLES",
            Category::Pattern => "PATTERN STYLES",
            Category::GenericDefaultText => "GENERIC DEFAULT TEXT TSPAN STYLES",
            Category::TextTspan => "TEXT TSPAN STYLES",
            Category::PredefinedText => "PREDEFINED TYPES - TEXT STYLES",
            Category::PredefinedLinework => "PREDEFINED TYPES - LINEWORK STYLES",
            Category::PredefinedMaterials => "PREDEFINED TYPES - MATERIALS STYLES",
            Category::PredefinedAnnotations => "PREDEFINED TYPES - ANNOTATIONS STYLES",
            Category::Material => "MATERIAL & LAYER & SURFACE MATERIAL STYLES",
            Category::EpSet => "EPSet STYLES",
            Category::Default => "DEFAULT",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Category::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const SYMBOL_ID_MARKERS: &[&str] = &["-tag", "-arrow", "-point", "dot", "elevation"];
const GENERIC_TEXT_CLASSES: &[&str] = &[".title", ".header", ".large", ".regular", ".small"];

fn is_ifc_space(s: &str) -> bool {
    s.starts_with("g[ifc\\:guid")
}

fn is_marker_id(s: &str) -> bool {
    s.starts_with('#') && s.contains("-marker")
}

fn is_symbol_id(s: &str) -> bool {
    s.starts_with('#') && SYMBOL_ID_MARKERS.iter().any(|m| s.contains(m))
}

fn is_pattern_id(s: &str) -> bool {
    s.starts_with('#')
}

fn is_text_selector(s: &str) -> bool {
    s.starts_with("text.") || s.starts_with("tspan.")
}

fn is_generic_text(s: &str) -> bool {
    is_text_selector(s) && GENERIC_TEXT_CLASSES.iter().any(|c| s.contains(c))
}

fn is_predefined_type(s: &str) -> bool {
    s.starts_with(".PredefinedType-")
}

fn is_predefined_text(s: &str) -> bool {
    is_predefined_type(s) && s.contains("-TEXT")
}

fn is_predefined_linework(s: &str) -> bool {
    is_predefined_type(s) && s.contains("-LINEWORK")
}

fn is_predefined_material(s: &str) -> bool {
    is_predefined_type(s) && s.contains("-MATERIAL")
}

fn is_material(s: &str) -> bool {
    s.contains(".material-") || s.contains(".layer-material-")
}

fn is_epset(s: &str) -> bool {
    s.starts_with(".EPsetStatusStatus-")
}

/// Ordered decision table. The first predicate that holds picks the category.
static CATEGORY_TABLE: &[(fn(&str) -> bool, Category)] = &[
    (is_ifc_space, Category::IfcSpace),
    (is_marker_id, Category::Markers),
    (is_symbol_id, Category::Symbol),
    (is_pattern_id, Category::Pattern),
    (is_generic_text, Category::GenericDefaultText),
    (is_text_selector, Category::TextTspan),
    (is_predefined_text, Category::PredefinedText),
    (is_predefined_linework, Category::PredefinedLinework),
    (is_predefined_material, Category::PredefinedMaterials),
    (is_predefined_type, Category::PredefinedAnnotations),
    (is_material, Category::Material),
    (is_epset, Category::EpSet),
];

/// Classifies a selector (or selector list) into its category block.
///
/// Only the first comma separated component is looked at.
///
/// # Arguments
///
/// * `selector` - A selector or comma separated selector list.
///
/// # Returns
///
/// The category whose block a rule with this selector belongs to.
pub fn category_for(selector: &str) -> Category {
    let first = selector.split(',').next().unwrap_or_default().trim();
    CATEGORY_TABLE
        .iter()
        .find(|(predicate, _)| predicate(first))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_examples_per_category() {
        let cases = [
            ("g[ifc\\:guid=\"0x1\"]", Category::IfcSpace),
            ("#section-marker", Category::Markers),
            ("#level-tag > path:nth-of-type(1)", Category::Symbol),
            ("#grid-dot", Category::Symbol),
            ("#elevation-symbol", Category::Symbol),
            ("#brick", Category::Pattern),
            ("text.title, tspan.title", Category::GenericDefaultText),
            ("text.Room", Category::TextTspan),
            ("tspan.IfcDoor", Category::TextTspan),
            (".PredefinedType-TEXT", Category::PredefinedText),
            (".PredefinedType-TEXTLEADER", Category::PredefinedText),
            (".PredefinedType-LINEWORK.dashed", Category::PredefinedLinework),
            (".PredefinedType-FILLAREA-MATERIAL", Category::PredefinedMaterials),
            (".PredefinedType-DIMENSION", Category::PredefinedAnnotations),
            (".material-brick, .layer-material-brick", Category::Material),
            (".surface.material-concrete", Category::Material),
            (".EPsetStatusStatus-NEW", Category::EpSet),
            (".cut", Category::Default),
            ("", Category::Default),
        ];
        for (selector, expected) in cases {
            assert_eq!(category_for(selector), expected, "selector {selector:?}");
        }
    }

    #[test]
    fn test_order_matters_for_overlapping_rules() {
        // A marker id that also looks like a symbol is still a marker.
        assert_eq!(category_for("#arrow-marker"), Category::Markers);
        // Text selectors win over material classes.
        assert_eq!(category_for("text.material-x"), Category::TextTspan);
    }

    #[test]
    fn test_only_first_component_counts() {
        assert_eq!(category_for(".cut, .material-brick"), Category::Default);
        assert_eq!(category_for(" .material-brick , .cut"), Category::Material);
    }

    #[test]
    fn test_label_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("Nope"), None);
    }
}
