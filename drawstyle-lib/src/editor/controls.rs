//! The edit surface: the values a user edits for one rule.
//!
//! Populating reads a rule's declarations into [`EditValues`]; committing turns
//! the values back into the declarations that replace the rule's body. A field
//! set to `None` is a hidden control and contributes nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::defs::extract_pattern_id;
use crate::style::stylesheet::{Declaration, Rule, Stylesheet};

pub const DEFAULT_SHAPE_FILL: &str = "#ffffff00";
pub const DEFAULT_STROKE: &str = "#000000";
pub const DEFAULT_STROKE_WIDTH: &str = "0.2";
pub const DEFAULT_TEXT_FILL: &str = "#000000";
pub const DEFAULT_FONT_FAMILY: &str = "OpenGost Type B TT";

/// Predefined types that never carry line-end markers.
const MARKERLESS_TYPES: &[&str] = &[
    "PredefinedType-BREAKLINE",
    "PredefinedType-SECTION",
    "PredefinedType-BOUNDARY",
    "PredefinedType-SEALANT",
    "PredefinedType-FILLAREA",
    "PredefinedType-IMAGE",
    "PredefinedType-LINEWORK",
];

static BASE_TEXT_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.PredefinedType-TEXT\b").expect("static regex"));
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("static regex")
});

/// Which group of controls is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Shape,
    Text,
    /// Sub-elements of a symbol definition.
    Symbol,
}

impl EditMode {
    /// Picks shape or text controls for a rule selector.
    pub fn for_selector(selector: &str) -> EditMode {
        let first = selector.split(',').next().unwrap_or_default().trim();
        let shape_prefixes = ["path.", "rect.", "circle.", "line.", "polygon."];
        if shape_prefixes.iter().any(|p| first.starts_with(p)) {
            EditMode::Shape
        } else if first.starts_with("text.") || first.starts_with("tspan.") {
            EditMode::Text
        } else if BASE_TEXT_CLASS.is_match(selector) {
            EditMode::Text
        } else {
            EditMode::Shape
        }
    }
}

/// A fill is either a colour or a reference to a pattern definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    Color(String),
    /// Pattern id, without the `url(#…)` wrapper.
    Pattern(String),
}

impl Fill {
    fn from_value(value: &str) -> Fill {
        if value.starts_with("url") {
            Fill::Pattern(extract_pattern_id(value).unwrap_or_default())
        } else {
            Fill::Color(value.to_owned())
        }
    }

    /// The declaration value, or `None` for an empty colour or pattern id.
    pub fn to_value(&self) -> Option<String> {
        match self {
            Fill::Color(color) if !color.is_empty() => Some(color.clone()),
            Fill::Pattern(id) if !id.is_empty() => Some(format!("url(#{id})")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditValues {
    pub mode: EditMode,
    pub fill: Option<Fill>,
    pub stroke: Option<String>,
    pub stroke_width: Option<String>,
    pub stroke_dasharray: Option<String>,
    pub marker_start: Option<String>,
    pub marker_end: Option<String>,
    pub font_size: Option<String>,
    pub font_family: Option<String>,
}

/// Numeric prefix of a CSS value (`"0.35mm"` gives `0.35`), formatted the
/// shortest way.
pub(crate) fn leading_number(value: &str) -> Option<String> {
    let found = LEADING_NUMBER.find(value)?;
    let number: f64 = found.as_str().trim().parse().ok()?;
    Some(number.to_string())
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    let value = value
        .strip_prefix('\'')
        .or_else(|| value.strip_prefix('"'))
        .unwrap_or(value);
    value
        .strip_suffix('\'')
        .or_else(|| value.strip_suffix('"'))
        .unwrap_or(value)
}

impl EditValues {
    fn hidden(mode: EditMode) -> Self {
        EditValues {
            mode,
            fill: None,
            stroke: None,
            stroke_width: None,
            stroke_dasharray: None,
            marker_start: None,
            marker_end: None,
            font_size: None,
            font_family: None,
        }
    }

    /// Controls for a rule that does not exist yet and has nothing to inherit.
    pub fn defaults_for(selector: &str) -> Self {
        EditValues::from_rule(&Rule::new(selector))
    }

    /// Reads a rule into the controls its selector calls for.
    ///
    /// # Arguments
    ///
    /// * `rule` - The bound rule, a fallback rule, or an empty rule for a new selector.
    ///
    /// # Returns
    ///
    /// Shape or text values. Declarations are read in order, so a repeated
    /// property ends up with its last value.
    pub fn from_rule(rule: &Rule) -> Self {
        let selector = rule.selector();
        match EditMode::for_selector(&selector) {
            EditMode::Text => Self::text_from_rule(rule),
            _ => Self::shape_from_rule(rule),
        }
    }

    fn text_from_rule(rule: &Rule) -> Self {
        let mut values = EditValues::hidden(EditMode::Text);
        values.fill = Some(Fill::Color(DEFAULT_TEXT_FILL.to_owned()));
        values.font_family = Some(DEFAULT_FONT_FAMILY.to_owned());
        for decl in rule.declarations() {
            let value = decl.value.trim();
            match decl.property.as_str() {
                "fill" => values.fill = Some(Fill::Color(value.to_owned())),
                "font-size" => {
                    values.font_size = Some(leading_number(value).unwrap_or_else(|| "0".to_owned()))
                }
                "font-family" => {
                    let primary = value.split(',').next().unwrap_or_default();
                    values.font_family = Some(unquote(primary).to_owned());
                }
                _ => {}
            }
        }
        values
    }

    fn shape_from_rule(rule: &Rule) -> Self {
        let mut values = EditValues::hidden(EditMode::Shape);
        let mut fill = Fill::Color(DEFAULT_SHAPE_FILL.to_owned());
        let mut fill_shown = false;
        let mut stroke = DEFAULT_STROKE.to_owned();
        let mut stroke_shown = false;
        let mut width = DEFAULT_STROKE_WIDTH.to_owned();
        let mut width_shown = false;

        for decl in rule.declarations() {
            let value = decl.value.trim();
            match decl.property.as_str() {
                "fill" => {
                    fill_shown = true;
                    fill = Fill::from_value(value);
                }
                "stroke" if !value.eq_ignore_ascii_case("none") => {
                    stroke_shown = true;
                    stroke = value.to_owned();
                }
                "stroke-width" if !value.eq_ignore_ascii_case("none") => {
                    width_shown = true;
                    if let Some(number) = leading_number(value) {
                        width = number;
                    }
                }
                "stroke-dasharray" => values.stroke_dasharray = Some(value.to_owned()),
                "marker-start" => values.marker_start = Some(value.to_owned()),
                "marker-end" => values.marker_end = Some(value.to_owned()),
                _ => {}
            }
        }

        if rule.declarations().is_empty() {
            fill_shown = true;
            stroke_shown = true;
            width_shown = true;
        }
        values.fill = fill_shown.then_some(fill);
        values.stroke = stroke_shown.then_some(stroke);
        values.stroke_width = width_shown.then_some(width);

        if let Some(first) = rule.first_selector() {
            if first.contains("PredefinedType-") && !MARKERLESS_TYPES.iter().any(|t| first.contains(t)) {
                values.marker_start.get_or_insert_with(String::new);
                values.marker_end.get_or_insert_with(String::new);
            }
        }
        values
    }

    /// Symbol controls, read from the rule of a symbol part when there is one.
    pub fn symbol_from_rule(rule: Option<&Rule>) -> Self {
        let mut values = EditValues::hidden(EditMode::Symbol);
        let fill = rule.and_then(|r| r.value_of("fill")).unwrap_or(DEFAULT_SHAPE_FILL);
        let stroke = rule.and_then(|r| r.value_of("stroke")).unwrap_or(DEFAULT_STROKE);
        let width = rule
            .and_then(|r| r.value_of("stroke-width"))
            .and_then(leading_number)
            .unwrap_or_else(|| DEFAULT_STROKE_WIDTH.to_owned());
        values.fill = Some(Fill::Color(fill.trim().to_owned()));
        values.stroke = Some(stroke.trim().to_owned());
        values.stroke_width = Some(width);
        values
    }

    /// Sets one control from a `property` / `value` pair, showing the control.
    ///
    /// Returns false for properties the edit surface has no control for.
    pub fn set(&mut self, property: &str, value: &str) -> bool {
        let value = value.trim().to_owned();
        match property {
            "fill" => self.fill = Some(Fill::from_value(&value)),
            "stroke" => self.stroke = Some(value),
            "stroke-width" => self.stroke_width = Some(value),
            "stroke-dasharray" => self.stroke_dasharray = Some(value),
            "marker-start" => self.marker_start = Some(value),
            "marker-end" => self.marker_end = Some(value),
            "font-size" => self.font_size = Some(leading_number(&value).unwrap_or(value)),
            "font-family" => self.font_family = Some(unquote(&value).to_owned()),
            _ => return false,
        }
        true
    }

    /// The pattern a shape fill refers to, if any.
    pub fn pattern_id(&self) -> Option<&str> {
        match &self.fill {
            Some(Fill::Pattern(id)) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    /// The declarations that replace a rule's body on commit.
    pub fn to_declarations(&self) -> Vec<Declaration> {
        let mut decls = Vec::new();
        let non_empty = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_owned);

        match self.mode {
            EditMode::Symbol => {
                if let Some(fill) = self.fill.as_ref().and_then(Fill::to_value) {
                    decls.push(Declaration::new("fill", fill));
                }
                if let Some(stroke) = non_empty(&self.stroke) {
                    decls.push(Declaration::new("stroke", stroke));
                }
                if let Some(width) = non_empty(&self.stroke_width) {
                    decls.push(Declaration::new("stroke-width", width));
                }
            }
            EditMode::Text => {
                if let Some(fill) = self.fill.as_ref().and_then(Fill::to_value) {
                    decls.push(Declaration::new("fill", fill));
                }
                if let Some(size) = non_empty(&self.font_size) {
                    decls.push(Declaration::new("font-size", format!("{size}px")));
                }
                if let Some(family) = non_empty(&self.font_family) {
                    decls.push(Declaration::new("font-family", format!("'{family}'")));
                }
                decls.push(Declaration::new("stroke", "none"));
            }
            EditMode::Shape => {
                if let Some(fill) = self.fill.as_ref().and_then(Fill::to_value) {
                    decls.push(Declaration::new("fill", fill));
                }
                if let Some(stroke) = &self.stroke {
                    decls.push(Declaration::new("stroke", stroke.clone()));
                }
                if let Some(width) = &self.stroke_width {
                    decls.push(Declaration::new("stroke-width", width.clone()));
                }
                if let Some(dasharray) = non_empty(&self.stroke_dasharray) {
                    decls.push(Declaration::new("stroke-dasharray", dasharray));
                }
                if let Some(start) = non_empty(&self.marker_start) {
                    decls.push(Declaration::new("marker-start", start));
                }
                if let Some(end) = non_empty(&self.marker_end) {
                    decls.push(Declaration::new("marker-end", end));
                }
            }
        }
        decls
    }
}

/// Font families offered for text rules: the `font-family` list of the rule
/// styling both `text` and `tspan`.
pub fn font_family_list(sheet: &Stylesheet) -> Vec<String> {
    let mut master = None;
    sheet.walk_rules(&mut |rule| {
        let rule = rule.borrow();
        if rule.has_selector("text") && rule.has_selector("tspan") {
            if let Some(value) = rule.value_of("font-family") {
                master = Some(value.to_owned());
            }
        }
    });
    master
        .map(|families| {
            families
                .split(',')
                .map(|f| unquote(f).to_owned())
                .filter(|f| !f.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rule(css: &str) -> Rule {
        let sheet = Stylesheet::parse(css);
        let rules = sheet.rules();
        let first = rules[0].borrow().clone();
        first
    }

    fn rendered(values: &EditValues) -> Vec<String> {
        values.to_declarations().iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_mode_for_selector() {
        assert_eq!(EditMode::for_selector("path.PredefinedType-TEXTLEADER"), EditMode::Shape);
        assert_eq!(EditMode::for_selector("text.title, tspan.title"), EditMode::Text);
        assert_eq!(EditMode::for_selector(".PredefinedType-TEXT.big"), EditMode::Text);
        assert_eq!(EditMode::for_selector(".PredefinedType-TEXTLEADER"), EditMode::Shape);
        assert_eq!(EditMode::for_selector(".material-brick"), EditMode::Shape);
    }

    #[test]
    fn test_shape_population_and_commit() {
        let values = EditValues::from_rule(&rule(
            ".material-brick { fill: url(#brick); stroke: #333; stroke-width: 0.35mm; stroke-dasharray: 2 1; }",
        ));
        assert_eq!(values.pattern_id(), Some("brick"));
        assert_eq!(values.stroke_width.as_deref(), Some("0.35"));
        assert_eq!(values.marker_start, None);
        assert_eq!(
            rendered(&values),
            vec![
                "fill: url(#brick)",
                "stroke: #333",
                "stroke-width: 0.35",
                "stroke-dasharray: 2 1"
            ]
        );
    }

    #[test]
    fn test_stroke_none_hides_stroke_controls() {
        let values = EditValues::from_rule(&rule(".surface { fill: #eee; stroke: none; }"));
        assert_eq!(values.stroke, None);
        assert_eq!(values.stroke_width, None);
        assert_eq!(rendered(&values), vec!["fill: #eee"]);
    }

    #[test]
    fn test_new_rule_defaults() {
        let values = EditValues::defaults_for(".material-X & .layer-material-X");
        assert_eq!(
            rendered(&values),
            vec!["fill: #ffffff00", "stroke: #000000", "stroke-width: 0.2"]
        );
    }

    #[test]
    fn test_marker_controls_for_predefined_types() {
        let values = EditValues::from_rule(&rule(".PredefinedType-DIMENSION { stroke: red; }"));
        assert_eq!(values.marker_start.as_deref(), Some(""));
        // Empty markers do not produce declarations.
        assert_eq!(rendered(&values), vec!["stroke: red"]);

        let values = EditValues::from_rule(&rule(".PredefinedType-SECTION { stroke: red; }"));
        assert_eq!(values.marker_start, None);
    }

    #[test]
    fn test_text_population_and_commit() {
        let values = EditValues::from_rule(&rule(
            "text.title, tspan.title { fill: #123456; font-size: 3.5px; font-family: 'Arial', sans-serif; }",
        ));
        assert_eq!(values.font_family.as_deref(), Some("Arial"));
        assert_eq!(
            rendered(&values),
            vec![
                "fill: #123456",
                "font-size: 3.5px",
                "font-family: 'Arial'",
                "stroke: none"
            ]
        );

        let defaults = EditValues::defaults_for("text.note, tspan.note");
        assert_eq!(
            rendered(&defaults),
            vec!["fill: #000000", "font-family: 'OpenGost Type B TT'", "stroke: none"]
        );
    }

    #[test]
    fn test_symbol_values() {
        let values = EditValues::symbol_from_rule(None);
        assert_eq!(
            rendered(&values),
            vec!["fill: #ffffff00", "stroke: #000000", "stroke-width: 0.2"]
        );
        let part = rule("#tag > path:nth-of-type(1) { stroke: blue; stroke-width: wide; }");
        let values = EditValues::symbol_from_rule(Some(&part));
        assert_eq!(values.stroke.as_deref(), Some("blue"));
        assert_eq!(values.stroke_width.as_deref(), Some("0.2"));
    }

    #[test]
    fn test_set_overrides_controls() {
        let mut values = EditValues::defaults_for(".surface");
        assert!(values.set("fill", "url(#hatch)"));
        assert!(values.set("marker-end", "url(#arrow-marker)"));
        assert!(!values.set("opacity", "0.5"));
        assert_eq!(
            rendered(&values),
            vec![
                "fill: url(#hatch)",
                "stroke: #000000",
                "stroke-width: 0.2",
                "marker-end: url(#arrow-marker)"
            ]
        );
    }

    #[test]
    fn test_font_family_list() {
        let sheet = Stylesheet::parse(
            "text, tspan { font-family: 'OpenGost Type B TT', \"Arial\", sans-serif; }\n.a { font-family: x; }",
        );
        assert_eq!(
            font_family_list(&sheet),
            vec!["OpenGost Type B TT", "Arial", "sans-serif"]
        );
        assert!(font_family_list(&Stylesheet::new()).is_empty());
    }
}
