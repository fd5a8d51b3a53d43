//! Rules every drawing stylesheet is expected to carry.

use std::rc::Rc;

use log::{debug, warn};

use crate::editor::controls::EditValues;
use crate::editor::session::{EditorMode, EditorSession};
use crate::style::selector_index::SelectorIndex;
use crate::style::stylesheet::RuleHandle;

pub const SPACE_SELECTOR: &str = ".IfcSpace";

/// Selectors that can be bound directly, without clicking an element.
pub const DEFAULT_SELECTORS: &[&str] = &[
    ".cut",
    ".projection",
    ".surface",
    ".annotation",
    ".IfcAnnotation",
    ".PredefinedType-TEXT",
    ".IfcGeographicElement",
    SPACE_SELECTOR,
];

/// The default selectors present in `index`, in allow-list order.
pub fn available_default_rules(index: &SelectorIndex) -> Vec<&'static str> {
    DEFAULT_SELECTORS
        .iter()
        .copied()
        .filter(|selector| index.contains(selector))
        .collect()
}

impl EditorSession {
    /// Binds the selection to one of the default rules.
    ///
    /// # Returns
    ///
    /// The bound rule, or `None` when `selector` is not on the allow-list or
    /// has no rule in the current stylesheet.
    pub fn select_default_rule(&mut self, selector: &str) -> Option<RuleHandle> {
        if !DEFAULT_SELECTORS.contains(&selector) {
            warn!("`{selector}` is not a default rule");
            return None;
        }
        self.switch_mode(EditorMode::Css);
        let rule = self.model().lookup(selector)?;
        debug!("default rule `{selector}` selected");
        let values = EditValues::from_rule(&rule.borrow());
        self.bind(Rc::clone(&rule), values);
        Some(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::model::StyleModel;
    use crate::style::stylesheet::Stylesheet;
    use pretty_assertions::assert_eq;

    const SHEET: &str = "/* --- DEFAULT --- */\n\
                         .surface { fill: #eeeeee; }\n\
                         .cut, .IfcSpace { stroke: black; stroke-width: 0.35; }\n\
                         .hatch { fill: none; }\n";

    #[test]
    fn test_available_rules_keep_list_order() {
        let index = SelectorIndex::build(&Stylesheet::parse(SHEET));
        assert_eq!(available_default_rules(&index), vec![".cut", ".surface", ".IfcSpace"]);
    }

    #[test]
    fn test_select_default_rule_binds() {
        let mut session = EditorSession::new(StyleModel::new(SHEET));
        let rule = session.select_default_rule(".cut").unwrap();
        assert_eq!(rule.borrow().selector(), ".cut, .IfcSpace");
        assert!(session.selection().rule().is_some());
        assert_eq!(session.values().stroke_width.as_deref(), Some("0.35"));

        assert!(session.select_default_rule(".hatch").is_none());
        assert!(session.select_default_rule(".projection").is_none());
        // A refused selection leaves the previous one in place.
        assert!(session.selection().rule().is_some());
    }
}
