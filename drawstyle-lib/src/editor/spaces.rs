//! Colour-coded rules for the `IfcSpace` groups of a drawing.

use log::{info, warn};

use crate::editor::controls::DEFAULT_STROKE_WIDTH;
use crate::editor::session::EditorSession;
use crate::editor::synthesis::insert_rule_in_category;
use crate::style::selector_index::SelectorIndex;
use crate::style::stylesheet::Rule;

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618033988749895;

pub fn space_selector(guid: &str) -> String {
    format!("g[ifc\\:guid=\"{guid}\"]")
}

/// Hue of the space at `index`. Consecutive spaces land far apart on the wheel.
pub fn space_hue(index: usize) -> f64 {
    (index as f64 * GOLDEN_RATIO_CONJUGATE * 360.0) % 360.0
}

/// Builds a rule for every space guid that has none yet.
///
/// # Arguments
///
/// * `index` - Selector index of the current stylesheet.
/// * `guids` - Guids of every space in document order. A space keeps its
///   position in the list, and so its hue, even when it is skipped.
///
/// # Returns
///
/// The new rules, in the order of `guids`.
pub fn space_rules(index: &SelectorIndex, guids: &[String]) -> Vec<Rule> {
    guids
        .iter()
        .enumerate()
        .filter(|(_, guid)| !guid.is_empty())
        .filter_map(|(position, guid)| {
            let selector = space_selector(guid);
            if index.contains(&selector) {
                return None;
            }
            let hue = space_hue(position);
            let mut rule = Rule::new(&selector);
            rule.append("fill", format!("hsl({hue}, 95%, 75%)"));
            rule.append("fill-opacity", "0.5");
            rule.append("stroke", format!("hsl({hue}, 95%, 40%)"));
            rule.append("stroke-width", DEFAULT_STROKE_WIDTH);
            rule.append("pointer-events", "none");
            Some(rule)
        })
        .collect()
}

impl EditorSession {
    /// Adds the missing space rules to the stylesheet in one commit.
    ///
    /// # Returns
    ///
    /// How many rules were added. Nothing is committed when that is zero.
    pub fn generate_space_rules(&mut self, guids: &[String]) -> usize {
        if self.is_read_only() {
            warn!("stylesheet is read-only, space rules were not generated");
            return 0;
        }
        let rules = space_rules(self.model().index(), guids);
        if rules.is_empty() {
            return 0;
        }
        let added = rules.len();
        self.rewrite(|sheet| {
            for rule in rules {
                insert_rule_in_category(sheet, rule);
            }
        });
        info!("generated {added} IfcSpace rules");
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::model::StyleModel;
    use crate::style::stylesheet::Stylesheet;
    use pretty_assertions::assert_eq;

    fn guids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_hues_follow_position() {
        assert_eq!(space_hue(0), 0.0);
        let second = space_hue(1);
        assert!((second - 222.4922359499622).abs() < 1e-9, "{second}");
        assert!(space_hue(7) < 360.0);
    }

    #[test]
    fn test_existing_and_empty_guids_are_skipped() {
        let sheet = Stylesheet::parse("g[ifc\\:guid=\"b\"] { fill: red; }\n");
        let index = SelectorIndex::build(&sheet);
        let rules = space_rules(&index, &guids(&["a", "b", "", "c"]));

        let selectors: Vec<String> = rules.iter().map(Rule::selector).collect();
        assert_eq!(selectors, vec!["g[ifc\\:guid=\"a\"]", "g[ifc\\:guid=\"c\"]"]);
        assert_eq!(rules[0].value_of("fill"), Some("hsl(0, 95%, 75%)"));
        let expected_stroke = format!("hsl({}, 95%, 40%)", space_hue(3));
        assert_eq!(rules[1].value_of("stroke"), Some(expected_stroke.as_str()));
        assert_eq!(rules[1].value_of("pointer-events"), Some("none"));
    }

    #[test]
    fn test_generation_commits_into_block_once() {
        let css = "/* --- IFCSPACE STYLES --- */\n/* --- DEFAULT --- */\n.cut { fill: none; }\n";
        let mut session = EditorSession::new(StyleModel::new(css));
        assert_eq!(session.generate_space_rules(&guids(&["a", "b"])), 2);
        assert!(session.model().lookup("g[ifc\\:guid=\"b\"]").is_some());
        let space_block = session.css().find("IFCSPACE").unwrap();
        let default_block = session.css().find("--- DEFAULT").unwrap();
        let rule_at = session.css().find("g[ifc").unwrap();
        assert!(space_block < rule_at && rule_at < default_block);

        // A second run finds nothing to add.
        assert_eq!(session.generate_space_rules(&guids(&["a", "b"])), 0);
    }

    #[test]
    fn test_read_only_session_generates_nothing() {
        let mut session = EditorSession::new(StyleModel::new("/* --- IFCSPACE STYLES --- */\n.x { fill: red; }\n"));
        session.set_read_only(true);
        assert_eq!(session.generate_space_rules(&guids(&["a"])), 0);
    }
}
