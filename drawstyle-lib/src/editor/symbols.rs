//! Styling the parts of a symbol definition.
//!
//! A symbol is a `<g id>` inside the drawing's `<defs>`. Each of its drawable
//! children gets its own rule, addressed as `#id > tag:nth-of-type(n)`.

use std::rc::Rc;

use log::{debug, info};

use crate::editor::controls::{EditMode, EditValues};
use crate::editor::session::{EditorMode, EditorSession};
use crate::editor::synthesis::insert_rule_in_category;
use crate::error::StyleError;
use crate::style::stylesheet::{Rule, RuleHandle, Stylesheet};

/// Child tags that can be styled individually.
pub const STYLEABLE_TAGS: &[&str] = &["path", "circle", "rect", "line", "polygon", "polyline", "text"];

fn is_styleable(tag: &str) -> bool {
    STYLEABLE_TAGS.contains(&tag)
}

/// The outline of a symbol definition: its id and the lowercase tags of its
/// element children, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolShape {
    pub id: String,
    pub children: Vec<String>,
}

pub fn sub_element_selector(symbol_id: &str, tag: &str, nth_of_type: usize) -> String {
    format!("#{symbol_id} > {tag}:nth-of-type({nth_of_type})")
}

impl SymbolShape {
    pub fn new(id: impl Into<String>, children: Vec<String>) -> Self {
        SymbolShape {
            id: id.into(),
            children,
        }
    }

    /// Styleable children as `(child index, tag)` pairs.
    pub fn styleable_parts(&self) -> Vec<(usize, &str)> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, tag)| is_styleable(tag))
            .map(|(index, tag)| (index, tag.as_str()))
            .collect()
    }

    /// Selector of the child at `index`, counting only earlier siblings of the same tag.
    pub fn part_selector(&self, index: usize) -> Option<String> {
        let tag = self.children.get(index)?;
        let same_tag_before = self.children[..index].iter().filter(|t| *t == tag).count();
        Some(sub_element_selector(&self.id, tag, same_tag_before + 1))
    }

    /// Selector of the first styleable child, the one whose rule stands for the
    /// whole symbol.
    pub fn first_part_selector(&self) -> Option<String> {
        self.children
            .iter()
            .find(|tag| is_styleable(tag))
            .map(|tag| sub_element_selector(&self.id, tag, 1))
    }
}

/// The last rule written for the whole symbol in the older single-rule form
/// (`#id` followed by whitespace).
pub fn legacy_symbol_rule(sheet: &Stylesheet, symbol_id: &str) -> Option<RuleHandle> {
    let mut found = None;
    sheet.walk_rules(&mut |rule| {
        let selector = rule.borrow().selector();
        let matches = selector
            .strip_prefix('#')
            .and_then(|rest| rest.strip_prefix(symbol_id))
            .is_some_and(|rest| rest.starts_with(char::is_whitespace));
        if matches {
            found = Some(Rc::clone(rule));
        }
    });
    found
}

fn part_values(rule: Option<&RuleHandle>) -> EditValues {
    let guard = rule.map(|r| r.borrow());
    EditValues::symbol_from_rule(guard.as_deref())
}

impl EditorSession {
    /// Switches to symbol editing and fills the symbol controls from the rule
    /// of the symbol's first styleable child.
    pub fn enter_symbol_mode(&mut self, shape: &SymbolShape) {
        self.clear_selection(&format!("Editing Symbol: #{}", shape.id));
        self.switch_mode(EditorMode::Symbol {
            id: shape.id.clone(),
        });
        let base = shape
            .first_part_selector()
            .and_then(|selector| self.model().lookup(&selector));
        *self.values_mut() = part_values(base.as_ref());
    }

    /// Selects the child at `index` of the symbol.
    ///
    /// An existing part rule is bound. Otherwise a new rule is pending, with
    /// values inherited from a legacy whole-symbol rule, else from the first
    /// child's rule, else the symbol defaults.
    ///
    /// # Returns
    ///
    /// The part selector, or `None` when `index` is out of range.
    pub fn select_symbol_part(&mut self, shape: &SymbolShape, index: usize) -> Option<String> {
        let selector = shape.part_selector(index)?;
        if self.mode() != &(EditorMode::Symbol { id: shape.id.clone() }) {
            self.switch_mode(EditorMode::Symbol {
                id: shape.id.clone(),
            });
        }

        if let Some(rule) = self.model().lookup(&selector) {
            let values = part_values(Some(&rule));
            self.bind(rule, values);
            return Some(selector);
        }

        let inherited = legacy_symbol_rule(self.sheet(), &shape.id).or_else(|| {
            shape
                .first_part_selector()
                .and_then(|first| self.model().lookup(&first))
        });
        if let Some(rule) = &inherited {
            debug!("part `{selector}` inherits from `{}`", rule.borrow().selector());
        }
        let values = part_values(inherited.as_ref());
        self.set_pending(selector.clone(), selector.clone(), values);
        Some(selector)
    }

    /// Replaces every part rule of the symbol with one rule per styleable child
    /// carrying `values`.
    ///
    /// # Returns
    ///
    /// The number of rules written.
    pub fn apply_symbol_style_to_all(
        &mut self,
        shape: &SymbolShape,
        values: &EditValues,
    ) -> Result<usize, StyleError> {
        if self.is_read_only() {
            return Err(StyleError::ReadOnly);
        }
        let mut symbol_values = values.clone();
        symbol_values.mode = EditMode::Symbol;
        let declarations = symbol_values.to_declarations();
        let prefix = format!("#{} >", shape.id);

        let mut rules = Vec::new();
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for (_, tag) in shape.styleable_parts() {
            let nth = match counts.iter_mut().find(|(t, _)| *t == tag) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    counts.push((tag, 1));
                    1
                }
            };
            let mut rule = Rule::new(&sub_element_selector(&shape.id, tag, nth));
            rule.replace_declarations(declarations.clone());
            rules.push(rule);
        }

        let written = rules.len();
        let removed = self.rewrite(|sheet| {
            let removed = sheet.remove_rules_where(&|rule: &Rule| rule.selector().starts_with(&prefix));
            for rule in rules {
                insert_rule_in_category(sheet, rule);
            }
            removed
        });
        info!(
            "symbol `{}`: replaced {removed} part rules with {written}",
            shape.id
        );
        *self.values_mut() = symbol_values;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::session::PendingSelection;
    use crate::style::model::StyleModel;
    use pretty_assertions::assert_eq;

    fn shape() -> SymbolShape {
        SymbolShape::new(
            "north-arrow",
            ["path", "title", "path", "circle", "text"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        )
    }

    fn session(css: &str) -> EditorSession {
        EditorSession::new(StyleModel::new(css))
    }

    #[test]
    fn test_part_selectors_count_same_tag_only() {
        let shape = shape();
        assert_eq!(
            shape.part_selector(2).as_deref(),
            Some("#north-arrow > path:nth-of-type(2)")
        );
        assert_eq!(
            shape.part_selector(3).as_deref(),
            Some("#north-arrow > circle:nth-of-type(1)")
        );
        assert_eq!(shape.part_selector(9), None);
        assert_eq!(shape.styleable_parts().len(), 4);
        assert_eq!(
            shape.first_part_selector().as_deref(),
            Some("#north-arrow > path:nth-of-type(1)")
        );
    }

    #[test]
    fn test_enter_symbol_mode_reads_first_part() {
        let mut session = session(
            "/* --- SYMBOL STYLES --- */\n#north-arrow > path:nth-of-type(1) { fill: red; stroke: blue; stroke-width: 0.5; }\n",
        );
        session.enter_symbol_mode(&shape());
        assert_eq!(session.mode(), &EditorMode::Symbol { id: "north-arrow".to_owned() });
        assert_eq!(session.values().stroke.as_deref(), Some("blue"));
        assert_eq!(session.values().stroke_width.as_deref(), Some("0.5"));

        let mut empty = self::session("/* --- SYMBOL STYLES --- */\n.x { fill: red; }\n");
        empty.enter_symbol_mode(&shape());
        assert_eq!(empty.values(), &EditValues::symbol_from_rule(None));
    }

    #[test]
    fn test_select_part_binds_or_inherits() {
        let css = "/* --- SYMBOL STYLES --- */\n\
                   #north-arrow > path:nth-of-type(1) { stroke: blue; }\n\
                   #north-arrow > circle:nth-of-type(1) { stroke: green; }\n";
        let mut session = session(css);

        session.select_symbol_part(&shape(), 3);
        assert!(session.selection().rule().is_some());
        assert_eq!(session.values().stroke.as_deref(), Some("green"));

        // The last `#north-arrow <ws>` rule is taken as the legacy rule.
        session.select_symbol_part(&shape(), 4);
        assert_eq!(
            session.selection().new_selector(),
            Some("#north-arrow > text:nth-of-type(1)")
        );
        assert_eq!(session.values().stroke.as_deref(), Some("green"));
    }

    #[test]
    fn test_legacy_rule_wins_over_first_part() {
        let css = "/* --- SYMBOL STYLES --- */\n\
                   #north-arrow > path:nth-of-type(1) { stroke: blue; }\n\
                   #north-arrow path { stroke: orange; }\n";
        let mut session = session(css);
        session.select_symbol_part(&shape(), 2);
        assert!(matches!(session.selection(), PendingSelection::New(_)));
        assert_eq!(session.values().stroke.as_deref(), Some("orange"));

        let mut bare = self::session("/* --- SYMBOL STYLES --- */\n");
        bare.select_symbol_part(&shape(), 2);
        assert_eq!(bare.values(), &EditValues::symbol_from_rule(None));
    }

    #[test]
    fn test_apply_to_all_rewrites_part_rules() {
        let css = "/* --- SYMBOL STYLES --- */\n\
                   #north-arrow > path:nth-of-type(1) { stroke: blue; }\n\
                   #north-arrow > line:nth-of-type(7) { stroke: grey; }\n\
                   #other-arrow > path:nth-of-type(1) { stroke: blue; }\n";
        let mut session = session(css);
        let mut values = EditValues::symbol_from_rule(None);
        values.set("stroke", "red");

        let written = session.apply_symbol_style_to_all(&shape(), &values).unwrap();
        assert_eq!(written, 4);

        let selectors: Vec<String> = session.sheet().rules().iter().map(|r| r.borrow().selector()).collect();
        assert_eq!(
            selectors,
            vec![
                "#other-arrow > path:nth-of-type(1)",
                "#north-arrow > path:nth-of-type(1)",
                "#north-arrow > path:nth-of-type(2)",
                "#north-arrow > circle:nth-of-type(1)",
                "#north-arrow > text:nth-of-type(1)",
            ]
        );
        let part = session.model().lookup("#north-arrow > circle:nth-of-type(1)").unwrap();
        assert_eq!(part.borrow().value_of("stroke"), Some("red"));
        assert_eq!(part.borrow().value_of("stroke-width"), Some("0.2"));
    }
}
