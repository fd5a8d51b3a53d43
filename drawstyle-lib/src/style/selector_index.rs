use std::collections::HashMap;
use std::rc::Rc;

use crate::style::stylesheet::{RuleHandle, Stylesheet};

/// Maps every individual selector of a stylesheet to the rule that owns it.
///
/// A rule written as `A, B { }` is reachable through both `A` and `B`, and both
/// entries share the same [`RuleHandle`]. When two rules carry the same
/// selector, the later one in document order owns the entry.
#[derive(Debug, Default)]
pub struct SelectorIndex {
    entries: HashMap<String, RuleHandle>,
}

impl SelectorIndex {
    /// Builds the index for the entire stylesheet, nested rules included.
    pub fn build(sheet: &Stylesheet) -> Self {
        let mut index = SelectorIndex::default();
        sheet.walk_rules(&mut |rule| {
            for selector in rule.borrow().selectors() {
                index.entries.insert(selector.clone(), Rc::clone(rule));
            }
        });
        index
    }

    pub fn get(&self, selector: &str) -> Option<RuleHandle> {
        self.entries.get(selector.trim()).cloned()
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.entries.contains_key(selector.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indexed selectors in sorted order.
    pub fn selectors(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
