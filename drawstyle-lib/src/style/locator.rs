//! Finds the rule that governs a set of candidate selectors.

use crate::style::selector_index::SelectorIndex;
use crate::style::stylesheet::{Rule, RuleHandle};

/// Outcome of resolving an ideal selector against the index.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The index is empty; the stylesheet did not load.
    NotLoaded,
    /// The located rule already carries every component of the ideal selector.
    Perfect(RuleHandle),
    /// A lower-priority rule was found. Its values are a starting point for a new rule.
    Fallback(RuleHandle),
    /// No candidate is present.
    Missing,
}

impl Resolution {
    pub fn rule(&self) -> Option<&RuleHandle> {
        match self {
            Resolution::Perfect(rule) | Resolution::Fallback(rule) => Some(rule),
            Resolution::NotLoaded | Resolution::Missing => None,
        }
    }

    pub fn is_perfect(&self) -> bool {
        matches!(self, Resolution::Perfect(_))
    }
}

/// Returns the rule bound to the first candidate present in the index.
///
/// Candidates after the first hit are never consulted.
pub fn locate<S: AsRef<str>>(index: &SelectorIndex, candidates: &[S]) -> Option<RuleHandle> {
    candidates
        .iter()
        .find_map(|candidate| index.get(candidate.as_ref()))
}

/// True when `rule` lists every comma component of `ideal` verbatim.
pub fn is_perfect_match(rule: &Rule, ideal: &str) -> bool {
    ideal
        .split(',')
        .map(str::trim)
        .all(|component| rule.selectors().iter().any(|s| s == component))
}

/// Resolves `ideal` through its search priority list.
///
/// # Arguments
///
/// * `index` - The current selector index.
/// * `ideal` - The selector that should govern the element.
/// * `priority` - Fallback candidates, most specific first.
///
/// # Returns
///
/// A [`Resolution`] the caller turns into a bound or pending selection.
pub fn resolve<S: AsRef<str>>(index: &SelectorIndex, ideal: &str, priority: &[S]) -> Resolution {
    if index.is_empty() {
        return Resolution::NotLoaded;
    }
    match locate(index, priority) {
        Some(rule) if is_perfect_match(&rule.borrow(), ideal) => Resolution::Perfect(rule),
        Some(rule) => Resolution::Fallback(rule),
        None => Resolution::Missing,
    }
}
