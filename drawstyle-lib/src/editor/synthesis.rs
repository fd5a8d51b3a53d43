//! Creation of new rules: the selector a pending rule is written under and the
//! place in the stylesheet it is filed into.

use log::{info, warn};

use crate::style::category::{category_for, Category};
use crate::style::stylesheet::{CssNode, Rule, Stylesheet};

const MATERIAL_PREFIX: &str = ".material-";
const LAYER_MATERIAL_PREFIX: &str = ".layer-material-";

/// Where a synthesized rule ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Filed at the end of the category's block.
    Category(Category),
    /// The category has no block comment; the rule was appended to the sheet.
    AppendedAtEnd(Category),
}

impl Insertion {
    pub fn category(self) -> Category {
        match self {
            Insertion::Category(category) | Insertion::AppendedAtEnd(category) => category,
        }
    }
}

/// The material name of a plain `.material-X` or `.layer-material-X` selector.
fn simple_material_name(selector: &str) -> Option<&str> {
    if selector.starts_with(MATERIAL_PREFIX) && !selector.contains(".surface") {
        Some(&selector[MATERIAL_PREFIX.len()..])
    } else {
        selector.strip_prefix(LAYER_MATERIAL_PREFIX)
    }
}

/// The selector a pending new rule is created under.
///
/// Plain material and layer-material selectors are widened to the grouped
/// `.material-X, .layer-material-X` form so that both representations of a
/// material share one rule. Text selectors, id selectors and every other
/// class selector are kept as they are.
pub fn final_selector(pending: &str) -> String {
    let pending = pending.trim();
    if pending.contains("text.") || pending.contains("tspan.") || pending.starts_with('#') {
        return pending.to_owned();
    }
    match simple_material_name(pending) {
        Some(name) => format!("{MATERIAL_PREFIX}{name}, {LAYER_MATERIAL_PREFIX}{name}"),
        None => pending.to_owned(),
    }
}

/// Human readable name of a pending selector, as offered before the rule exists.
pub fn display_label(ideal: &str) -> String {
    match simple_material_name(ideal) {
        Some(name) => format!("{MATERIAL_PREFIX}{name} & {LAYER_MATERIAL_PREFIX}{name}"),
        None => ideal.to_owned(),
    }
}

/// Position after the last rule of the block opened by `label`, or after the
/// block comment when the block holds no rules yet.
fn block_insertion_point(sheet: &Stylesheet, label: &str) -> Option<usize> {
    let nodes = sheet.nodes();
    let start = nodes.iter().position(|node| match node {
        CssNode::Comment(comment) => comment.block_label() == Some(label),
        _ => false,
    })?;
    let mut last_rule = None;
    for (offset, node) in nodes[start + 1..].iter().enumerate() {
        if node.is_comment() {
            break;
        }
        if node.as_rule().is_some() {
            last_rule = Some(start + 1 + offset);
        }
    }
    Some(last_rule.unwrap_or(start) + 1)
}

/// Files `rule` into the block of its category.
///
/// # Arguments
///
/// * `sheet` - The stylesheet to insert into. Only top-level nodes are considered.
/// * `rule` - The new rule. Its first selector decides the category.
///
/// # Returns
///
/// An [`Insertion`] telling whether the block was found. A missing block is
/// not an error: the rule is appended to the end of the sheet.
pub fn insert_rule_in_category(sheet: &mut Stylesheet, mut rule: Rule) -> Insertion {
    let category = category_for(&rule.selector());
    let label = category.label();
    rule.before = "\n".to_owned();

    match block_insertion_point(sheet, label) {
        Some(index) => {
            rule.set_block(Some(label.to_owned()));
            info!("inserting `{}` into block `{}`", rule.selector(), label);
            sheet.insert(index, CssNode::Rule(rule.into_handle()));
            Insertion::Category(category)
        }
        None => {
            warn!(
                "no `--- {} ---` block found, appending `{}` at the end",
                label,
                rule.selector()
            );
            rule.set_block(None);
            sheet.push(CssNode::Rule(rule.into_handle()));
            Insertion::AppendedAtEnd(category)
        }
    }
}
