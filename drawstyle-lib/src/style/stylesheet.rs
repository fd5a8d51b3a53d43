//! The in-memory stylesheet tree.
//!
//! A [`Stylesheet`] is an ordered list of top-level nodes (rules, comments and
//! at-rules). Comments of the form `--- NAME ---` split the sheet into the
//! category blocks that new rules are filed into. Every node remembers the
//! whitespace that preceded it, and parsed rules print their source text until
//! their declarations change, so saving keeps the hand-made layout of the file.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::style::css_parser;

/// Shared handle to a rule. Every selector of a rule resolves to the same handle.
pub type RuleHandle = Rc<RefCell<Rule>>;

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Declaration {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

/// A comment written between the declarations of a rule. It is printed in
/// front of the first declaration of `next_property`, or last in the block
/// when that property is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleComment {
    pub text: String,
    pub next_property: Option<String>,
}

/// A style rule: a selector list and its declarations.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    selectors: Vec<String>,
    declarations: Vec<Declaration>,
    comments: Vec<RuleComment>,
    /// Source text of a parsed rule, from the selector to the closing brace.
    /// Dropped as soon as the declarations change.
    raw: Option<String>,
    /// Label of the category block the rule lives in (or was inserted into).
    block: Option<String>,
    /// Raw whitespace preceding the rule.
    pub before: String,
}

impl Rule {
    /// Builds an empty rule from a comma separated selector list.
    pub fn new(selector: &str) -> Self {
        Rule {
            selectors: css_parser::split_selector_list(selector),
            ..Rule::default()
        }
    }

    pub fn with_selectors(selectors: Vec<String>) -> Self {
        Rule {
            selectors,
            ..Rule::default()
        }
    }

    /// The selector list joined the way it is written back to disk.
    pub fn selector(&self) -> String {
        self.selectors.join(", ")
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn first_selector(&self) -> Option<&str> {
        self.selectors.first().map(String::as_str)
    }

    pub fn has_selector(&self, selector: &str) -> bool {
        let wanted = selector.trim();
        self.selectors.iter().any(|s| s == wanted)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Value of the last declaration for `property`, like the cascade would pick.
    pub fn value_of(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.declarations.iter().any(|d| d.property == property)
    }

    pub fn append(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.push(Declaration::new(property, value));
    }

    pub fn push(&mut self, declaration: Declaration) {
        self.raw = None;
        self.declarations.push(declaration);
    }

    pub fn remove_all(&mut self) {
        self.raw = None;
        self.declarations.clear();
    }

    /// Drops every declaration and appends `declarations` in order. Comments
    /// of the rule stay where they were.
    pub fn replace_declarations(&mut self, declarations: Vec<Declaration>) {
        self.raw = None;
        self.declarations = declarations;
    }

    pub fn comments(&self) -> &[RuleComment] {
        &self.comments
    }

    pub(crate) fn set_source(&mut self, raw: String, comments: Vec<RuleComment>) {
        self.raw = Some(raw);
        self.comments = comments;
    }

    /// True while the rule still prints as it was read.
    pub fn is_verbatim(&self) -> bool {
        self.raw.is_some()
    }

    pub fn block(&self) -> Option<&str> {
        self.block.as_deref()
    }

    pub fn set_block(&mut self, block: Option<String>) {
        self.block = block;
    }

    pub fn into_handle(self) -> RuleHandle {
        Rc::new(RefCell::new(self))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return f.write_str(raw);
        }
        if self.declarations.is_empty() && self.comments.is_empty() {
            return write!(f, "{} {{}}", self.selector());
        }
        writeln!(f, "{} {{", self.selector())?;
        let mut printed = vec![false; self.comments.len()];
        for decl in &self.declarations {
            for (i, comment) in self.comments.iter().enumerate() {
                if !printed[i] && comment.next_property.as_deref() == Some(decl.property.as_str()) {
                    writeln!(f, "    /*{}*/", comment.text)?;
                    printed[i] = true;
                }
            }
            writeln!(f, "    {};", decl)?;
        }
        for (comment, _) in self.comments.iter().zip(&printed).filter(|(_, done)| !**done) {
            writeln!(f, "    /*{}*/", comment.text)?;
        }
        f.write_str("}")
    }
}

/// A `/* ... */` comment. `text` is the raw content between the delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub before: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Comment {
            text: text.into(),
            before: String::new(),
        }
    }

    /// The category label when the comment reads `--- LABEL ---`.
    pub fn block_label(&self) -> Option<&str> {
        let label = self
            .text
            .trim()
            .strip_prefix("---")?
            .strip_suffix("---")?
            .trim();
        if label.is_empty() {
            None
        } else {
            Some(label)
        }
    }
}

/// Content of an at-rule block.
#[derive(Debug)]
pub enum AtRuleBody {
    /// Grouping rules such as `@media` hold nested nodes.
    Nodes(Stylesheet),
    /// Descriptor blocks such as `@font-face` hold declarations.
    Declarations(Vec<Declaration>),
}

#[derive(Debug)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub body: Option<AtRuleBody>,
    /// Source text of statements and descriptor blocks, printed as is.
    /// Grouping rules are always rebuilt from their nodes.
    pub raw: Option<String>,
    pub before: String,
}

impl fmt::Display for AtRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return f.write_str(raw);
        }
        write!(f, "@{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, " {}", self.params)?;
        }
        match &self.body {
            None => f.write_str(";"),
            Some(AtRuleBody::Nodes(sheet)) => write!(f, " {{{}}}", sheet),
            Some(AtRuleBody::Declarations(decls)) => {
                f.write_str(" {\n")?;
                for decl in decls {
                    writeln!(f, "    {};", decl)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A top-level (or block-nested) node of the stylesheet.
#[derive(Debug)]
pub enum CssNode {
    Rule(RuleHandle),
    Comment(Comment),
    AtRule(AtRule),
}

impl CssNode {
    pub fn is_comment(&self) -> bool {
        matches!(self, CssNode::Comment(_))
    }

    pub fn as_rule(&self) -> Option<&RuleHandle> {
        match self {
            CssNode::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    fn before(&self) -> String {
        match self {
            CssNode::Rule(rule) => rule.borrow().before.clone(),
            CssNode::Comment(comment) => comment.before.clone(),
            CssNode::AtRule(at_rule) => at_rule.before.clone(),
        }
    }
}

/// An ordered tree of CSS nodes.
#[derive(Debug, Default)]
pub struct Stylesheet {
    nodes: Vec<CssNode>,
    /// Raw whitespace after the last node.
    pub after: String,
}

impl Stylesheet {
    pub fn new() -> Self {
        Stylesheet::default()
    }

    /// Parses `css`, falling back to an empty sheet on malformed input.
    pub fn parse(css: &str) -> Self {
        css_parser::parse_or_empty(css)
    }

    pub fn nodes(&self) -> &[CssNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: CssNode) {
        self.nodes.push(node);
    }

    pub fn insert(&mut self, index: usize, node: CssNode) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
    }

    /// Visits every rule in document order, descending into grouping at-rules.
    pub fn walk_rules<F: FnMut(&RuleHandle)>(&self, visit: &mut F) {
        for node in &self.nodes {
            match node {
                CssNode::Rule(rule) => visit(rule),
                CssNode::AtRule(AtRule {
                    body: Some(AtRuleBody::Nodes(nested)),
                    ..
                }) => nested.walk_rules(visit),
                _ => {}
            }
        }
    }

    pub fn rules(&self) -> Vec<RuleHandle> {
        let mut rules = Vec::new();
        self.walk_rules(&mut |rule| rules.push(Rc::clone(rule)));
        rules
    }

    /// Removes every rule (nested ones included) for which `predicate` holds.
    /// Returns the number of removed rules.
    pub fn remove_rules_where<P: Fn(&Rule) -> bool>(&mut self, predicate: &P) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|node| match node {
            CssNode::Rule(rule) => !predicate(&rule.borrow()),
            _ => true,
        });
        let mut removed = before - self.nodes.len();
        for node in &mut self.nodes {
            if let CssNode::AtRule(AtRule {
                body: Some(AtRuleBody::Nodes(nested)),
                ..
            }) = node
            {
                removed += nested.remove_rules_where(predicate);
            }
        }
        removed
    }

    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            let before = node.before();
            if before.is_empty() && i > 0 {
                f.write_str("\n")?;
            } else {
                f.write_str(&before)?;
            }
            match node {
                CssNode::Rule(rule) => write!(f, "{}", rule.borrow())?,
                CssNode::Comment(comment) => write!(f, "/*{}*/", comment.text)?,
                CssNode::AtRule(at_rule) => write!(f, "{}", at_rule)?,
            }
        }
        f.write_str(&self.after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rule_display_and_last_value_wins() {
        let mut rule = Rule::new(".material-brick, .layer-material-brick");
        rule.append("fill", "red");
        rule.append("fill", "blue");
        assert_eq!(rule.value_of("fill"), Some("blue"));
        assert_eq!(
            rule.to_string(),
            ".material-brick, .layer-material-brick {\n    fill: red;\n    fill: blue;\n}"
        );
    }

    #[test]
    fn test_empty_rule_display() {
        assert_eq!(Rule::new(".surface").to_string(), ".surface {}");
    }

    #[test]
    fn test_comment_block_label() {
        assert_eq!(Comment::new(" --- DEFAULT --- ").block_label(), Some("DEFAULT"));
        assert_eq!(
            Comment::new("---MARKERS STYLES---").block_label(),
            Some("MARKERS STYLES")
        );
        assert_eq!(Comment::new(" just a note ").block_label(), None);
        assert_eq!(Comment::new(" ------ ").block_label(), None);
    }

    #[test]
    fn test_replace_declarations_drops_stale_properties() {
        let mut rule = Rule::new(".surface");
        rule.append("fill", "red");
        rule.append("stroke-dasharray", "2 1");
        rule.replace_declarations(vec![Declaration::new("fill", "green")]);
        assert_eq!(rule.declarations().len(), 1);
        assert!(!rule.has_property("stroke-dasharray"));
    }

    #[test]
    fn test_remove_rules_where_descends_into_media() {
        let mut sheet = Stylesheet::parse(
            "#sym > path:nth-of-type(1) { fill: red; }\n@media print { #sym > rect:nth-of-type(1) { fill: red; } .keep { fill: none; } }",
        );
        let removed = sheet.remove_rules_where(&|rule: &Rule| {
            rule.first_selector()
                .is_some_and(|s| s.starts_with("#sym >"))
        });
        assert_eq!(removed, 2);
        let remaining: Vec<String> = sheet.rules().iter().map(|r| r.borrow().selector()).collect();
        assert_eq!(remaining, vec![".keep".to_string()]);
    }
}
