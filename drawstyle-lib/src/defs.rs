//! Pattern, marker and symbol definitions.
//!
//! Rules refer to definitions through `url(#id)`. The shared resource files
//! hold the markup of every known definition; [`sync_defs`] copies the ones
//! the stylesheet needs into the drawing's `<defs>`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;

use crate::dom::dom_tree::{self, NodeRef};
use crate::error::StyleError;
use crate::parser::serialize::to_markup;
use crate::parser::svg_tree::create_svg_tree;
use crate::style::stylesheet::{RuleHandle, Stylesheet};

static URL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?#([^)'"]+?)['"]?\s*\)"#).expect("static regex")
});
static PATTERN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\(#([\w-]+)\)").expect("static regex"));

/// id → outer markup of the definitions found in a resource file.
pub type DefinitionMap = BTreeMap<String, String>;

/// The pattern id inside a `url(#id)` value.
pub fn extract_pattern_id(value: &str) -> Option<String> {
    PATTERN_URL
        .captures(value)
        .map(|captures| captures[1].to_owned())
}

/// Every id referenced through `url(#id)` anywhere in the sheet, in order of
/// first appearance.
pub fn referenced_ids(sheet: &Stylesheet) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    sheet.walk_rules(&mut |rule| {
        for decl in rule.borrow().declarations() {
            for captures in URL_REFERENCE.captures_iter(&decl.value) {
                let id = captures[1].trim();
                if !ids.iter().any(|known| known == id) {
                    ids.push(id.to_owned());
                }
            }
        }
    });
    ids
}

/// True when a rule other than `current` fills with `pattern_url`.
pub fn is_pattern_used_by_other_rules(
    sheet: &Stylesheet,
    pattern_url: &str,
    current: Option<&RuleHandle>,
) -> bool {
    if pattern_url.is_empty() {
        return false;
    }
    let mut used_elsewhere = false;
    sheet.walk_rules(&mut |rule| {
        if current.is_some_and(|c| Rc::ptr_eq(c, rule)) {
            return;
        }
        let uses = rule
            .borrow()
            .declarations()
            .iter()
            .any(|d| d.property == "fill" && d.value == pattern_url);
        used_elsewhere |= uses;
    });
    used_elsewhere
}

/// Definitions read from the project's shared resource files.
#[derive(Debug, Default, Clone)]
pub struct DefsLibrary {
    pub patterns: DefinitionMap,
    pub markers: DefinitionMap,
    pub symbols: DefinitionMap,
}

fn collect_by_id(nodes: Vec<NodeRef>) -> DefinitionMap {
    nodes
        .iter()
        .filter_map(|node| {
            let id = node.borrow().as_element()?.id()?.to_owned();
            Some((id, to_markup(node)))
        })
        .collect()
}

fn read_resource(path: Option<&Path>, kind: &str) -> Option<String> {
    let path = path?;
    match fs::read_to_string(path) {
        Ok(markup) => Some(markup),
        Err(err) => {
            warn!("could not read {kind} file {}: {err}", path.display());
            None
        }
    }
}

impl DefsLibrary {
    /// Reads the resource files. A missing or unreadable file leaves its map empty.
    pub fn load(patterns: Option<&Path>, markers: Option<&Path>, symbols: Option<&Path>) -> Self {
        let library = DefsLibrary {
            patterns: read_resource(patterns, "patterns")
                .map(|m| Self::patterns_from_markup(&m))
                .unwrap_or_default(),
            markers: read_resource(markers, "markers")
                .map(|m| Self::markers_from_markup(&m))
                .unwrap_or_default(),
            symbols: read_resource(symbols, "symbols")
                .map(|m| Self::symbols_from_markup(&m))
                .unwrap_or_default(),
        };
        info!(
            "loaded {} patterns, {} markers, {} symbols",
            library.patterns.len(),
            library.markers.len(),
            library.symbols.len()
        );
        library
    }

    /// Every `<pattern>` of the file, wherever it sits.
    pub fn patterns_from_markup(markup: &str) -> DefinitionMap {
        let document = create_svg_tree(markup);
        collect_by_id(dom_tree::find_all(&document.root, |e| e.is("pattern")))
    }

    /// Every `<marker>` of the file, wherever it sits.
    pub fn markers_from_markup(markup: &str) -> DefinitionMap {
        let document = create_svg_tree(markup);
        collect_by_id(dom_tree::find_all(&document.root, |e| e.is("marker")))
    }

    /// The `<g>` children of the file's `<svg>` elements.
    pub fn symbols_from_markup(markup: &str) -> DefinitionMap {
        let document = create_svg_tree(markup);
        let groups = dom_tree::find_all(&document.root, |e| e.is("svg"))
            .iter()
            .flat_map(dom_tree::element_children)
            .filter(|child| child.borrow().as_element().is_some_and(|e| e.is("g")))
            .collect();
        collect_by_id(groups)
    }

    /// The markup to inject for `id`: patterns first, then markers.
    pub fn definition(&self, id: &str) -> Option<&str> {
        self.patterns
            .get(id)
            .or_else(|| self.markers.get(id))
            .map(String::as_str)
    }

    /// Copies the pattern `original_id` under `new_id`.
    ///
    /// # Arguments
    ///
    /// * `sheet` - The current stylesheet; `new_id` must not be referenced by it.
    /// * `original_id` - The pattern to copy.
    /// * `new_id` - The id of the copy.
    ///
    /// # Returns
    ///
    /// The markup of the copy, which is also added to the library.
    pub fn copy_pattern(
        &mut self,
        sheet: &Stylesheet,
        original_id: &str,
        new_id: &str,
    ) -> Result<String, StyleError> {
        let new_id = new_id.trim();
        if new_id.is_empty() {
            return Err(StyleError::EmptyPatternId);
        }
        if new_id == original_id
            || is_pattern_used_by_other_rules(sheet, &format!("url(#{new_id})"), None)
            || self.patterns.contains_key(new_id)
        {
            return Err(StyleError::DuplicatePattern(new_id.to_owned()));
        }
        let original = self
            .patterns
            .get(original_id)
            .ok_or_else(|| StyleError::UnknownPattern(original_id.to_owned()))?;

        let id_attribute = Regex::new(&format!(r#"id\s*=\s*(["']){}["']"#, regex::escape(original_id)))
            .map_err(|_| StyleError::UnknownPattern(original_id.to_owned()))?;
        if !id_attribute.is_match(original) {
            return Err(StyleError::UnknownPattern(original_id.to_owned()));
        }
        let copy = id_attribute
            .replace(original, |captures: &regex::Captures| {
                format!("id={quote}{new_id}{quote}", quote = &captures[1])
            })
            .into_owned();

        info!("copied pattern `{original_id}` to `{new_id}`");
        self.patterns.insert(new_id.to_owned(), copy.clone());
        Ok(copy)
    }
}

/// A document that keeps definition elements.
pub trait DefsHost {
    /// True when the definitions container already holds an element with `id`.
    fn has_definition(&self, id: &str) -> bool;
    /// Appends `markup` to the definitions container, creating it if needed.
    fn insert_definition(&mut self, markup: &str);
}

/// What a [`sync_defs`] run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Ids whose definition was injected.
    pub inserted: Vec<String>,
    /// Referenced ids that are neither present nor known to the library.
    pub unknown: Vec<String>,
}

/// Makes sure every definition the stylesheet references is present in `host`.
///
/// Ids already defined are left alone and unknown ids are reported, so a second
/// run without intervening changes inserts nothing.
pub fn sync_defs<H: DefsHost>(host: &mut H, sheet: &Stylesheet, library: &DefsLibrary) -> SyncReport {
    let mut report = SyncReport::default();
    for id in referenced_ids(sheet) {
        if host.has_definition(&id) {
            continue;
        }
        match library.definition(&id) {
            Some(markup) => {
                debug!("injecting definition `{id}`");
                host.insert_definition(markup);
                report.inserted.push(id);
            }
            None => {
                warn!("no definition found for referenced id `{id}`");
                report.unknown.push(id);
            }
        }
    }
    report
}
