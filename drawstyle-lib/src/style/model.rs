use log::debug;

use crate::style::selector_index::SelectorIndex;
use crate::style::stylesheet::{RuleHandle, Stylesheet};

/// Sole owner of the current stylesheet text, its tree and its selector index.
///
/// The three always describe the same generation: replacing the text re-parses
/// and re-indexes before returning, and [`StyleModel::commit`] funnels every
/// tree mutation through a serialize/re-parse cycle. Rule handles obtained
/// before a commit belong to the previous generation and must be looked up again.
#[derive(Debug, Default)]
pub struct StyleModel {
    text: String,
    sheet: Stylesheet,
    index: SelectorIndex,
}

impl StyleModel {
    pub fn new(text: impl Into<String>) -> Self {
        let mut model = StyleModel::default();
        model.set_text(text);
        model
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sheet(&self) -> &Stylesheet {
        &self.sheet
    }

    pub fn index(&self) -> &SelectorIndex {
        &self.index
    }

    /// True when the stylesheet produced at least one indexed selector.
    pub fn is_loaded(&self) -> bool {
        !self.index.is_empty()
    }

    /// Replaces the backing text wholesale and rebuilds the tree and index.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.sheet = Stylesheet::parse(&self.text);
        self.index = SelectorIndex::build(&self.sheet);
        debug!("stylesheet reloaded, {} selectors indexed", self.index.len());
    }

    /// Applies `mutate` to the tree, then re-serializes and re-indexes.
    ///
    /// # Returns
    ///
    /// Whatever `mutate` returned, alongside the new serialized text.
    pub fn commit<T, F>(&mut self, mutate: F) -> (T, &str)
    where
        F: FnOnce(&mut Stylesheet) -> T,
    {
        let result = mutate(&mut self.sheet);
        let text = self.sheet.to_css();
        self.set_text(text);
        (result, &self.text)
    }

    /// Looks a selector up in the current generation.
    pub fn lookup(&self, selector: &str) -> Option<RuleHandle> {
        self.index.get(selector)
    }
}
