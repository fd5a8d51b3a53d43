//! One opened drawing: the SVG document, its stylesheet session and the shared
//! definition library, kept in step with each other.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::assets::{AssetMap, AssetPaths};
use crate::defs::{sync_defs, DefsLibrary, SyncReport};
use crate::dom::dom_tree::NodeRef;
use crate::editor::controls::EditValues;
use crate::editor::defaults::SPACE_SELECTOR;
use crate::editor::session::{CommitResult, EditorMode, EditorSession, PickOutcome};
use crate::editor::symbols::SymbolShape;
use crate::error::StyleError;
use crate::persist::{append_definition_to_file, save_stylesheet};
use crate::style::model::StyleModel;
use crate::style::stylesheet::RuleHandle;
use crate::svg::SvgDocument;

/// Where the resources of a drawing come from. Explicit paths win over the
/// asset map entry.
#[derive(Debug, Clone, Default)]
pub struct DrawingOptions {
    pub assets: Option<PathBuf>,
    pub stylesheet: Option<PathBuf>,
    pub patterns: Option<PathBuf>,
    pub markers: Option<PathBuf>,
    pub symbols: Option<PathBuf>,
}

impl DrawingOptions {
    fn resolve(&self, svg_path: &Path) -> Result<AssetPaths, StyleError> {
        let from_map = match &self.assets {
            Some(map_path) => AssetMap::load(map_path)?
                .entry_for(svg_path)
                .map(|entry| entry.resolve(svg_path))
                .unwrap_or_default(),
            None => AssetPaths::default(),
        };
        Ok(AssetPaths {
            stylesheet: self.stylesheet.clone().or(from_map.stylesheet),
            patterns: self.patterns.clone().or(from_map.patterns),
            markers: self.markers.clone().or(from_map.markers),
            symbols: self.symbols.clone().or(from_map.symbols),
        })
    }
}

#[derive(Debug)]
pub struct DrawingEditor {
    svg_path: PathBuf,
    css_path: Option<PathBuf>,
    patterns_path: Option<PathBuf>,
    document: SvgDocument,
    session: EditorSession,
    library: DefsLibrary,
}

impl DrawingEditor {
    /// Opens the drawing at `svg_path` and its stylesheet.
    ///
    /// # Arguments
    ///
    /// * `svg_path` - The drawing file.
    /// * `options` - Asset map and resource paths.
    ///
    /// # Returns
    ///
    /// The editor. When the external stylesheet cannot be read, the drawing's
    /// own `<style>` text is used and the session is read-only until saved.
    pub fn open(svg_path: &Path, options: &DrawingOptions) -> Result<Self, StyleError> {
        let markup = fs::read_to_string(svg_path).map_err(|err| StyleError::io(svg_path, err))?;
        let document = SvgDocument::parse(&markup)?;
        let paths = options.resolve(svg_path)?;

        let (css, read_only) = match &paths.stylesheet {
            Some(css_path) => match fs::read_to_string(css_path) {
                Ok(css) => (css, false),
                Err(err) => {
                    warn!(
                        "could not read stylesheet {}: {err}; falling back to the drawing's <style>",
                        css_path.display()
                    );
                    (document.style_text().unwrap_or_default(), true)
                }
            },
            None => (String::new(), false),
        };

        let library = DefsLibrary::load(
            paths.patterns.as_deref(),
            paths.markers.as_deref(),
            paths.symbols.as_deref(),
        );
        let mut session = EditorSession::new(StyleModel::new(css));
        session.set_read_only(read_only);

        let mut editor = DrawingEditor {
            svg_path: svg_path.to_path_buf(),
            css_path: paths.stylesheet,
            patterns_path: paths.patterns,
            document,
            session,
            library,
        };
        editor.document.set_style_text(editor.session.css());
        info!("opened {}", svg_path.display());
        Ok(editor)
    }

    pub fn document(&self) -> &SvgDocument {
        &self.document
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn library(&self) -> &DefsLibrary {
        &self.library
    }

    pub fn css_path(&self) -> Option<&Path> {
        self.css_path.as_deref()
    }

    /// Handles a click on `node`. A click on a symbol instance also loads the
    /// symbol's outline into the session.
    pub fn click(&mut self, node: &NodeRef) -> Option<PickOutcome> {
        let element = self.document.element(node)?;
        let outcome = self.session.pick(&element);
        if let PickOutcome::Symbol { id } = &outcome {
            match self.document.symbol_shape(id) {
                Some(shape) => self.session.enter_symbol_mode(&shape),
                None => warn!("symbol `{id}` is not defined in this drawing"),
            }
        }
        Some(outcome)
    }

    /// Mirrors the stylesheet into the document and injects the definitions it needs.
    pub fn refresh(&mut self) -> SyncReport {
        self.document.set_style_text(self.session.css());
        sync_defs(&mut self.document, self.session.sheet(), &self.library)
    }

    pub fn commit(&mut self, values: &EditValues) -> Result<CommitResult, StyleError> {
        let result = self.session.commit(values)?;
        let report = self.refresh();
        if !report.inserted.is_empty() {
            info!("injected definitions: {}", report.inserted.join(", "));
        }
        Ok(result)
    }

    /// Binds a default rule. Selecting `.IfcSpace` first generates the rules
    /// of the drawing's spaces.
    pub fn select_default_rule(&mut self, selector: &str) -> Option<RuleHandle> {
        if selector == SPACE_SELECTOR {
            let guids = self.document.space_guids();
            if self.session.generate_space_rules(&guids) > 0 {
                self.refresh();
            }
        }
        self.session.select_default_rule(selector)
    }

    fn current_symbol(&self) -> Result<SymbolShape, StyleError> {
        match self.session.mode() {
            EditorMode::Symbol { id } => self.document.symbol_shape(id).ok_or(StyleError::NothingSelected),
            EditorMode::Css => Err(StyleError::NothingSelected),
        }
    }

    /// Selects the `index`th child of the symbol being edited.
    pub fn select_symbol_part(&mut self, index: usize) -> Result<Option<String>, StyleError> {
        let shape = self.current_symbol()?;
        Ok(self.session.select_symbol_part(&shape, index))
    }

    /// Writes `values` to every part of the symbol being edited.
    pub fn apply_symbol_style_to_all(&mut self, values: &EditValues) -> Result<usize, StyleError> {
        let shape = self.current_symbol()?;
        let written = self.session.apply_symbol_style_to_all(&shape, values)?;
        self.refresh();
        Ok(written)
    }

    /// Copies a pattern of the library under a new id and records it in the
    /// patterns resource file when there is one.
    pub fn copy_pattern(&mut self, original_id: &str, new_id: &str) -> Result<String, StyleError> {
        let markup = self.library.copy_pattern(self.session.sheet(), original_id, new_id)?;
        if let Some(path) = &self.patterns_path {
            append_definition_to_file(path, &markup)?;
        }
        Ok(markup)
    }

    /// Persists the stylesheet. A read-only session becomes editable once the
    /// external file exists.
    pub fn save(&mut self) -> Result<(), StyleError> {
        save_stylesheet(self.css_path.as_deref(), &self.svg_path, self.session.css())?;
        if self.session.is_read_only() {
            info!("stylesheet materialized, edits are enabled");
            self.session.set_read_only(false);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DRAWING: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><style type="text/css"><![CDATA[.cut { fill: none; }]]></style><g class="IfcWall material-brick"><path id="p"/></g></svg>"#;

    #[test]
    fn test_unreadable_stylesheet_falls_back_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let svg_path = dir.path().join("plan.svg");
        fs::write(&svg_path, DRAWING).unwrap();
        let options = DrawingOptions {
            stylesheet: Some(dir.path().join("missing.css")),
            ..DrawingOptions::default()
        };

        let mut editor = DrawingEditor::open(&svg_path, &options).unwrap();
        assert!(editor.session().is_read_only());
        assert_eq!(editor.session().css(), ".cut { fill: none; }");

        let path = editor.document().find_by_id("p").unwrap();
        editor.click(&path);
        let values = editor.session().values().clone();
        assert!(matches!(editor.commit(&values), Err(StyleError::ReadOnly)));

        editor.save().unwrap();
        assert!(!editor.session().is_read_only());
        assert_eq!(fs::read_to_string(dir.path().join("missing.css")).unwrap(), ".cut { fill: none; }");
    }

    #[test]
    fn test_without_stylesheet_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let svg_path = dir.path().join("plan.svg");
        fs::write(&svg_path, DRAWING).unwrap();
        let editor = DrawingEditor::open(&svg_path, &DrawingOptions::default()).unwrap();
        assert!(!editor.session().is_read_only());
        assert_eq!(editor.session().css(), "");
        assert_eq!(editor.document().style_text().as_deref(), Some(""));
    }
}
