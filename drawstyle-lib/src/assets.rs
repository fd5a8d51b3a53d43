//! The asset map written next to the drawings when a model is exported.
//!
//! ```json
//! { "plan-00.svg": { "Stylesheet": "styles/plan.css", "Patterns": "resources/patterns.svg" } }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::StyleError;

/// Resources of one drawing. Paths are relative to the project directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetEntry {
    pub stylesheet: Option<String>,
    pub patterns: Option<String>,
    pub markers: Option<String>,
    pub symbols: Option<String>,
    pub target_view: Option<String>,
    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Drawing file name → its resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetMap(HashMap<String, AssetEntry>);

/// The directory asset paths are resolved against: the parent of the
/// directory holding the drawing.
pub fn project_dir(drawing: &Path) -> PathBuf {
    drawing
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

impl AssetMap {
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, StyleError> {
        let json = fs::read_to_string(path).map_err(|err| StyleError::io(path, err))?;
        let map = Self::from_json(&json)?;
        info!("loaded asset map {} ({} drawings)", path.display(), map.0.len());
        Ok(map)
    }

    pub fn entry(&self, drawing_file_name: &str) -> Option<&AssetEntry> {
        let entry = self.0.get(drawing_file_name);
        if entry.is_none() {
            debug!("no asset entry for {drawing_file_name}");
        }
        entry
    }

    /// The entry of the drawing at `drawing`, looked up by its file name.
    pub fn entry_for(&self, drawing: &Path) -> Option<&AssetEntry> {
        let name = drawing.file_name()?.to_str()?;
        self.entry(name)
    }
}

/// Absolute locations of a drawing's resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    pub stylesheet: Option<PathBuf>,
    pub patterns: Option<PathBuf>,
    pub markers: Option<PathBuf>,
    pub symbols: Option<PathBuf>,
}

impl AssetEntry {
    /// Resolves the entry's relative paths for the drawing at `drawing`.
    pub fn resolve(&self, drawing: &Path) -> AssetPaths {
        let base = project_dir(drawing);
        let join = |relative: &Option<String>| relative.as_deref().map(|r| base.join(r));
        AssetPaths {
            stylesheet: join(&self.stylesheet),
            patterns: join(&self.patterns),
            markers: join(&self.markers),
            symbols: join(&self.symbols),
        }
    }
}
