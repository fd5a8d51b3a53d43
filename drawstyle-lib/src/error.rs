use std::path::PathBuf;

/// Errors surfaced by the style engine.
///
/// Most failure modes of the engine recover locally (see the logging at each
/// call site); these are the ones a caller has to react to.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("CSS parse error at line {line}: {message}")]
    Parse { line: u32, message: String },

    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("no rule is selected and no new rule is pending")]
    NothingSelected,

    #[error("the stylesheet is read-only until it is saved to its external file")]
    ReadOnly,

    #[error("the drawing has no <svg> root element")]
    MissingSvgRoot,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid asset map: {0}")]
    AssetMap(#[from] serde_json::Error),

    #[error("pattern `{0}` is not defined")]
    UnknownPattern(String),

    #[error("pattern id `{0}` is already in use")]
    DuplicatePattern(String),

    #[error("pattern id must not be empty")]
    EmptyPatternId,
}

impl StyleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StyleError::Io {
            path: path.into(),
            source,
        }
    }
}
