//! Style-rule resolution and editing for IFC-derived SVG drawings.
//!
//! A click on a drawing element is classified into the selectors that govern
//! it ([`picker`]), resolved against the drawing's stylesheet ([`style`]) and
//! turned into an editable selection ([`editor`]). Commits rewrite the
//! stylesheet, keep its comment-delimited category blocks intact and mirror the
//! result into the drawing ([`drawing`], [`persist`]).

pub mod assets;
pub mod defs;
pub mod dom;
pub mod drawing;
pub mod editor;
pub mod error;
pub mod parser;
pub mod persist;
pub mod picker;
pub mod style;
pub mod svg;

pub use drawing::{DrawingEditor, DrawingOptions};
pub use error::StyleError;
