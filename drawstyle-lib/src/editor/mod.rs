//! Editing on top of the stylesheet model: selection, edit values and rule
//! creation.

pub mod controls;
pub mod defaults;
pub mod session;
pub mod spaces;
pub mod symbols;
pub mod synthesis;

pub use controls::{EditMode, EditValues, Fill};
pub use session::{CommitResult, EditorMode, EditorSession, PendingSelection, PickOutcome, SelectionChanged};
pub use symbols::SymbolShape;
pub use synthesis::Insertion;
