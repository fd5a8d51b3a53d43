pub mod category;
pub mod css_parser;
pub mod locator;
pub mod model;
pub mod selector_index;
pub mod stylesheet;
pub mod validate;

pub use category::{category_for, Category};
pub use locator::Resolution;
pub use model::StyleModel;
pub use selector_index::SelectorIndex;
pub use stylesheet::{CssNode, Declaration, Rule, RuleComment, RuleHandle, Stylesheet};
