pub mod dom_indices;
pub mod serialize;
pub mod svg_tree;
