//! Tree model: the in-memory, read-only form of one boosted tree.

pub mod node;
#[allow(clippy::module_inception)]
pub mod tree;

pub use node::Node;
pub use tree::Tree;
