//! Display tree: node types, builder, expansion state and rendering

pub mod builder;
pub mod expansion;
pub mod node;
pub mod render;

pub use builder::{build_tree, BuildConfig, EMPTY_LABEL};
pub use expansion::ExpansionState;
pub use node::{OccurrenceLeaf, TreeNode};
pub use render::{render_json, render_text};
