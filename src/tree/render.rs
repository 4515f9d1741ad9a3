//! Plain-text and JSON rendering of a built tree.

use super::node::TreeNode;
use anyhow::Result;

/// Draw the children of `root` with box-drawing connectors, one node per line.
///
/// Collapsed nodes carry a trailing ` +`; their children are still printed.
pub fn render_text(root: &TreeNode) -> String {
    let mut lines = Vec::new();
    walk_tree(root.children(), "", &mut lines);
    lines.join("\n")
}

fn walk_tree(nodes: &[TreeNode], prefix: &str, lines: &mut Vec<String>) {
    let total = nodes.len();
    for (idx, node) in nodes.iter().enumerate() {
        let is_last = idx == total - 1;
        let connector = if is_last { "└── " } else { "├── " };
        let marker = if node.expanded() == Some(false) { " +" } else { "" };
        lines.push(format!("{}{}{}{}", prefix, connector, describe(node), marker));

        if !node.children().is_empty() {
            let extension = if is_last { "    " } else { "│   " };
            walk_tree(node.children(), &format!("{}{}", prefix, extension), lines);
        }
    }
}

fn describe(node: &TreeNode) -> String {
    match node {
        TreeNode::Folder { name, .. } => format!("{}/", name),
        TreeNode::Tag { name, count, .. } => format!("{} ({})", name, count),
        TreeNode::Occurrence(leaf) => format!("{} (line {})", leaf.label, leaf.line + 1),
        other => other.label().to_string(),
    }
}

/// Pretty JSON for machine consumers.
pub fn render_json(root: &TreeNode) -> Result<String> {
    Ok(serde_json::to_string_pretty(root)?)
}
