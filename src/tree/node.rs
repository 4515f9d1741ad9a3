//! Tree node types produced by the builder.

use serde::Serialize;

/// A leaf pointing at one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceLeaf {
    pub file: String,
    /// Zero-based line, ready for editor positioning.
    pub line: usize,
    /// 1-based character column.
    pub column: usize,
    pub tag: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Root {
        children: Vec<TreeNode>,
    },
    Folder {
        name: String,
        path: String,
        expanded: bool,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
        expanded: bool,
        children: Vec<TreeNode>,
    },
    Tag {
        name: String,
        count: usize,
        expanded: bool,
        children: Vec<TreeNode>,
    },
    Occurrence(OccurrenceLeaf),
    /// Sole child of the root when nothing is left to show.
    Empty {
        label: String,
    },
}

impl Default for TreeNode {
    fn default() -> Self {
        Self::Root { children: Vec::new() }
    }
}

impl TreeNode {
    /// Expansion-state key for a tag node.
    pub fn tag_key(name: &str) -> String {
        format!("tag:{}", name)
    }

    /// Text the filter is matched against.
    pub fn label(&self) -> &str {
        match self {
            Self::Root { .. } => "",
            Self::Folder { name, .. } | Self::File { name, .. } | Self::Tag { name, .. } => name,
            Self::Occurrence(leaf) => &leaf.label,
            Self::Empty { label } => label,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::Root { children }
            | Self::Folder { children, .. }
            | Self::File { children, .. }
            | Self::Tag { children, .. } => children,
            Self::Occurrence(_) | Self::Empty { .. } => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<TreeNode>> {
        match self {
            Self::Root { children }
            | Self::Folder { children, .. }
            | Self::File { children, .. }
            | Self::Tag { children, .. } => Some(children),
            Self::Occurrence(_) | Self::Empty { .. } => None,
        }
    }

    /// Key under which expansion state is recorded, for expandable nodes.
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Folder { path, .. } | Self::File { path, .. } => Some(path.clone()),
            Self::Tag { name, .. } => Some(Self::tag_key(name)),
            _ => None,
        }
    }

    pub fn expanded(&self) -> Option<bool> {
        match self {
            Self::Folder { expanded, .. } | Self::File { expanded, .. } | Self::Tag { expanded, .. } => {
                Some(*expanded)
            }
            _ => None,
        }
    }

    /// Filesystem path of folder and file nodes.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Folder { path, .. } | Self::File { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_empty_sentinel(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// Whether a root has anything other than the empty sentinel.
    pub fn has_content(&self) -> bool {
        match self.children() {
            [] => false,
            [only] => !only.is_empty_sentinel(),
            _ => true,
        }
    }

    /// Number of occurrence leaves below (or at) this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Occurrence(_) => 1,
            _ => self.children().iter().map(TreeNode::leaf_count).sum(),
        }
    }

    /// First folder or file node whose path is `path`, depth first.
    pub fn find_by_path(&self, path: &str) -> Option<&TreeNode> {
        if self.path() == Some(path) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find_by_path(path))
    }

    /// Occurrence leaves in tree order.
    pub fn leaves(&self) -> Vec<&OccurrenceLeaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a OccurrenceLeaf>) {
        match self {
            Self::Occurrence(leaf) => out.push(leaf),
            _ => self.children().iter().for_each(|child| child.collect_leaves(out)),
        }
    }
}
