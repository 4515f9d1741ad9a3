//! Build the display tree from the match store contents.
//!
//! `build_tree` is a pure function of the occurrences, the view
//! configuration and the expansion state. Every call produces a fresh tree;
//! only the expansion state, keyed by path, carries across rebuilds.

use super::expansion::ExpansionState;
use super::node::{OccurrenceLeaf, TreeNode};
use crate::domain::{char_prefix, char_suffix, Occurrence, ViewState};
use crate::extract::{format_label, remove_block_comments, LabelFields, TagExtractor};
use crate::utils::{containing_root, display_relative};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Label of the sentinel shown when nothing is left to display.
pub const EMPTY_LABEL: &str = "Nothing found";

/// Everything besides the occurrences that shapes a tree.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig<'a> {
    pub extractor: &'a TagExtractor,
    /// Search roots; folder hierarchies are relative to the longest one
    /// containing a file.
    pub roots: &'a [PathBuf],
    pub view: ViewState,
    pub label_format: &'a str,
    /// Case-insensitive substring filter on node labels.
    pub filter: Option<&'a str>,
}

/// Build a root node from `occurrences`.
pub fn build_tree<'o, I>(occurrences: I, config: &BuildConfig<'_>, expansion: &ExpansionState) -> TreeNode
where
    I: IntoIterator<Item = &'o Occurrence>,
{
    let mut by_file: BTreeMap<String, Vec<OccurrenceLeaf>> = BTreeMap::new();
    for occurrence in occurrences {
        if !occurrence.is_well_formed() {
            warn!(
                file = %occurrence.file,
                line = occurrence.line,
                column = occurrence.column,
                "Dropping malformed occurrence"
            );
            continue;
        }
        by_file
            .entry(occurrence.file.clone())
            .or_default()
            .push(make_leaf(occurrence, config));
    }

    let view = config.view;
    let mut children = if view.grouped {
        grouped_nodes(by_file, config, expansion)
    } else if view.tags_only {
        by_file.into_values().flatten().map(TreeNode::Occurrence).collect()
    } else if view.flat {
        by_file
            .into_iter()
            .map(|(file, leaves)| {
                let name = display_relative(Path::new(&file), config.roots);
                file_node(name, file, leaves, view.expanded, expansion)
            })
            .collect()
    } else {
        folder_nodes(by_file, config, expansion)
    };

    if let Some(needle) = config.filter.map(str::trim).filter(|f| !f.is_empty()) {
        let needle = needle.to_lowercase();
        children = children.into_iter().filter_map(|child| prune(child, &needle)).collect();
    }

    for child in &mut children {
        recount(child);
    }
    sort_nodes(&mut children);

    if children.is_empty() {
        children.push(TreeNode::Empty { label: EMPTY_LABEL.to_string() });
    }
    TreeNode::Root { children }
}

fn make_leaf(occurrence: &Occurrence, config: &BuildConfig<'_>) -> OccurrenceLeaf {
    let text = occurrence.text();
    let start = occurrence.column - 1;
    let prefix = char_prefix(text, start);
    let tail = remove_block_comments(char_suffix(text, start), &occurrence.file);
    let extracted = config.extractor.extract(&tail);

    let (tag, after) = if extracted.tag.is_empty() {
        (occurrence.tag.clone(), tail.trim().to_string())
    } else {
        (extracted.tag, extracted.without_tag)
    };
    let before = prefix.trim();

    let mut label = format_label(
        config.label_format,
        &LabelFields {
            line: occurrence.line - 1,
            column: occurrence.column,
            before,
            tag: &tag,
            after: &after,
        },
    );
    if label.is_empty() {
        label = tag.clone();
    }

    OccurrenceLeaf {
        file: occurrence.file.clone(),
        line: occurrence.line - 1,
        column: occurrence.column,
        tag,
        label,
    }
}

fn file_name(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string())
}

fn file_node(
    name: String,
    path: String,
    leaves: Vec<OccurrenceLeaf>,
    default_expanded: bool,
    expansion: &ExpansionState,
) -> TreeNode {
    TreeNode::File {
        name,
        expanded: expansion.is_expanded(&path, default_expanded),
        path,
        children: leaves.into_iter().map(TreeNode::Occurrence).collect(),
    }
}

/// Tag -> (file -> leaves), or tag -> leaves when showing tags only.
fn grouped_nodes(
    by_file: BTreeMap<String, Vec<OccurrenceLeaf>>,
    config: &BuildConfig<'_>,
    expansion: &ExpansionState,
) -> Vec<TreeNode> {
    let mut by_tag: BTreeMap<String, BTreeMap<String, Vec<OccurrenceLeaf>>> = BTreeMap::new();
    for (file, leaves) in by_file {
        for leaf in leaves {
            by_tag
                .entry(leaf.tag.clone())
                .or_default()
                .entry(file.clone())
                .or_default()
                .push(leaf);
        }
    }

    let default_expanded = config.view.expanded;
    by_tag
        .into_iter()
        .map(|(tag, files)| {
            let children: Vec<TreeNode> = if config.view.tags_only {
                files.into_values().flatten().map(TreeNode::Occurrence).collect()
            } else {
                files
                    .into_iter()
                    .map(|(file, leaves)| {
                        let name = display_relative(Path::new(&file), config.roots);
                        file_node(name, file, leaves, default_expanded, expansion)
                    })
                    .collect()
            };
            TreeNode::Tag {
                expanded: expansion.is_expanded(&TreeNode::tag_key(&tag), default_expanded),
                count: 0,
                name: tag,
                children,
            }
        })
        .collect()
}

/// Intermediate folder while the hierarchy is assembled.
#[derive(Default)]
struct FolderBuilder {
    name: String,
    path: String,
    folders: BTreeMap<String, FolderBuilder>,
    files: Vec<TreeNode>,
}

impl FolderBuilder {
    fn folder(&mut self, name: String, path: String) -> &mut FolderBuilder {
        self.folders
            .entry(path.clone())
            .or_insert_with(|| FolderBuilder { name, path, ..Default::default() })
    }

    fn into_children(self, default_expanded: bool, expansion: &ExpansionState) -> Vec<TreeNode> {
        let mut children: Vec<TreeNode> = self
            .folders
            .into_values()
            .map(|folder| folder.into_node(default_expanded, expansion))
            .collect();
        children.extend(self.files);
        children
    }

    fn into_node(self, default_expanded: bool, expansion: &ExpansionState) -> TreeNode {
        let name = self.name.clone();
        let path = self.path.clone();
        TreeNode::Folder {
            expanded: expansion.is_expanded(&path, default_expanded),
            children: self.into_children(default_expanded, expansion),
            name,
            path,
        }
    }
}

/// Folder hierarchy relative to the containing search root. With several
/// roots every root gets its own top-level folder; files outside all roots
/// hang off their absolute directory chain.
fn folder_nodes(
    by_file: BTreeMap<String, Vec<OccurrenceLeaf>>,
    config: &BuildConfig<'_>,
    expansion: &ExpansionState,
) -> Vec<TreeNode> {
    let default_expanded = config.view.expanded;
    let mut top = FolderBuilder::default();

    for (file, leaves) in by_file {
        let path = Path::new(&file);
        let root = containing_root(path, config.roots);

        let mut current = &mut top;
        if let Some(root) = root.filter(|_| config.roots.len() > 1) {
            let name = root
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| root.to_string_lossy().to_string());
            current = current.folder(name, root.to_string_lossy().to_string());
        }

        for dir in directory_chain(path, root.map(PathBuf::as_path)) {
            let name = dir
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            current = current.folder(name, dir.to_string_lossy().to_string());
        }

        let node = file_node(file_name(&file), file.clone(), leaves, default_expanded, expansion);
        current.files.push(node);
    }

    top.into_children(default_expanded, expansion)
}

/// Directories between `base` (exclusive) and the file, outermost first.
fn directory_chain<'p>(file: &'p Path, base: Option<&Path>) -> Vec<&'p Path> {
    let Some(parent) = file.parent() else {
        return Vec::new();
    };
    let mut chain: Vec<&Path> = parent
        .ancestors()
        .filter(|dir| match base {
            Some(base) => dir.starts_with(base) && *dir != base,
            None => dir.file_name().is_some(),
        })
        .collect();
    chain.reverse();
    chain
}

/// Keep `node` when its label matches or, failing that, the descendants that do.
fn prune(mut node: TreeNode, needle: &str) -> Option<TreeNode> {
    if node.label().to_lowercase().contains(needle) {
        return Some(node);
    }
    let children = node.children_mut()?;
    let kept: Vec<TreeNode> = std::mem::take(children)
        .into_iter()
        .filter_map(|child| prune(child, needle))
        .collect();
    if kept.is_empty() {
        return None;
    }
    *children = kept;
    Some(node)
}

fn recount(node: &mut TreeNode) {
    if let Some(children) = node.children_mut() {
        children.iter_mut().for_each(recount);
    }
    let leaves = node.leaf_count();
    if let TreeNode::Tag { count, .. } = node {
        *count = leaves;
    }
}

fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(compare_nodes);
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            sort_nodes(children);
        }
    }
}

fn kind_rank(node: &TreeNode) -> u8 {
    match node {
        TreeNode::Root { .. } => 0,
        TreeNode::Folder { .. } | TreeNode::File { .. } => 1,
        TreeNode::Tag { .. } => 2,
        TreeNode::Occurrence(_) => 3,
        TreeNode::Empty { .. } => 4,
    }
}

fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a, b) {
        (
            TreeNode::Tag { name: a_name, count: a_count, .. },
            TreeNode::Tag { name: b_name, count: b_count, .. },
        ) => b_count.cmp(a_count).then_with(|| a_name.cmp(b_name)),
        (TreeNode::Occurrence(a), TreeNode::Occurrence(b)) => (&a.file, a.line, a.column).cmp(&(&b.file, b.line, b.column)),
        _ if kind_rank(a) == 1 && kind_rank(b) == 1 => a
            .label()
            .to_lowercase()
            .cmp(&b.label().to_lowercase())
            .then_with(|| a.label().cmp(b.label())),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}
