//! tag-tree: scan a workspace for TODO/FIXME tags and print them as a tree

use anyhow::Result;

fn main() -> Result<()> {
    tag_tree::cli::run()
}
