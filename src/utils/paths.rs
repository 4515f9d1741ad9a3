//! Path normalization and root-relative splitting

use std::path::{Path, PathBuf};

pub fn normalize_path(path: &str) -> String {
    // Convert backslashes to forward slashes and normalize
    path.replace('\\', "/")
}

/// The longest root in `roots` that contains `file`.
pub fn containing_root<'a>(file: &Path, roots: &'a [PathBuf]) -> Option<&'a PathBuf> {
    roots
        .iter()
        .filter(|root| file.starts_with(root))
        .max_by_key(|root| root.components().count())
}

/// `file` relative to its containing root, with forward slashes.
pub fn display_relative(file: &Path, roots: &[PathBuf]) -> String {
    let relative = containing_root(file, roots)
        .and_then(|root| file.strip_prefix(root).ok())
        .unwrap_or(file);
    normalize_path(&relative.to_string_lossy())
}
