//! Include/exclude glob matching for occurrence paths.

use crate::utils::normalize_path;
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled include/exclude globs.
///
/// A path passes when there are no include globs or it matches one of them,
/// and it matches no exclude glob. Exclude wins when both match. Include
/// globs that are all invalid include nothing.
#[derive(Debug, Clone, Default)]
pub struct GlobFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl GlobFilter {
    pub fn new(include_globs: &[String], exclude_globs: &[String]) -> Self {
        Self { include: build_globset(include_globs), exclude: build_globset(exclude_globs) }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn is_included(&self, path: &str) -> bool {
        let path = normalize_path(path);
        if self.exclude.as_ref().is_some_and(|set| set.is_match(&path)) {
            return false;
        }
        match &self.include {
            Some(set) => set.is_match(&path),
            None => true,
        }
    }
}

/// One-shot form of [`GlobFilter::is_included`].
pub fn is_included(path: &str, include_globs: &[String], exclude_globs: &[String]) -> bool {
    GlobFilter::new(include_globs, exclude_globs).is_included(path)
}

/// `None` when no patterns are given; invalid patterns are skipped, so a
/// list of only invalid patterns yields an empty set that matches nothing.
fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut given = 0usize;
    for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        given += 1;
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("Ignoring invalid glob '{}': {}", pattern, e),
        }
    }
    if given == 0 {
        return None;
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(e) => {
            tracing::warn!("Failed to compile globs {:?}: {}", patterns, e);
            Some(GlobSet::empty())
        }
    }
}
