//! The canonical, deduplicated collection of tag occurrences.
//!
//! Occurrences are keyed by `(file, line, column)` and always iterate sorted
//! by file, then line, then column.

use crate::domain::{Occurrence, TagCounts};
use std::collections::BTreeMap;

pub mod globs;

pub use globs::{is_included, GlobFilter};

type LineKey = (usize, usize);

#[derive(Debug, Clone, Default)]
pub struct MatchStore {
    files: BTreeMap<String, BTreeMap<LineKey, Occurrence>>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add occurrences. An occurrence whose key is already present replaces
    /// the stored one. Returns the number of new keys.
    pub fn ingest<I>(&mut self, occurrences: I) -> usize
    where
        I: IntoIterator<Item = Occurrence>,
    {
        let mut added = 0;
        for occurrence in occurrences {
            let key = (occurrence.line, occurrence.column);
            let entries = self.files.entry(occurrence.file.clone()).or_default();
            if entries.insert(key, occurrence).is_none() {
                added += 1;
            }
        }
        added
    }

    /// Swap out everything known about `file` for `occurrences`.
    ///
    /// An empty `occurrences` removes the file. Entries for other files are
    /// ignored with a diagnostic.
    pub fn replace_for_file(&mut self, file: &str, occurrences: Vec<Occurrence>) {
        let mut entries = BTreeMap::new();
        for occurrence in occurrences {
            if occurrence.file != file {
                tracing::warn!(
                    "Dropping occurrence for {} while replacing {}",
                    occurrence.file,
                    file
                );
                continue;
            }
            entries.insert((occurrence.line, occurrence.column), occurrence);
        }

        if entries.is_empty() {
            self.files.remove(file);
        } else {
            self.files.insert(file.to_string(), entries);
        }
    }

    /// Forget `file`. Returns how many occurrences were dropped.
    pub fn remove_file(&mut self, file: &str) -> usize {
        self.files.remove(file).map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Occurrences whose file passes `filter`, in store order.
    pub fn filter_by_glob(&self, filter: &GlobFilter) -> Vec<&Occurrence> {
        self.files
            .iter()
            .filter(|(file, _)| filter.is_included(file))
            .flat_map(|(_, entries)| entries.values())
            .collect()
    }

    /// Drop every file that fails `filter`. Returns the number of
    /// occurrences removed.
    pub fn retain_by_glob(&mut self, filter: &GlobFilter) -> usize {
        if filter.is_empty() {
            return 0;
        }
        let before = self.len();
        self.files.retain(|file, _| filter.is_included(file));
        before - self.len()
    }

    /// Cut each occurrence's display text just before the next occurrence
    /// on the same line. Recomputed from the raw lines on every call.
    pub fn apply_overlap_trim(&mut self) {
        for entries in self.files.values_mut() {
            let mut ordered: Vec<&mut Occurrence> = entries.values_mut().collect();
            for occurrence in ordered.iter_mut() {
                occurrence.trim_end = None;
            }
            for i in 1..ordered.len() {
                let (line, column) = (ordered[i].line, ordered[i].column);
                let previous = &mut ordered[i - 1];
                if previous.line == line {
                    previous.trim_end = Some(column.saturating_sub(1));
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Occurrence> {
        self.files.values().flat_map(|entries| entries.values())
    }

    pub fn occurrences_for(&self, file: &str) -> impl Iterator<Item = &Occurrence> {
        self.files.get(file).into_iter().flat_map(|entries| entries.values())
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn contains_file(&self, file: &str) -> bool {
        self.files.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.files.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn tag_counts(&self) -> TagCounts {
        let mut counts = TagCounts::new();
        for occurrence in self.iter() {
            *counts.entry(occurrence.tag.clone()).or_insert(0) += 1;
        }
        counts
    }
}
