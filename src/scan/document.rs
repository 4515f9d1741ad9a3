//! Run the search pattern over one in-memory document.
//!
//! Used for open documents after an edit or save, and by the in-process
//! search engine for every file it walks.

use crate::domain::RawMatch;
use regex::Regex;
use std::collections::BTreeSet;

/// Every match of `pattern` in `text` as 1-based line/column hits.
///
/// `pattern` should be compiled multi-line so that `^` anchors at each line.
/// Leading line breaks swallowed by a match (a `^\s*` branch starting on an
/// empty line) are skipped so the hit lands on the line holding the tag.
pub fn scan_document(file: &str, text: &str, pattern: &Regex) -> Vec<RawMatch> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect();

    let mut seen = BTreeSet::new();
    let mut matches = Vec::new();

    for found in pattern.find_iter(text) {
        let matched = found.as_str();
        let skipped = matched.len() - matched.trim_start_matches(['\n', '\r']).len();
        let start = found.start() + skipped;
        if start >= found.end() {
            continue;
        }

        let line_idx = line_starts.partition_point(|&s| s <= start) - 1;
        let line_start = line_starts[line_idx];
        let line_end = text[line_start..].find('\n').map_or(text.len(), |n| line_start + n);
        let line_text = text[line_start..line_end].trim_end_matches('\r');

        let line = line_idx + 1;
        let column = text[line_start..start].chars().count() + 1;
        if !seen.insert((line, column)) {
            continue;
        }

        matches.push(RawMatch {
            file: file.to_string(),
            line,
            column,
            line_text: line_text.to_string(),
            matched: text[start..found.end().min(line_end)].to_string(),
        });
    }

    matches
}
