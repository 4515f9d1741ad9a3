//! Core data types shared by the scanner, the match store and the tree builder.

use crate::extract::TagExtractor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Tag name -> number of occurrences.
pub type TagCounts = BTreeMap<String, usize>;

/// One hit reported by a search service, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based character column where the match starts.
    pub column: usize,
    /// Full text of the matching line, without its line terminator.
    pub line_text: String,
    /// The matched substring itself.
    pub matched: String,
}

/// Identity of an occurrence inside the match store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OccurrenceKey {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

/// A classified tag hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based character column of the match start.
    pub column: usize,
    /// The line as it was read. Never rewritten by the overlap trim.
    pub raw_line: String,
    /// Canonical tag from the configured vocabulary.
    pub tag: String,
    /// Character count the display text is cut to when another occurrence
    /// follows on the same line.
    #[serde(skip)]
    pub(crate) trim_end: Option<usize>,
}

impl Occurrence {
    pub fn new(file: impl Into<String>, line: usize, column: usize, raw_line: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            raw_line: raw_line.into(),
            tag: tag.into(),
            trim_end: None,
        }
    }

    /// Classify a raw search hit against the tag vocabulary.
    ///
    /// The tag is looked up from the match column onwards first so that two
    /// tags on one line are attributed to their own occurrences. Hits from
    /// pattern branches that carry no vocabulary tag (e.g. markdown check
    /// boxes) fall back to the matched text.
    pub fn classify(raw: RawMatch, extractor: &TagExtractor) -> Self {
        let tail = char_suffix(&raw.line_text, raw.column.saturating_sub(1));
        let mut tag = extractor.extract(tail).tag;
        if tag.is_empty() {
            tag = extractor.extract(&raw.line_text).tag;
        }
        if tag.is_empty() {
            tag = raw.matched.trim().to_string();
        }
        Self::new(raw.file, raw.line, raw.column, raw.line_text, tag)
    }

    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey { file: self.file.clone(), line: self.line, column: self.column }
    }

    /// Line text with the overlap trim applied.
    pub fn text(&self) -> &str {
        match self.trim_end {
            Some(end) => char_prefix(&self.raw_line, end),
            None => &self.raw_line,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.file.is_empty() && self.line > 0 && self.column > 0
    }
}

/// First `n` characters of `text`.
pub(crate) fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `text` with its first `n` characters removed.
pub(crate) fn char_suffix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// A folder opened in the host workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceFolder {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into() }
    }

    /// Use the directory name as the workspace name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or(".").to_string();
        Self { name, path }
    }
}

/// How the status line summarises tag counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusBarMode {
    #[default]
    #[serde(rename = "total")]
    Total,
    #[serde(rename = "tags")]
    Tags,
    #[serde(rename = "top three")]
    TopThree,
    #[serde(rename = "off")]
    Off,
}

impl StatusBarMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "total" => Some(Self::Total),
            "tags" => Some(Self::Tags),
            "top three" | "top-three" | "topthree" => Some(Self::TopThree),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }
}

impl fmt::Display for StatusBarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Total => "total",
            Self::Tags => "tags",
            Self::TopThree => "top three",
            Self::Off => "off",
        };
        f.write_str(name)
    }
}

/// Display flags for the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub flat: bool,
    pub tags_only: bool,
    pub grouped: bool,
    pub expanded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_applies_trim_on_char_boundaries() {
        let mut occ = Occurrence::new("/a.rs", 1, 1, "// TODO é one // FIXME two", "TODO");
        assert_eq!(occ.text(), "// TODO é one // FIXME two");
        occ.trim_end = Some(13);
        assert_eq!(occ.text(), "// TODO é one");
    }

    #[test]
    fn test_classify_uses_tag_at_column() {
        let extractor = TagExtractor::new(&["TODO".to_string(), "FIXME".to_string()], true)
            .expect("extractor");
        let raw = RawMatch {
            file: "/src/a.rs".to_string(),
            line: 3,
            column: 15,
            line_text: "// TODO first // FIXME second".to_string(),
            matched: "// FIXME".to_string(),
        };
        let occ = Occurrence::classify(raw, &extractor);
        assert_eq!(occ.tag, "FIXME");
        assert_eq!(occ.key(), OccurrenceKey { file: "/src/a.rs".into(), line: 3, column: 15 });
    }

    #[test]
    fn test_classify_falls_back_to_matched_text() {
        let extractor = TagExtractor::new(&["TODO".to_string()], true).expect("extractor");
        let raw = RawMatch {
            file: "/notes.md".to_string(),
            line: 1,
            column: 1,
            line_text: "- [ ] buy milk".to_string(),
            matched: "- [ ]".to_string(),
        };
        assert_eq!(Occurrence::classify(raw, &extractor).tag, "- [ ]");
    }

    #[test]
    fn test_status_bar_mode_parse() {
        assert_eq!(StatusBarMode::parse("top three"), Some(StatusBarMode::TopThree));
        assert_eq!(StatusBarMode::parse("OFF"), Some(StatusBarMode::Off));
        assert_eq!(StatusBarMode::parse("bogus"), None);
        assert_eq!(StatusBarMode::TopThree.to_string(), "top three");
    }

    #[test]
    fn test_workspace_from_path_uses_dir_name() {
        let ws = WorkspaceFolder::from_path("/home/dev/project");
        assert_eq!(ws.name, "project");
    }
}
