//! Configuration loading and merging
//!
//! Handles loading from config files, environment variables, and CLI arguments
//! with proper precedence (CLI > Env > File > Defaults).

pub mod loader;
pub mod merge;
pub mod roots;

pub use loader::{apply_env_overrides, load_config};
pub use merge::{merge_cli_with_config, CliOverrides};
pub use roots::resolve_search_roots;

use crate::domain::{StatusBarMode, ViewState};
use crate::extract::{expand_pattern, TagExtractor};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REGEX: &str = r"((//|#|<!--|;|/\*|^)\s*($TAGS)|^\s*- \[ \])";
pub const DEFAULT_LABEL_FORMAT: &str = "${tag} ${after}";

pub fn default_tags() -> Vec<String> {
    ["BUG", "HACK", "FIXME", "TODO", "XXX", "[ ]", "[x]"].iter().map(|t| t.to_string()).collect()
}

/// One immutable snapshot of every setting the scanner and tree read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag vocabulary, in priority order.
    #[serde(deserialize_with = "string_or_list")]
    pub tags: Vec<String>,
    /// Search pattern template; `$TAGS` expands to the tag alternation.
    pub regex: String,
    pub case_sensitive: bool,
    #[serde(deserialize_with = "string_or_list")]
    pub include_globs: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub exclude_globs: Vec<String>,
    /// Templated root expression (`${workspaceFolder}`, `${env:NAME}`).
    pub root_folder: String,
    #[serde(deserialize_with = "string_or_list")]
    pub included_workspaces: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub excluded_workspaces: Vec<String>,
    pub label_format: String,
    pub flat: bool,
    pub tags_only: bool,
    pub grouped: bool,
    pub expanded: bool,
    pub status_bar: StatusBarMode,
    /// Rescan documents on open and save.
    pub auto_refresh: bool,
    pub show_tags_from_open_files_only: bool,
    /// Reveal the active document's node.
    pub track_file: bool,
    /// Search tool binary; `rg` from `PATH` when unset.
    pub ripgrep: Option<PathBuf>,
    pub ripgrep_args: String,
    pub ripgrep_max_buffer_mb: usize,
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tags: default_tags(),
            regex: DEFAULT_REGEX.to_string(),
            case_sensitive: true,
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
            root_folder: String::new(),
            included_workspaces: Vec::new(),
            excluded_workspaces: Vec::new(),
            label_format: DEFAULT_LABEL_FORMAT.to_string(),
            flat: false,
            tags_only: false,
            grouped: false,
            expanded: false,
            status_bar: StatusBarMode::Total,
            auto_refresh: true,
            show_tags_from_open_files_only: false,
            track_file: true,
            ripgrep: None,
            ripgrep_args: "--max-columns=1000".to_string(),
            ripgrep_max_buffer_mb: 200,
            debounce_ms: 200,
        }
    }
}

impl Config {
    /// The search pattern with the tag alternation substituted.
    pub fn search_pattern(&self) -> String {
        expand_pattern(&self.regex, &self.tags)
    }

    pub fn extractor(&self) -> Result<TagExtractor, regex::Error> {
        TagExtractor::new(&self.tags, self.case_sensitive)
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            flat: self.flat,
            tags_only: self.tags_only,
            grouped: self.grouped,
            expanded: self.expanded,
        }
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.flat = view.flat;
        self.tags_only = view.tags_only;
        self.grouped = view.grouped;
        self.expanded = view.expanded;
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Whether switching from `self` to `other` changes what a scan finds.
    /// Anything else only needs the tree rebuilt.
    pub fn affects_scan(&self, other: &Config) -> bool {
        self.tags != other.tags
            || self.regex != other.regex
            || self.case_sensitive != other.case_sensitive
            || self.include_globs != other.include_globs
            || self.exclude_globs != other.exclude_globs
            || self.root_folder != other.root_folder
            || self.included_workspaces != other.included_workspaces
            || self.excluded_workspaces != other.excluded_workspaces
            || self.ripgrep != other.ripgrep
            || self.ripgrep_args != other.ripgrep_args
            || self.ripgrep_max_buffer_mb != other.ripgrep_max_buffer_mb
            || self.show_tags_from_open_files_only != other.show_tags_from_open_files_only
    }
}

/// Accept either a list or a comma-separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(|part| part.trim().to_string()).collect(),
        StringOrList::Many(list) => list.into_iter().map(|item| item.trim().to_string()).collect::<Vec<_>>(),
    };
    Ok(items.into_iter().filter(|item| !item.is_empty()).collect())
}
