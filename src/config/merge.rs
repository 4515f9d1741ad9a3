//! CLI overrides, applied last

use super::Config;
use crate::domain::StatusBarMode;
use std::path::PathBuf;

/// Values given on the command line. `None` leaves the config untouched.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub tags: Option<Vec<String>>,
    pub regex: Option<String>,
    pub include_globs: Option<Vec<String>>,
    pub exclude_globs: Option<Vec<String>>,
    pub case_sensitive: Option<bool>,
    pub root_folder: Option<String>,
    pub label_format: Option<String>,
    pub flat: Option<bool>,
    pub tags_only: Option<bool>,
    pub grouped: Option<bool>,
    pub expanded: Option<bool>,
    pub status_bar: Option<StatusBarMode>,
    pub ripgrep: Option<PathBuf>,
    pub ripgrep_args: Option<String>,
}

pub fn merge_cli_with_config(mut config: Config, cli: &CliOverrides) -> Config {
    if let Some(tags) = cli.tags.as_ref().filter(|t| !t.is_empty()) {
        config.tags = tags.clone();
    }
    if let Some(regex) = &cli.regex {
        config.regex = regex.clone();
    }
    if let Some(globs) = &cli.include_globs {
        config.include_globs.extend(globs.iter().cloned());
    }
    if let Some(globs) = &cli.exclude_globs {
        config.exclude_globs.extend(globs.iter().cloned());
    }
    if let Some(case_sensitive) = cli.case_sensitive {
        config.case_sensitive = case_sensitive;
    }
    if let Some(root) = &cli.root_folder {
        config.root_folder = root.clone();
    }
    if let Some(format) = &cli.label_format {
        config.label_format = format.clone();
    }
    if let Some(flat) = cli.flat {
        config.flat = flat;
    }
    if let Some(tags_only) = cli.tags_only {
        config.tags_only = tags_only;
    }
    if let Some(grouped) = cli.grouped {
        config.grouped = grouped;
    }
    if let Some(expanded) = cli.expanded {
        config.expanded = expanded;
    }
    if let Some(mode) = cli.status_bar {
        config.status_bar = mode;
    }
    if let Some(program) = &cli.ripgrep {
        config.ripgrep = Some(program.clone());
    }
    if let Some(args) = &cli.ripgrep_args {
        config.ripgrep_args = args.clone();
    }
    config
}
