//! Shared CLI utilities.

use crate::config::{load_config, merge_cli_with_config, CliOverrides, Config};
use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Options that shape the effective configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Config file (TOML or YAML); auto-discovered in the first path when omitted
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tags to look for (comma-separated), replacing the configured list
    #[arg(short = 't', long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Search pattern template; $TAGS expands to the tag alternation
    #[arg(long, value_name = "REGEX")]
    pub regex: Option<String>,

    /// Only report files matching these globs (comma-separated)
    #[arg(short = 'i', long, value_name = "GLOBS")]
    pub include_glob: Option<String>,

    /// Skip files matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Match tags regardless of case
    #[arg(long)]
    pub case_insensitive: bool,
}

impl ConfigArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            tags: parse_csv(&self.tags),
            regex: self.regex.clone(),
            include_globs: parse_csv(&self.include_glob),
            exclude_globs: parse_csv(&self.exclude_glob),
            case_sensitive: self.case_insensitive.then_some(false),
            ..Default::default()
        }
    }

    /// File, then environment, then `overrides`.
    pub fn load(&self, workspace_root: &Path, overrides: &CliOverrides) -> Result<Config> {
        let config = load_config(workspace_root, self.config.as_deref())?;
        Ok(merge_cli_with_config(config, overrides))
    }
}
