//! Config file loading

use super::Config;
use anyhow::{Context, Result};
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::fs;
use std::path::Path;

/// Prefix of environment overrides, e.g. `TAG_TREE_CASE_SENSITIVE=false`.
pub const ENV_PREFIX: &str = "TAG_TREE_";

/// Section name honoured when the settings are nested in a larger file.
const NESTED_SECTION: &str = "tag-tree";

/// Load the file layer and apply environment overrides on top.
///
/// An explicit `config_path` must parse; an auto-discovered file that does
/// not parse is skipped with a warning.
pub fn load_config(workspace_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config = load_file_config(workspace_root, config_path)?;
    apply_env_overrides(config)
}

/// Layer `TAG_TREE_*` environment variables over `config`.
pub fn apply_env_overrides(config: Config) -> Result<Config> {
    Figment::from(Serialized::defaults(config))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .with_context(|| format!("Invalid {}* environment override", ENV_PREFIX))
}

fn load_file_config(workspace_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(workspace_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", config_file.display());
            Ok(config)
        }
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring auto-discovered config {}: {:#}", config_file.display(), e);
            Ok(Config::default())
        }
    }
}

/// Parse TOML config, supporting a nested `[tag-tree]` section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(NESTED_SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, supporting a nested `tag-tree` mapping.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(NESTED_SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(workspace_root: &Path) -> Option<std::path::PathBuf> {
    let candidates = [
        "tag-tree.toml",
        ".tag-tree.toml",
        "tag-tree.yml",
        ".tag-tree.yml",
        "tag-tree.yaml",
        ".tag-tree.yaml",
    ];

    candidates.iter().map(|candidate| workspace_root.join(candidate)).find(|path| path.exists())
}
