//! Search-root resolution from the root template and the open workspaces.

use super::Config;
use crate::domain::WorkspaceFolder;
use crate::error::RootsError;
use crate::store::GlobFilter;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::PathBuf;

pub const WORKSPACE_FOLDER: &str = "${workspaceFolder}";

static ENV_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(?:env:)?([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env regex"));

/// Roots to search, in order.
///
/// A `root_folder` using `${workspaceFolder}` yields one root per workspace
/// folder; any other non-empty `root_folder` is a single root. Environment
/// references are substituted, unset variables becoming empty. Configured
/// roots are kept when their path passes the workspace globs. With no root
/// configured, the workspace folders whose names pass the workspace globs
/// are searched, unless only open files are shown.
pub fn resolve_search_roots(config: &Config, workspaces: &[WorkspaceFolder]) -> Result<Vec<PathBuf>, RootsError> {
    let template = config.root_folder.trim();

    let expanded: Vec<String> = if template.contains(WORKSPACE_FOLDER) {
        if workspaces.is_empty() {
            return Err(RootsError::NoWorkspace { template: template.to_string() });
        }
        workspaces
            .iter()
            .map(|ws| template.replace(WORKSPACE_FOLDER, &ws.path.to_string_lossy()))
            .collect()
    } else if template.is_empty() {
        Vec::new()
    } else {
        vec![template.to_string()]
    };

    let roots: Vec<PathBuf> = expanded
        .iter()
        .map(|root| substitute_env(root))
        .filter(|root| !root.trim().is_empty())
        .map(PathBuf::from)
        .collect();

    let filter = GlobFilter::new(&config.included_workspaces, &config.excluded_workspaces);
    if !roots.is_empty() || config.show_tags_from_open_files_only {
        return Ok(roots.into_iter().filter(|root| filter.is_included(&root.to_string_lossy())).collect());
    }

    Ok(workspaces
        .iter()
        .filter(|ws| filter.is_included(&ws.name))
        .map(|ws| ws.path.clone())
        .collect())
}

/// Replace `${env:NAME}` and `${NAME}` with the variable's value.
pub fn substitute_env(text: &str) -> String {
    ENV_VAR_RE
        .replace_all(text, |caps: &Captures<'_>| std::env::var(&caps[1]).unwrap_or_default())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspaces() -> Vec<WorkspaceFolder> {
        vec![WorkspaceFolder::new("app", "/work/app"), WorkspaceFolder::new("docs", "/work/docs")]
    }

    #[test]
    fn test_workspace_folder_template_expands_per_workspace() {
        let config = Config { root_folder: "${workspaceFolder}/src".to_string(), ..Default::default() };
        let roots = resolve_search_roots(&config, &workspaces()).unwrap();
        assert_eq!(roots, vec![PathBuf::from("/work/app/src"), PathBuf::from("/work/docs/src")]);
    }

    #[test]
    fn test_workspace_folder_template_without_workspace() {
        let config = Config { root_folder: "${workspaceFolder}".to_string(), ..Default::default() };
        assert!(matches!(
            resolve_search_roots(&config, &[]),
            Err(RootsError::NoWorkspace { .. })
        ));
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("TAG_TREE_ROOTS_TEST_DIR", "/from/env");
        let config = Config { root_folder: "${env:TAG_TREE_ROOTS_TEST_DIR}/x".to_string(), ..Default::default() };
        let roots = resolve_search_roots(&config, &[]).unwrap();
        assert_eq!(roots, vec![PathBuf::from("/from/env/x")]);

        assert_eq!(substitute_env("${TAG_TREE_ROOTS_TEST_DIR}"), "/from/env");
        assert_eq!(substitute_env("a${TAG_TREE_ROOTS_TEST_UNSET}b"), "ab");
    }

    #[test]
    fn test_falls_back_to_filtered_workspaces() {
        let config = Config { excluded_workspaces: vec!["do*".to_string()], ..Default::default() };
        let roots = resolve_search_roots(&config, &workspaces()).unwrap();
        assert_eq!(roots, vec![PathBuf::from("/work/app")]);

        let config = Config { included_workspaces: vec!["docs".to_string()], ..Default::default() };
        let roots = resolve_search_roots(&config, &workspaces()).unwrap();
        assert_eq!(roots, vec![PathBuf::from("/work/docs")]);
    }

    #[test]
    fn test_configured_roots_pass_workspace_globs() {
        let config = Config {
            root_folder: "${workspaceFolder}/src".to_string(),
            excluded_workspaces: vec!["**/docs/**".to_string()],
            ..Default::default()
        };
        let roots = resolve_search_roots(&config, &workspaces()).unwrap();
        assert_eq!(roots, vec![PathBuf::from("/work/app/src")]);

        let config = Config {
            root_folder: "/work/app".to_string(),
            included_workspaces: vec!["/other/*".to_string()],
            ..Default::default()
        };
        assert!(resolve_search_roots(&config, &workspaces()).unwrap().is_empty());
    }

    #[test]
    fn test_open_files_only_skips_workspace_fallback() {
        let config = Config { show_tags_from_open_files_only: true, ..Default::default() };
        assert!(resolve_search_roots(&config, &workspaces()).unwrap().is_empty());
    }
}
