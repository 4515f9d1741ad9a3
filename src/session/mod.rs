//! Host-facing session: owns the match store, the scan state machine and
//! the current tree, and turns commands and document events into scans and
//! debounced tree rebuilds.
//!
//! A session is driven from one task. Call [`TagTreeSession::next_update`]
//! in a loop (or [`TagTreeSession::run_until_idle`]) to let scans progress
//! and pending rebuilds fire.

pub mod debounce;
pub mod status;

pub use debounce::Debouncer;
pub use status::{interrupted_status, ranked_counts, scanning_status, status_text, StatusText};

use crate::config::{resolve_search_roots, Config};
use crate::domain::{Occurrence, StatusBarMode, TagCounts, ViewState, WorkspaceFolder};
use crate::extract::{search_regex, TagExtractor};
use crate::scan::{
    scan_document, ScanOrchestrator, ScanOutcome, ScanPlan, ScanState, SearchOptions, SearchService, StepReport,
};
use crate::store::{GlobFilter, MatchStore};
use crate::tree::{build_tree, BuildConfig, ExpansionState, TreeNode};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// User-invokable commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    StopScan,
    SetFilter(String),
    ClearFilter,
    ExpandAll,
    CollapseAll,
    GroupByTag,
    Ungroup,
    ShowFlat,
    ShowTagsOnly,
    ShowTree,
    AddTag(String),
    RemoveTag(String),
    ToggleStatusBarMode,
}

/// A message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Info(message) | Self::Error(message) => message,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What one [`TagTreeSession::next_update`] call did.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Scan(StepReport),
    TreeRebuilt,
}

pub struct TagTreeSession<S> {
    config: Config,
    workspaces: Vec<WorkspaceFolder>,
    roots: Vec<PathBuf>,
    extractor: Arc<TagExtractor>,
    document_pattern: Option<Regex>,
    globs: GlobFilter,
    store: MatchStore,
    expansion: ExpansionState,
    view: ViewState,
    filter: Option<String>,
    orchestrator: ScanOrchestrator<S>,
    debouncer: Debouncer,
    open_documents: BTreeMap<String, String>,
    tree: TreeNode,
    notices: Vec<Notice>,
}

impl<S: SearchService> TagTreeSession<S> {
    pub fn new(config: Config, workspaces: Vec<WorkspaceFolder>, service: S) -> Result<Self> {
        let extractor = config.extractor().context("Failed to compile tag vocabulary")?;
        let mut session = Self {
            view: config.view(),
            debouncer: Debouncer::new(config.debounce()),
            globs: GlobFilter::new(&config.include_globs, &config.exclude_globs),
            extractor: Arc::new(extractor),
            document_pattern: None,
            config,
            workspaces,
            roots: Vec::new(),
            store: MatchStore::new(),
            expansion: ExpansionState::new(),
            filter: None,
            orchestrator: ScanOrchestrator::new(service),
            open_documents: BTreeMap::new(),
            tree: TreeNode::default(),
            notices: Vec::new(),
        };
        session.document_pattern = session.compile_document_pattern();
        session.rebuild_tree_now();
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Roots searched by the last rebuild.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn scan_state(&self) -> ScanState {
        self.orchestrator.state()
    }

    pub fn is_scanning(&self) -> bool {
        self.orchestrator.is_scanning()
    }

    /// No scan running and no rebuild pending.
    pub fn is_idle(&self) -> bool {
        !self.orchestrator.is_scanning() && !self.debouncer.is_pending()
    }

    fn compile_document_pattern(&mut self) -> Option<Regex> {
        let source = self.config.search_pattern();
        match search_regex(&source, self.config.case_sensitive) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Invalid search pattern {:?}: {}", source, e);
                self.notices.push(Notice::Error(format!("Invalid search pattern: {}", e)));
                None
            }
        }
    }

    fn recompile(&mut self) -> Result<()> {
        let extractor = self.config.extractor().context("Failed to compile tag vocabulary")?;
        self.extractor = Arc::new(extractor);
        self.globs = GlobFilter::new(&self.config.include_globs, &self.config.exclude_globs);
        self.document_pattern = self.compile_document_pattern();
        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        debug!(?command, "Executing command");
        match command {
            Command::Refresh => self.rebuild(),
            Command::StopScan => self.stop_scan(),
            Command::SetFilter(text) => {
                let text = text.trim();
                self.filter = (!text.is_empty()).then(|| text.to_string());
                self.schedule_tree();
            }
            Command::ClearFilter => {
                self.filter = None;
                self.schedule_tree();
            }
            Command::ExpandAll => self.set_all_expanded(true),
            Command::CollapseAll => self.set_all_expanded(false),
            Command::GroupByTag => self.update_view(|view| view.grouped = true),
            Command::Ungroup => self.update_view(|view| view.grouped = false),
            Command::ShowFlat => self.update_view(|view| {
                view.flat = true;
                view.tags_only = false;
            }),
            Command::ShowTagsOnly => self.update_view(|view| {
                view.flat = false;
                view.tags_only = true;
            }),
            Command::ShowTree => self.update_view(|view| {
                view.flat = false;
                view.tags_only = false;
            }),
            Command::AddTag(tag) => {
                let tag = tag.trim().to_string();
                if tag.is_empty() || self.config.tags.contains(&tag) {
                    return Ok(());
                }
                let mut config = self.config.clone();
                config.tags.push(tag);
                self.reconfigure(config)?;
            }
            Command::RemoveTag(tag) => {
                let mut config = self.config.clone();
                config.tags.retain(|t| t != tag.trim());
                if config.tags.len() != self.config.tags.len() {
                    self.reconfigure(config)?;
                }
            }
            Command::ToggleStatusBarMode => {
                self.config.status_bar = match self.config.status_bar {
                    StatusBarMode::Total => StatusBarMode::TopThree,
                    _ => StatusBarMode::Total,
                };
            }
        }
        Ok(())
    }

    fn set_all_expanded(&mut self, expanded: bool) {
        self.expansion.clear();
        self.update_view(|view| view.expanded = expanded);
    }

    fn update_view(&mut self, change: impl FnOnce(&mut ViewState)) {
        change(&mut self.view);
        self.config.set_view(self.view);
        self.schedule_tree();
    }

    /// Rescan everything: resolve roots, clear the store and the filter and
    /// start the scan.
    pub fn rebuild(&mut self) {
        self.filter = None;
        self.roots = match resolve_search_roots(&self.config, &self.workspaces) {
            Ok(roots) => roots,
            Err(e) => {
                warn!("{}", e);
                self.notices.push(Notice::Error(e.to_string()));
                Vec::new()
            }
        };

        let roots = if self.config.show_tags_from_open_files_only { Vec::new() } else { self.roots.clone() };
        let plan = ScanPlan {
            options: SearchOptions::from_config(&self.config),
            globs: self.globs.clone(),
            extractor: Arc::clone(&self.extractor),
        };
        info!(roots = roots.len(), "Rebuilding");
        if self.orchestrator.start(roots, plan, &mut self.store).is_some() {
            self.on_scan_finished();
        }
        self.schedule_tree();
    }

    pub fn stop_scan(&mut self) {
        if self.orchestrator.stop(&mut self.store) {
            self.notices.push(Notice::Info("Scan interrupted, showing partial results".to_string()));
            self.schedule_tree();
        }
    }

    fn on_scan_finished(&mut self) {
        let open: Vec<(String, String)> =
            self.open_documents.iter().map(|(path, text)| (path.clone(), text.clone())).collect();
        for (path, text) in open {
            self.refresh_document(&path, &text);
        }
        self.schedule_tree();
    }

    fn apply_step(&mut self, step: crate::scan::RootResult) -> StepReport {
        let report = self.orchestrator.apply(step, &mut self.store);
        if let Some(e) = &report.error {
            self.notices.push(Notice::Error(format!("{}: {}", report.root.display(), e.user_message())));
        }
        if report.finished.is_some() {
            self.on_scan_finished();
        } else {
            self.schedule_tree();
        }
        report
    }

    /// Re-run the pattern over one document's text and replace its entries.
    fn refresh_document(&mut self, path: &str, text: &str) {
        if !self.globs.is_included(path) {
            if self.store.remove_file(path) > 0 {
                debug!(path, "Removed entries of excluded document");
            }
            return;
        }
        let Some(pattern) = self.document_pattern.as_ref() else {
            return;
        };
        let occurrences: Vec<Occurrence> = scan_document(path, text, pattern)
            .into_iter()
            .map(|hit| Occurrence::classify(hit, &self.extractor))
            .collect();
        debug!(path, occurrences = occurrences.len(), "Refreshed document");
        self.store.replace_for_file(path, occurrences);
        self.store.apply_overlap_trim();
    }

    pub fn document_opened(&mut self, path: impl Into<String>, text: impl Into<String>) {
        if !self.config.auto_refresh {
            return;
        }
        let path = path.into();
        let text = text.into();
        self.refresh_document(&path, &text);
        self.schedule_tree();
        self.open_documents.insert(path, text);
    }

    pub fn document_saved(&mut self, path: impl Into<String>, text: impl Into<String>) {
        let path = path.into();
        let text = text.into();
        if Path::new(&path).file_name().is_some_and(|name| name == "settings.json") {
            return;
        }
        if let Some(buffer) = self.open_documents.get_mut(&path) {
            *buffer = text.clone();
        }
        if self.config.auto_refresh {
            self.refresh_document(&path, &text);
            self.schedule_tree();
        }
    }

    pub fn document_closed(&mut self, path: &str) {
        self.open_documents.remove(path);
        if self.config.show_tags_from_open_files_only && self.store.remove_file(path) > 0 {
            self.schedule_tree();
        }
    }

    pub fn file_deleted(&mut self, path: &str) {
        self.open_documents.remove(path);
        if self.store.remove_file(path) > 0 {
            self.schedule_tree();
        }
    }

    pub fn set_workspaces(&mut self, workspaces: Vec<WorkspaceFolder>) {
        self.workspaces = workspaces;
        self.rebuild();
    }

    /// Swap in a new configuration snapshot. Changes to the scan scope
    /// trigger a rescan, anything else only a tree rebuild.
    pub fn reconfigure(&mut self, config: Config) -> Result<()> {
        let rescan = self.config.affects_scan(&config);
        self.config = config;
        self.view = self.config.view();
        self.debouncer.set_delay(self.config.debounce());
        self.recompile()?;
        if rescan {
            self.rebuild();
        } else {
            self.schedule_tree();
        }
        Ok(())
    }

    /// Record a node being expanded or collapsed by the user.
    pub fn set_expanded(&mut self, key: impl Into<String>, expanded: bool) {
        self.expansion.set(key, expanded);
    }

    fn schedule_tree(&mut self) {
        self.debouncer.trigger();
    }

    /// Build the tree from the store right away.
    pub fn rebuild_tree_now(&mut self) {
        let roots = self.display_roots();
        let config = BuildConfig {
            extractor: &self.extractor,
            roots: &roots,
            view: self.view,
            label_format: &self.config.label_format,
            filter: self.filter.as_deref(),
        };
        self.tree = build_tree(self.store.iter(), &config, &self.expansion);
        debug!(leaves = self.tree.leaf_count(), "Tree rebuilt");
    }

    /// Roots that tree paths are shown relative to: the search roots, or the
    /// workspace folders when nothing is searched.
    fn display_roots(&self) -> Vec<PathBuf> {
        if self.roots.is_empty() {
            self.workspaces.iter().map(|ws| ws.path.clone()).collect()
        } else {
            self.roots.clone()
        }
    }

    /// Wait for the next scan step or debounced rebuild and apply it.
    ///
    /// Never resolves while idle; check [`Self::is_idle`] first.
    pub async fn next_update(&mut self) -> Update {
        let scanning = self.orchestrator.is_scanning();
        tokio::select! {
            step = self.orchestrator.next_step(), if scanning => Update::Scan(self.apply_step(step)),
            _ = self.debouncer.fired() => {
                self.rebuild_tree_now();
                Update::TreeRebuilt
            }
        }
    }

    /// Drive the session until no scan runs and no rebuild is pending.
    pub async fn run_until_idle(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while !self.is_idle() {
            updates.push(self.next_update().await);
        }
        updates
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn tag_counts(&self) -> TagCounts {
        self.store.tag_counts()
    }

    pub fn has_content(&self) -> bool {
        self.tree.has_content()
    }

    /// The node to reveal for the active document, when tracking is on.
    pub fn reveal(&self, path: &str) -> Option<&TreeNode> {
        if !self.config.track_file {
            return None;
        }
        self.tree.find_by_path(path)
    }

    pub fn status(&self) -> StatusText {
        if self.orchestrator.is_scanning() {
            return scanning_status();
        }
        match self.orchestrator.last_outcome() {
            Some(ScanOutcome::Interrupted) => interrupted_status(),
            _ => status_text(&self.tag_counts(), self.config.status_bar),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawMatch;
    use crate::error::SearchError;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves whatever the test put in `results` at the time of the call,
    /// after `delay`.
    #[derive(Clone, Default)]
    struct FakeSearch {
        results: Arc<Mutex<HashMap<PathBuf, Result<Vec<RawMatch>, SearchError>>>>,
        delay: Duration,
    }

    impl FakeSearch {
        fn set(&self, root: &str, result: Result<Vec<RawMatch>, SearchError>) {
            self.results.lock().unwrap().insert(PathBuf::from(root), result);
        }
    }

    impl SearchService for FakeSearch {
        fn search(
            &self,
            root: &Path,
            _options: &SearchOptions,
        ) -> impl Future<Output = Result<Vec<RawMatch>, SearchError>> + Send {
            let result = self.results.lock().unwrap().get(root).cloned().unwrap_or(Ok(Vec::new()));
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                result
            }
        }
    }

    const LINE: &str = "    // TODO first  // FIXME second";

    fn same_line_hits() -> Vec<RawMatch> {
        [5, 20]
            .iter()
            .map(|&column| RawMatch {
                file: "/w/src/lib.rs".to_string(),
                line: 7,
                column,
                line_text: LINE.to_string(),
                matched: String::new(),
            })
            .collect()
    }

    fn session(service: FakeSearch, config: Config) -> TagTreeSession<FakeSearch> {
        TagTreeSession::new(config, vec![WorkspaceFolder::new("w", "/w")], service).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_tags_on_one_line_end_to_end() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let config = Config { flat: true, ..Default::default() };
        let mut session = session(service.clone(), config);

        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        assert_eq!(session.store().len(), 2);
        let tree = session.tree();
        assert_eq!(tree.children().len(), 1);
        let file = &tree.children()[0];
        assert_eq!(file.label(), "src/lib.rs");
        let labels: Vec<&str> = file.children().iter().map(TreeNode::label).collect();
        assert_eq!(labels, vec!["TODO first", "FIXME second"]);

        service.set("/w", Ok(Vec::new()));
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert!(session.store().is_empty());
        assert!(!session.has_content());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_is_idempotent() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        let first = session.tree().clone();
        session.rebuild_tree_now();
        assert_eq!(session.tree(), &first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_root_becomes_notice() {
        let service = FakeSearch::default();
        service.set("/w", Err(SearchError::NotFound { program: "rg".into() }));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        let notices = session.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message().contains("rg"));
        assert!(!session.has_content());
        assert!(session.take_notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolvable_root_yields_empty_tree() {
        let config = Config { root_folder: "${workspaceFolder}".to_string(), ..Default::default() };
        let mut session = TagTreeSession::new(config, vec![], FakeSearch::default()).unwrap();
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        assert!(session.roots().is_empty());
        assert!(!session.has_content());
        assert!(matches!(session.take_notices().as_slice(), [Notice::Error(_)]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_document_replaces_its_entries() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        session.document_saved("/w/src/lib.rs", "fn main() {}\n// XXX only one now\n");
        session.run_until_idle().await;
        let tags: Vec<&str> = session.store().iter().map(|o| o.tag.as_str()).collect();
        assert_eq!(tags, vec!["XXX"]);

        session.document_saved("/w/src/lib.rs", "fn main() {}\n");
        session.run_until_idle().await;
        assert!(session.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_json_saves_are_ignored() {
        let mut session = session(FakeSearch::default(), Config::default());
        session.document_saved("/w/.vscode/settings.json", "// TODO not a tag\n");
        assert!(session.is_idle());
        assert!(session.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_files_only() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let config = Config { show_tags_from_open_files_only: true, ..Default::default() };
        let mut session = session(service, config);

        session.document_opened("/w/a.py", "# TODO open file\n");
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert_eq!(session.store().files().collect::<Vec<_>>(), vec!["/w/a.py"]);

        session.document_closed("/w/a.py");
        session.run_until_idle().await;
        assert!(session.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_excluded_document_is_dropped() {
        let config = Config { exclude_globs: vec!["**/*.md".to_string()], ..Default::default() };
        let mut session = session(FakeSearch::default(), config);
        session.document_opened("/w/notes.md", "- [ ] task\n// TODO\n");
        session.run_until_idle().await;
        assert!(session.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_commands_and_filter() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        session.execute(Command::GroupByTag).unwrap();
        session.run_until_idle().await;
        assert!(matches!(session.tree().children()[0], TreeNode::Tag { .. }));
        assert!(session.config().grouped);

        session.execute(Command::SetFilter("second".to_string())).unwrap();
        session.run_until_idle().await;
        assert_eq!(session.tree().leaf_count(), 1);
        assert_eq!(session.tree().leaves()[0].tag, "FIXME");

        session.execute(Command::ClearFilter).unwrap();
        session.execute(Command::Ungroup).unwrap();
        session.execute(Command::ExpandAll).unwrap();
        session.run_until_idle().await;
        assert_eq!(session.tree().find_by_path("/w/src").and_then(TreeNode::expanded), Some(true));
        assert_eq!(session.tree().leaf_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_changes_coalesce_into_one_rebuild() {
        let mut session = session(FakeSearch::default(), Config::default());
        for text in ["// TODO a\n", "// TODO b\n", "// TODO c\n"] {
            session.document_saved("/w/a.rs", text);
        }
        let updates = session.run_until_idle().await;
        assert_eq!(updates, vec![Update::TreeRebuilt]);
        assert_eq!(session.tree().leaves()[0].label, "TODO c");
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_and_remove_tag_rescan() {
        let service = FakeSearch::default();
        let mut session = session(service, Config::default());
        session.execute(Command::AddTag("NOTE".to_string())).unwrap();
        assert!(session.config().tags.contains(&"NOTE".to_string()));
        session.run_until_idle().await;

        session.document_saved("/w/a.rs", "// NOTE remember\n");
        session.run_until_idle().await;
        assert_eq!(session.tag_counts().get("NOTE"), Some(&1));

        session.execute(Command::RemoveTag("NOTE".to_string())).unwrap();
        assert!(!session.config().tags.contains(&"NOTE".to_string()));
        session.run_until_idle().await;
        assert!(session.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_and_toggle() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        assert_eq!(session.status(), scanning_status());

        session.run_until_idle().await;
        assert_eq!(session.status().text, "2");

        session.execute(Command::ToggleStatusBarMode).unwrap();
        assert_eq!(session.status().text, "FIXME:1 TODO:1");
        session.execute(Command::ToggleStatusBarMode).unwrap();
        assert_eq!(session.config().status_bar, StatusBarMode::Total);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_scan_marks_status_interrupted() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.execute(Command::StopScan).unwrap();
        session.run_until_idle().await;

        assert_eq!(session.scan_state(), ScanState::Idle);
        assert_eq!(session.status(), interrupted_status());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_honours_track_file() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service.clone(), Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert!(session.reveal("/w/src/lib.rs").is_some());

        let config = Config { track_file: false, ..Default::default() };
        session.reconfigure(config).unwrap();
        session.run_until_idle().await;
        assert!(session.reveal("/w/src/lib.rs").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_file_leaves_tree() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert!(session.has_content());

        session.file_deleted("/w/src/lib.rs");
        session.run_until_idle().await;
        assert!(session.store().is_empty());
        assert!(session.tree().find_by_path("/w/src/lib.rs").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_workspaces_rescans_new_roots() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        service.set(
            "/v",
            Ok(vec![RawMatch {
                file: "/v/main.py".to_string(),
                line: 1,
                column: 1,
                line_text: "# HACK skip".to_string(),
                matched: "# HACK".to_string(),
            }]),
        );
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        session.set_workspaces(vec![WorkspaceFolder::new("v", "/v")]);
        session.run_until_idle().await;
        assert_eq!(session.roots(), &[PathBuf::from("/v")]);
        assert_eq!(session.tag_counts().get("HACK"), Some(&1));
        assert_eq!(session.tag_counts().get("TODO"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expansion_survives_rebuild() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert_eq!(session.tree().find_by_path("/w/src").and_then(TreeNode::expanded), Some(false));

        session.set_expanded("/w/src", true);
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert_eq!(session.tree().find_by_path("/w/src").and_then(TreeNode::expanded), Some(true));

        session.execute(Command::CollapseAll).unwrap();
        session.run_until_idle().await;
        assert_eq!(session.tree().find_by_path("/w/src").and_then(TreeNode::expanded), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_files_only_tree_is_relative_to_workspace() {
        let config = Config { show_tags_from_open_files_only: true, ..Default::default() };
        let workspaces = vec![WorkspaceFolder::new("w", "/home/dev/w")];
        let mut session = TagTreeSession::new(config, workspaces, FakeSearch::default()).unwrap();
        session.execute(Command::Refresh).unwrap();
        session.document_opened("/home/dev/w/src/a.rs", "// TODO x\n");
        session.run_until_idle().await;

        assert!(session.roots().is_empty());
        let top = &session.tree().children()[0];
        assert_eq!(top.label(), "src");
        assert_eq!(top.children()[0].label(), "a.rs");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_during_scan_keeps_both_results() {
        let service = FakeSearch { delay: Duration::from_secs(1), ..Default::default() };
        service.set(
            "/w",
            Ok(vec![RawMatch {
                file: "/w/b.rs".to_string(),
                line: 1,
                column: 1,
                line_text: "// TODO from scan".to_string(),
                matched: "// TODO".to_string(),
            }]),
        );
        let mut session = session(service, Config::default());
        session.execute(Command::Refresh).unwrap();
        assert!(session.is_scanning());

        session.document_saved("/w/a.rs", "// FIXME from save\n");
        assert!(session.is_scanning());
        session.run_until_idle().await;

        assert_eq!(session.store().files().collect::<Vec<_>>(), vec!["/w/a.rs", "/w/b.rs"]);
        assert_eq!(session.tag_counts().get("FIXME"), Some(&1));
        assert_eq!(session.tag_counts().get("TODO"), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_clears_filter() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service, Config::default());
        session.execute(Command::SetFilter("second".to_string())).unwrap();
        assert_eq!(session.filter(), Some("second"));

        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert_eq!(session.filter(), None);
        assert_eq!(session.tree().leaf_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opened_document_ignored_without_auto_refresh() {
        let config = Config { auto_refresh: false, ..Default::default() };
        let mut session = session(FakeSearch::default(), config);
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        session.document_opened("/w/a.rs", "// TODO opened\n");
        session.run_until_idle().await;
        assert!(session.store().is_empty());

        // Not tracked, so a finished rescan does not pick it up either
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_document_events_outside_runtime() {
        let mut session = session(FakeSearch::default(), Config::default());
        session.document_saved("/w/a.rs", "// TODO sync\n");
        session.document_opened("/w/b.rs", "// FIXME sync\n");
        assert_eq!(session.store().len(), 2);
        assert!(!session.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_only_reconfigure_does_not_rescan() {
        let service = FakeSearch::default();
        service.set("/w", Ok(same_line_hits()));
        let mut session = session(service.clone(), Config::default());
        session.execute(Command::Refresh).unwrap();
        session.run_until_idle().await;

        service.set("/w", Ok(Vec::new()));
        let config = Config { label_format: "${line}:${column} ${tag}".to_string(), ..Default::default() };
        session.reconfigure(config).unwrap();
        assert!(!session.is_scanning());
        session.run_until_idle().await;
        assert_eq!(session.tree().leaves()[0].label, "7:5 TODO");
    }
}
