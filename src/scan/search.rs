//! Search services: the external `rg` process and an in-process walker.

use super::document::scan_document;
use crate::config::Config;
use crate::domain::RawMatch;
use crate::error::SearchError;
use crate::extract::search_regex;
use crate::store::GlobFilter;
use crate::utils::encoding::DEFAULT_SAMPLE_SIZE;
use crate::utils::{is_binary_file, read_document};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Everything a search service needs for one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Expanded search pattern (tag alternation already substituted).
    pub pattern: String,
    pub case_sensitive: bool,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    /// Raw extra arguments for the external tool.
    pub extra_args: Vec<String>,
    /// Upper bound on buffered tool output.
    pub max_buffer_bytes: usize,
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pattern: config.search_pattern(),
            case_sensitive: config.case_sensitive,
            include_globs: config.include_globs.clone(),
            exclude_globs: config.exclude_globs.clone(),
            extra_args: config.ripgrep_args.split_whitespace().map(str::to_string).collect(),
            max_buffer_bytes: config.ripgrep_max_buffer_mb.saturating_mul(1024 * 1024),
        }
    }
}

/// Finds raw tag hits below one root.
///
/// Implementations must be cheap to clone: the orchestrator moves a clone
/// into a task for every root it searches.
pub trait SearchService: Clone + Send + Sync + 'static {
    fn search(
        &self,
        root: &Path,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<Vec<RawMatch>, SearchError>> + Send;
}

/// Runs `rg --json` and parses its match records.
#[derive(Debug, Clone)]
pub struct RipgrepSearch {
    program: PathBuf,
}

impl Default for RipgrepSearch {
    fn default() -> Self {
        Self { program: PathBuf::from("rg") }
    }
}

impl RipgrepSearch {
    /// Use `program` instead of `rg` from `PATH`.
    pub fn new(program: Option<PathBuf>) -> Self {
        program.map(|program| Self { program }).unwrap_or_default()
    }
}

impl SearchService for RipgrepSearch {
    fn search(
        &self,
        root: &Path,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<Vec<RawMatch>, SearchError>> + Send {
        let program = self.program.clone();
        let args = ripgrep_args(root, options);
        let limit = options.max_buffer_bytes;
        async move { run_ripgrep(program, args, limit).await }
    }
}

/// Command-line arguments for one root.
pub fn ripgrep_args(root: &Path, options: &SearchOptions) -> Vec<String> {
    let mut args = vec!["--json".to_string()];
    args.extend(options.extra_args.iter().cloned());
    if !options.case_sensitive {
        args.push("-i".to_string());
    }
    for glob in &options.include_globs {
        args.push("--glob".to_string());
        args.push(glob.clone());
    }
    for glob in &options.exclude_globs {
        args.push("--glob".to_string());
        args.push(format!("!{}", glob));
    }
    args.push("-e".to_string());
    args.push(options.pattern.clone());
    args.push(root.to_string_lossy().to_string());
    args
}

async fn run_ripgrep(program: PathBuf, args: Vec<String>, limit: usize) -> Result<Vec<RawMatch>, SearchError> {
    let program_name = program.to_string_lossy().to_string();
    debug!(program = %program_name, ?args, "Running search");

    let mut child = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => SearchError::NotFound { program: program_name.clone() },
            _ => SearchError::Spawn { program: program_name.clone(), message: e.to_string() },
        })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| SearchError::Output("stdout was not captured".to_string()))?;
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    });

    let mut output = Vec::new();
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let n = stdout.read(&mut chunk).await.map_err(|e| SearchError::Output(e.to_string()))?;
        if n == 0 {
            break;
        }
        if output.len() + n > limit {
            let _ = child.kill().await;
            return Err(SearchError::BufferOverflow { limit });
        }
        output.extend_from_slice(&chunk[..n]);
    }

    let status = child.wait().await.map_err(|e| SearchError::Output(e.to_string()))?;
    let stderr = stderr_task.await.unwrap_or_default();

    match status.code() {
        // 1 means "no matches"
        Some(0) | Some(1) => parse_ripgrep_json(&output),
        code => Err(SearchError::Exit { code, stderr }),
    }
}

#[derive(Deserialize)]
struct RgMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Text or base64 bytes; only the text form is used.
#[derive(Deserialize)]
struct RgData {
    text: Option<String>,
}

#[derive(Deserialize)]
struct RgSubmatch {
    #[serde(rename = "match")]
    matched: RgData,
    start: usize,
}

#[derive(Deserialize)]
struct RgMatch {
    path: RgData,
    lines: RgData,
    line_number: Option<usize>,
    #[serde(default)]
    submatches: Vec<RgSubmatch>,
}

/// Parse `rg --json` output. Each submatch becomes one hit.
pub fn parse_ripgrep_json(output: &[u8]) -> Result<Vec<RawMatch>, SearchError> {
    let text = String::from_utf8_lossy(output);
    let mut matches = Vec::new();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let message: RgMessage =
            serde_json::from_str(line).map_err(|e| SearchError::Output(format!("{}: {}", e, line)))?;
        if message.kind != "match" {
            continue;
        }
        let record: RgMatch =
            serde_json::from_value(message.data).map_err(|e| SearchError::Output(e.to_string()))?;

        let (Some(file), Some(lines)) = (record.path.text, record.lines.text) else {
            debug!("Skipping non-UTF-8 search record");
            continue;
        };
        let line_text = lines.trim_end_matches(['\n', '\r']);
        // Missing line numbers are dropped later as malformed occurrences
        let line_number = record.line_number.unwrap_or(0);

        for submatch in record.submatches {
            let column = line_text
                .get(..submatch.start)
                .map_or(submatch.start, |prefix| prefix.chars().count())
                + 1;
            matches.push(RawMatch {
                file: file.clone(),
                line: line_number,
                column,
                line_text: line_text.to_string(),
                matched: submatch.matched.text.unwrap_or_default(),
            });
        }
    }

    Ok(matches)
}

/// In-process search: walks the root honouring `.gitignore` and scans each
/// text file with the compiled pattern. Extra tool arguments are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSearch;

impl SearchService for BuiltinSearch {
    fn search(
        &self,
        root: &Path,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<Vec<RawMatch>, SearchError>> + Send {
        let root = root.to_path_buf();
        let options = options.clone();
        async move {
            tokio::task::spawn_blocking(move || walk_and_scan(&root, &options))
                .await
                .map_err(|e| SearchError::Output(e.to_string()))?
        }
    }
}

fn walk_and_scan(root: &Path, options: &SearchOptions) -> Result<Vec<RawMatch>, SearchError> {
    let pattern =
        search_regex(&options.pattern, options.case_sensitive).map_err(|e| SearchError::Pattern(e.to_string()))?;
    let globs = GlobFilter::new(&options.include_globs, &options.exclude_globs);

    if !root.exists() {
        return Err(SearchError::Exit {
            code: Some(2),
            stderr: format!("{}: No such file or directory", root.display()),
        });
    }

    // Skip known large directories unconditionally
    let dir_filter = |entry: &ignore::DirEntry| -> bool {
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        match entry.file_name().to_str() {
            Some(name) if is_dir => !matches!(name, "node_modules" | "__pycache__" | ".git" | ".venv" | "venv"),
            _ => true,
        }
    };

    let mut builder = WalkBuilder::new(root);
    builder.hidden(false).parents(true).filter_entry(dir_filter);

    let mut matches = Vec::new();
    let mut bytes = 0usize;
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Walk error under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let file = path.to_string_lossy().to_string();
        if !globs.is_included(&file) || is_binary_file(path, DEFAULT_SAMPLE_SIZE) {
            continue;
        }

        let text = match read_document(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping unreadable file {}: {:#}", file, e);
                continue;
            }
        };

        for hit in scan_document(&file, &text, &pattern) {
            bytes += hit.line_text.len();
            if bytes > options.max_buffer_bytes {
                return Err(SearchError::BufferOverflow { limit: options.max_buffer_bytes });
            }
            matches.push(hit);
        }
    }

    Ok(matches)
}

/// Either engine, chosen at runtime.
#[derive(Debug, Clone)]
pub enum SearchEngine {
    Ripgrep(RipgrepSearch),
    Builtin(BuiltinSearch),
}

impl SearchService for SearchEngine {
    fn search(
        &self,
        root: &Path,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<Vec<RawMatch>, SearchError>> + Send {
        let engine = self.clone();
        let root = root.to_path_buf();
        let options = options.clone();
        async move {
            match engine {
                Self::Ripgrep(rg) => rg.search(&root, &options).await,
                Self::Builtin(builtin) => builtin.search(&root, &options).await,
            }
        }
    }
}
