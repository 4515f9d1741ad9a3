//! Scan command implementation

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info};

use super::utils::ConfigArgs;
use crate::domain::{StatusBarMode, WorkspaceFolder};
use crate::scan::{BuiltinSearch, RipgrepSearch, SearchEngine};
use crate::session::{Command, TagTreeSession};
use crate::tree::{render_json, render_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// Spawn ripgrep
    Ripgrep,
    /// In-process directory walk
    Builtin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Tree,
    Json,
    Status,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Workspace folders to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Root expression overriding the workspace folders (supports ${workspaceFolder} and ${env:NAME})
    #[arg(long, value_name = "EXPR")]
    pub root_folder: Option<String>,

    /// Leaf label template, e.g. "${line}: ${tag} ${after}"
    #[arg(long, value_name = "TEMPLATE")]
    pub label_format: Option<String>,

    /// List files without folders
    #[arg(long, conflicts_with = "tags_only")]
    pub flat: bool,

    /// List occurrences without files or folders
    #[arg(long)]
    pub tags_only: bool,

    /// Group by tag
    #[arg(short, long)]
    pub grouped: bool,

    /// Expand every node
    #[arg(long)]
    pub expanded: bool,

    /// Keep only nodes whose label contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Search engine
    #[arg(long, value_enum, default_value = "ripgrep")]
    pub engine: Engine,

    /// Path to the ripgrep binary
    #[arg(long, value_name = "FILE")]
    pub rg_path: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "tree")]
    pub format: OutputFormat,

    /// Status summary style: total, tags, "top three" or off
    #[arg(long, value_name = "MODE", value_parser = parse_status_bar)]
    pub status_bar: Option<StatusBarMode>,
}

fn parse_status_bar(value: &str) -> Result<StatusBarMode, String> {
    StatusBarMode::parse(value).ok_or_else(|| format!("unknown status bar mode '{}'", value))
}

pub fn run(args: ScanArgs) -> Result<()> {
    let paths = args
        .paths
        .iter()
        .map(|p| p.canonicalize().with_context(|| format!("Path does not exist: {}", p.display())))
        .collect::<Result<Vec<_>>>()?;

    let mut overrides = args.config.overrides();
    overrides.root_folder = args.root_folder.clone();
    overrides.label_format = args.label_format.clone();
    overrides.flat = args.flat.then_some(true);
    overrides.tags_only = args.tags_only.then_some(true);
    overrides.grouped = args.grouped.then_some(true);
    overrides.expanded = args.expanded.then_some(true);
    overrides.status_bar = args.status_bar;
    overrides.ripgrep = args.rg_path.clone();

    let config = args.config.load(&paths[0], &overrides)?;
    debug!(?config, "Effective configuration");

    let engine = match args.engine {
        Engine::Ripgrep => SearchEngine::Ripgrep(RipgrepSearch::new(config.ripgrep.clone())),
        Engine::Builtin => SearchEngine::Builtin(BuiltinSearch),
    };
    let workspaces: Vec<WorkspaceFolder> = paths.into_iter().map(WorkspaceFolder::from_path).collect();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let mut session = TagTreeSession::new(config, workspaces, engine)?;
        // Refresh clears the filter, so it goes first
        session.execute(Command::Refresh)?;
        if let Some(filter) = args.filter {
            session.execute(Command::SetFilter(filter))?;
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut interrupted = false;
        while !session.is_idle() {
            tokio::select! {
                _ = session.next_update() => {}
                signal = &mut ctrl_c, if !interrupted => {
                    interrupted = true;
                    if signal.is_ok() {
                        info!("Interrupt received, stopping scan");
                        session.execute(Command::StopScan)?;
                    }
                }
            }
        }
        session.rebuild_tree_now();

        for notice in session.take_notices() {
            eprintln!("tag-tree: {}", notice);
        }

        match args.format {
            OutputFormat::Tree => println!("{}", render_text(session.tree())),
            OutputFormat::Json => println!("{}", render_json(session.tree())?),
            OutputFormat::Status => {
                let status = session.status();
                if status.visible {
                    println!("{}", status.text);
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_bar() {
        assert_eq!(parse_status_bar("top three"), Ok(StatusBarMode::TopThree));
        assert!(parse_status_bar("sometimes").is_err());
    }
}
