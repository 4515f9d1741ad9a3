//! tag-tree: find TODO/FIXME-style tags across a workspace
//!
//! Searches workspace folders with ripgrep (or an in-process walker), keeps a
//! deduplicated store of every tag occurrence and projects it into a tree that
//! can be grouped by tag, flattened, filtered and summarised as a status line.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod scan;
pub mod session;
pub mod store;
pub mod tree;
pub mod utils;

pub use config::Config;
pub use domain::{Occurrence, RawMatch, StatusBarMode, ViewState, WorkspaceFolder};
pub use error::{RootsError, SearchError};
pub use scan::{BuiltinSearch, RipgrepSearch, SearchEngine, SearchService};
pub use session::{Command, Notice, TagTreeSession, Update};
pub use store::MatchStore;
pub use tree::{ExpansionState, TreeNode};
