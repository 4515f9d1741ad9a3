//! Error types for the search and root-resolution boundaries

use thiserror::Error;

/// Failure of one search-service invocation.
///
/// A failed root is reported to the user and skipped; it never aborts the
/// rest of the scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Failed to find search tool '{program}'")]
    NotFound { program: String },

    #[error("Failed to start '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("Search exited with code {code:?}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("Search output exceeded the buffer limit of {limit} bytes")]
    BufferOverflow { limit: usize },

    #[error("Invalid search pattern: {0}")]
    Pattern(String),

    #[error("Failed to read search output: {0}")]
    Output(String),
}

impl SearchError {
    /// Diagnostic output of the external process, when there was any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Exit { stderr, .. } if !stderr.trim().is_empty() => Some(stderr.trim()),
            _ => None,
        }
    }

    /// One-line message for the user, with stderr appended in parentheses.
    pub fn user_message(&self) -> String {
        match self.stderr() {
            Some(stderr) => format!("{} ({})", self, stderr),
            None => self.to_string(),
        }
    }
}

/// The configured search roots could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RootsError {
    #[error("Root folder '{template}' needs ${{workspaceFolder}} but no workspace is open")]
    NoWorkspace { template: String },
}
