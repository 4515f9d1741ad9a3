//! Per-node expanded/collapsed state that survives tree rebuilds.

use std::collections::HashMap;

/// Node key -> expanded. Keys are node paths (or `tag:NAME` for tag nodes),
/// so they stay valid across rebuilds while the path is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    states: HashMap<String, bool>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, expanded: bool) {
        self.states.insert(key.into(), expanded);
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.states.get(key).copied()
    }

    /// Recorded state, or `default` for keys never touched.
    pub fn is_expanded(&self, key: &str, default: bool) -> bool {
        self.get(key).unwrap_or(default)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
