//! Status line text derived from the tag counts.

use crate::domain::{StatusBarMode, TagCounts};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusText {
    pub text: String,
    pub tooltip: String,
    pub visible: bool,
}

pub fn scanning_status() -> StatusText {
    StatusText {
        text: "Scanning...".to_string(),
        tooltip: "Click to interrupt scan".to_string(),
        visible: true,
    }
}

pub fn interrupted_status() -> StatusText {
    StatusText {
        text: "Scanning interrupted.".to_string(),
        tooltip: "Click to restart".to_string(),
        visible: true,
    }
}

/// Tags by descending count, ties by name.
pub fn ranked_counts(counts: &TagCounts) -> Vec<(&str, usize)> {
    let mut ranked: Vec<(&str, usize)> = counts.iter().map(|(tag, n)| (tag.as_str(), *n)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

pub fn status_text(counts: &TagCounts, mode: StatusBarMode) -> StatusText {
    let ranked = ranked_counts(counts);
    let breakdown = |items: &[(&str, usize)]| {
        items.iter().map(|(tag, n)| format!("{}:{}", tag, n)).collect::<Vec<_>>().join(" ")
    };
    let total: usize = ranked.iter().map(|(_, n)| n).sum();
    let tooltip = breakdown(&ranked);

    match mode {
        StatusBarMode::Total => StatusText { text: total.to_string(), tooltip, visible: total > 0 },
        StatusBarMode::Tags => StatusText { text: breakdown(&ranked), tooltip, visible: !ranked.is_empty() },
        StatusBarMode::TopThree => {
            let top = &ranked[..ranked.len().min(3)];
            StatusText { text: breakdown(top), tooltip, visible: !top.is_empty() }
        }
        StatusBarMode::Off => StatusText { text: String::new(), tooltip, visible: false },
    }
}
