//! Label template substitution.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(line|column|before|tag|after)\}").expect("valid placeholder regex")
});

/// Values available to a label template.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelFields<'a> {
    /// Zero-based line; rendered 1-based.
    pub line: usize,
    pub column: usize,
    pub before: &'a str,
    pub tag: &'a str,
    pub after: &'a str,
}

/// Substitute `${line}`, `${column}`, `${before}`, `${tag}` and `${after}`.
///
/// Substitution is single pass, so placeholder-like text inside the
/// substituted values is left alone.
pub fn format_label(template: &str, fields: &LabelFields<'_>) -> String {
    let label = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| match &caps[1] {
        "line" => (fields.line + 1).to_string(),
        "column" => fields.column.to_string(),
        "before" => fields.before.to_string(),
        "tag" => fields.tag.to_string(),
        _ => fields.after.to_string(),
    });
    label.trim().to_string()
}
