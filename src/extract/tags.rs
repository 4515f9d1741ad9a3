//! Tag vocabulary matching.
//!
//! Tags are treated as literals: regex metacharacters are escaped and
//! backslashes become `\x5c` so that a tag such as `ONE\` still forms a
//! valid branch of the alternation passed to the search tool.

use regex::{Regex, RegexBuilder};

/// Placeholder in the search-pattern template replaced by the tag alternation.
pub const TAGS_PLACEHOLDER: &str = "$TAGS";

/// Result of looking for a tag inside one line of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedTag {
    /// Canonical tag from the vocabulary; empty when nothing matched.
    pub tag: String,
    /// Text before the tag, trimmed.
    pub before: String,
    /// Text after the tag, or the whole input when nothing matched.
    pub without_tag: String,
}

/// Finds the first configured tag in a line.
#[derive(Debug, Clone)]
pub struct TagExtractor {
    tags: Vec<String>,
    case_sensitive: bool,
    regex: Option<Regex>,
}

impl TagExtractor {
    pub fn new(tags: &[String], case_sensitive: bool) -> Result<Self, regex::Error> {
        let tags: Vec<String> = tags.iter().filter(|t| !t.is_empty()).cloned().collect();
        let regex = if tags.is_empty() {
            None
        } else {
            let source = format!("({})", tag_alternation(&tags));
            Some(RegexBuilder::new(&source).case_insensitive(!case_sensitive).build()?)
        };
        Ok(Self { tags, case_sensitive, regex })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Split `text` around the first tag occurrence.
    pub fn extract(&self, text: &str) -> ExtractedTag {
        let Some(found) = self.regex.as_ref().and_then(|re| re.find(text)) else {
            return ExtractedTag { tag: String::new(), before: String::new(), without_tag: text.to_string() };
        };

        let after = text[found.end()..].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        ExtractedTag {
            tag: self.canonical(found.as_str()),
            before: text[..found.start()].trim().to_string(),
            without_tag: after.trim_end().to_string(),
        }
    }

    /// Vocabulary entry for a matched substring.
    fn canonical(&self, matched: &str) -> String {
        self.tags
            .iter()
            .find(|tag| {
                if self.case_sensitive {
                    tag.as_str() == matched
                } else {
                    tag.to_lowercase() == matched.to_lowercase()
                }
            })
            .cloned()
            .unwrap_or_else(|| matched.to_string())
    }
}

/// `ONE|TWO` style alternation of escaped tags.
pub fn tag_alternation(tags: &[String]) -> String {
    tags.iter().map(|tag| escape_tag(tag)).collect::<Vec<_>>().join("|")
}

/// Expand `$TAGS` in a pattern template. Templates without the placeholder
/// are returned as-is.
pub fn expand_pattern(template: &str, tags: &[String]) -> String {
    if template.contains(TAGS_PLACEHOLDER) {
        template.replace(TAGS_PLACEHOLDER, &tag_alternation(tags))
    } else {
        template.to_string()
    }
}

/// Compile an expanded search pattern for in-process document scanning.
pub fn search_regex(source: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).multi_line(true).case_insensitive(!case_sensitive).build()
}

fn escape_tag(tag: &str) -> String {
    let mut escaped = String::with_capacity(tag.len());
    for c in tag.chars() {
        match c {
            '\\' => escaped.push_str("\\x5c"),
            '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#'
            | '&' | '-' | '~' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
