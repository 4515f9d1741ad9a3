//! Text-level helpers: tag extraction, comment stripping, label formatting

pub mod comments;
pub mod label;
pub mod tags;

pub use comments::remove_block_comments;
pub use label::{format_label, LabelFields};
pub use tags::{expand_pattern, search_regex, tag_alternation, ExtractedTag, TagExtractor};
