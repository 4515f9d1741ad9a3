//! Shared helpers

pub mod encoding;
pub mod paths;

pub use encoding::{decode_bytes, is_binary_file, read_document};
pub use paths::{containing_root, display_relative, normalize_path};
