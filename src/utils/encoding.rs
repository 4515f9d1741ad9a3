//! Encoding detection and document reading with UTF-8 fallback logic.
//!
//! Documents are decoded the same way regardless of where they come from:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast-path with strict validation
//! - Fallback encoding detection using chardetng
//! - Binary file detection so the in-process scanner can skip them

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Read a whole document as text.
///
/// Strategy:
/// 1. BOM markers decide the encoding outright
/// 2. Strict UTF-8 (most source trees)
/// 3. chardetng guess, decoding with replacement characters
pub fn read_document(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(decode_bytes(&bytes))
}

/// Decode raw bytes using the same strategy as [`read_document`].
pub fn decode_bytes(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return decoded.into_owned();
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    // UTF-16 is only trusted with a BOM
    let encoding = if encoding == UTF_16LE || encoding == UTF_16BE { UTF_8 } else { encoding };
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Detect if a file is binary (not text).
///
/// Uses two heuristics:
/// 1. Null byte check (strong binary indicator)
/// 2. Ratio of printable ASCII bytes (< 70% = likely binary)
///
/// Unreadable files count as binary so callers skip them.
pub fn is_binary_file(path: &Path, sample_size: usize) -> bool {
    is_binary_file_impl(path, sample_size).unwrap_or(true)
}

fn is_binary_file_impl(path: &Path, sample_size: usize) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut sample = vec![0u8; sample_size];
    let bytes_read = file.read(&mut sample)?;
    sample.truncate(bytes_read);

    if sample.is_empty() {
        return Ok(false);
    }

    // UTF-16 text legitimately contains null bytes
    if Encoding::for_bom(&sample).is_some() {
        return Ok(false);
    }

    if sample.contains(&0) {
        return Ok(true);
    }

    // Valid UTF-8 is text even when mostly non-ASCII
    if std::str::from_utf8(&sample).is_ok() {
        return Ok(false);
    }

    let printable_count = sample
        .iter()
        .filter(|&&b| {
            (32..=126).contains(&b) || b == 9 || b == 10 || b == 13 // printable + tab, LF, CR
        })
        .count();

    Ok((printable_count as f64 / sample.len() as f64) < 0.70)
}
