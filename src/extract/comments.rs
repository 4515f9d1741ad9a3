//! Block comment stripping keyed by file extension.

use std::borrow::Cow;
use std::path::Path;

/// Opening and closing delimiters of a block comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockComment {
    pub open: &'static str,
    pub close: &'static str,
}

const C_STYLE: BlockComment = BlockComment { open: "/*", close: "*/" };
const MARKUP: BlockComment = BlockComment { open: "<!--", close: "-->" };
const ML_STYLE: BlockComment = BlockComment { open: "(*", close: "*)" };
const HASKELL: BlockComment = BlockComment { open: "{-", close: "-}" };
const LUA: BlockComment = BlockComment { open: "--[[", close: "]]" };
const PYTHON: BlockComment = BlockComment { open: "\"\"\"", close: "\"\"\"" };
const RUBY: BlockComment = BlockComment { open: "=begin", close: "=end" };

/// Block comment syntax for a file, if its extension is known.
pub fn block_comment_for(filename: &str) -> Option<BlockComment> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let syntax = match ext.as_str() {
        "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" | "m" | "mm" | "cs" | "java"
        | "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "jsonc" | "go" | "rs" | "swift" | "kt"
        | "kts" | "scala" | "groovy" | "dart" | "php" | "css" | "scss" | "less" | "sass"
        | "sql" | "proto" | "v" | "zig" => C_STYLE,
        "html" | "htm" | "xhtml" | "xml" | "xsl" | "svg" | "md" | "markdown" | "vue"
        | "svelte" => MARKUP,
        "ml" | "mli" | "pas" | "fs" | "fsi" | "wl" => ML_STYLE,
        "hs" | "lhs" | "elm" => HASKELL,
        "lua" => LUA,
        "py" | "pyw" => PYTHON,
        "rb" => RUBY,
        _ => return None,
    };
    Some(syntax)
}

/// Strip block comment delimiters from `text`.
///
/// Only a comment that opens at the start of the line (after blanks) is
/// stripped, and the result is the comment interior. Anything else,
/// including files with an unknown extension, is returned untouched.
pub fn remove_block_comments<'a>(text: &'a str, filename: &str) -> Cow<'a, str> {
    let Some(syntax) = block_comment_for(filename) else {
        return Cow::Borrowed(text);
    };

    let Some(rest) = text.trim_start().strip_prefix(syntax.open) else {
        return Cow::Borrowed(text);
    };

    let interior = match rest.find(syntax.close) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Cow::Owned(interior.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_block_comments_based_on_filename() {
        assert_eq!(remove_block_comments("/* a */", "x.cpp"), " a ");
        assert_eq!(remove_block_comments("// a //", "x.cpp"), "// a //");
        assert_eq!(remove_block_comments("/* a */", "x.js"), " a ");
        assert_eq!(remove_block_comments("/* a */", "x.txt"), "/* a */");
        assert_eq!(remove_block_comments("<!-- a -->", "x.html"), " a ");
    }

    #[test]
    fn test_only_strips_comments_at_line_start() {
        assert_eq!(remove_block_comments("  /* a */", "x.cpp"), " a ");
        assert_eq!(remove_block_comments("b /* a */", "x.cpp"), "b /* a */");
    }

    #[test]
    fn test_unknown_extension_is_borrowed() {
        let text = "  /* TODO keep */";
        assert!(matches!(remove_block_comments(text, "notes.txt"), Cow::Borrowed(_)));
        assert!(matches!(remove_block_comments(text, "Makefile"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unterminated_comment_keeps_remainder() {
        assert_eq!(remove_block_comments("/* TODO: wrap", "lib.rs"), " TODO: wrap");
    }

    #[test]
    fn test_other_syntaxes() {
        assert_eq!(remove_block_comments("--[[ TODO ]]", "init.lua"), " TODO ");
        assert_eq!(remove_block_comments("(* FIXME *)", "a.ml"), " FIXME ");
        assert_eq!(remove_block_comments("\"\"\" TODO doc \"\"\"", "a.py"), " TODO doc ");
        assert_eq!(remove_block_comments("/* x */", "SETTINGS.JSONC"), " x ");
    }
}
