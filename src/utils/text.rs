// src/utils/text.rs

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*?>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Cleans question text for CSV headers and cells: strips tags with a single
/// non-greedy angle-bracket pattern, decodes the standard text entities,
/// collapses whitespace runs to one space and trims the ends.
///
/// Intentionally not a full HTML parser; stored question text is limited to
/// a small set of formatting tags.
pub fn clean_text(input: &str) -> String {
    let stripped = TAG_RE.replace_all(input, " ");

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        // &amp; last, so "&amp;lt;" decodes to "&lt;" and stops there.
        .replace("&amp;", "&");

    WS_RE.replace_all(&decoded, " ").trim().to_string()
}
