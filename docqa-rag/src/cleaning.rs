//! Text normalization applied to every extracted page before chunking.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Control characters (`U+0000..=U+001F`, `U+007F..=U+009F`) that are not whitespace.
static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Cc}&&[^\s]]").expect("control-char pattern is valid"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Normalize page text for indexing.
///
/// Applies Unicode compatibility decomposition (NFKD), removes control
/// characters, collapses whitespace runs (including line breaks and tabs) to a
/// single space, and trims both ends. The output never contains a character
/// from either C0/C1 control range, and `clean(&clean(x)) == clean(x)`.
///
/// Line breaks, tabs and other whitespace controls become a space rather than
/// being deleted, so words on adjacent lines stay separate: `"a\nb"` cleans to
/// `"a b"`, not `"ab"`.
///
/// Decomposition runs twice: first so compatibility forms that expand to a
/// space (such as U+00A8) are collapsed with their neighbours, and again at
/// the end to restore canonical mark order where a removed control character
/// used to separate two combining marks.
///
/// # Example
///
/// ```rust
/// use docqa_rag::clean;
///
/// assert_eq!(clean("  Caf\u{e9}\u{7}\n\n menu\t"), "Cafe\u{301} menu");
/// ```
pub fn clean(text: &str) -> String {
    let normalized: String = text.nfkd().collect();
    let stripped = CONTROL_CHARS.replace_all(&normalized, "");
    let collapsed = WHITESPACE_RUNS.replace_all(&stripped, " ");
    collapsed.trim().nfkd().collect()
}

/// Whether `c` falls in one of the ranges [`clean`] removes.
pub fn is_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
}
