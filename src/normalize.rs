//! Text canonicalization shared by keyword matching, resolution, and highlighting.
//!
//! LLM output drifts: non-breaking spaces, typographic quotes, Unicode hyphens,
//! inconsistent casing. Every comparison between narrative text and a keyword
//! term must go through the same `normalize` — an asymmetric pipeline silently
//! loses highlights. This is the single implementation; nothing else in the
//! crate re-canonicalizes text.

use unicode_normalization::UnicodeNormalization;

/// Canonicalize a string for comparison.
///
/// Pipeline, in order: Unicode NFKC, NBSP → space, Unicode hyphen block
/// (U+2010–U+2015) → `-`, typographic double/single quotes → ASCII quotes,
/// whitespace runs → single space, trim, lowercase.
///
/// Total and deterministic; empty input yields an empty string.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    let mut seen_non_space = false;

    for c in s.nfkc() {
        let c = match c {
            '\u{00A0}' => ' ',
            '\u{2010}'..='\u{2015}' => '-',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            other => other,
        };
        if c.is_whitespace() {
            // Collapse runs; leading whitespace is dropped entirely.
            pending_space = seen_non_space;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        seen_non_space = true;
        for lower in c.to_lowercase() {
            out.push(lower);
        }
    }

    out
}
