//! Numbered-narrative parsing.
//!
//! Narratives arrive as plain text with numbered lines of the form
//! `"<n>. <label>: <content>"`. The leading number is the join key between a
//! rendered line and `Keyword::sentence_number`.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s*").expect("invalid sentence marker regex"));

/// One line of the narrative with its resolved sentence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub number: u32,
    pub text: String,
}

/// Split a narrative into numbered sentences.
///
/// Lines carrying a `"<n>."` marker use that number; unmarked lines fall back
/// to their 1-based position. Blank lines are skipped.
pub fn parse_sentences(narrative: &str) -> Vec<Sentence> {
    narrative
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            let number = SENTENCE_MARKER
                .captures(line)
                .and_then(|cap| cap[1].parse().ok())
                .unwrap_or(index as u32 + 1);
            Sentence {
                number,
                text: line.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_lines_keep_their_markers() {
        let sentences = parse_sentences("1. Mitral regurgitation moderate.\n2. LV dilated.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].number, 1);
        assert_eq!(sentences[1].number, 2);
        assert_eq!(sentences[1].text, "2. LV dilated.");
    }

    #[test]
    fn unmarked_lines_fall_back_to_position() {
        let sentences = parse_sentences("Summary header\nNormal study.");
        assert_eq!(sentences[0].number, 1);
        assert_eq!(sentences[1].number, 2);
    }

    #[test]
    fn blank_lines_skipped() {
        let sentences = parse_sentences("1. First.\n\n\n2. Second.");
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn marker_numbers_override_position() {
        // Sentence numbering authored by the model may skip values.
        let sentences = parse_sentences("3. Late finding.\n7. Later finding.");
        assert_eq!(sentences[0].number, 3);
        assert_eq!(sentences[1].number, 7);
    }

    #[test]
    fn empty_narrative_yields_no_sentences() {
        assert!(parse_sentences("").is_empty());
    }
}
