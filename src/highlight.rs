//! Narrative span annotation.
//!
//! Builds one combined regex from every active keyword term and alias and
//! splits the rendered text into plain and interactive segments. Longer terms
//! are tried first so "LV" never claims a span inside "LV dysfunction", and a
//! single pass over one alternation guarantees emitted spans never overlap.

use regex::RegexBuilder;

use crate::keyword::types::{Keyword, KeywordInstanceId};
use crate::normalize::normalize;

/// One fragment of rendered narrative text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Non-interactive text.
    Plain(String),
    /// An interactive keyword occurrence.
    Keyword {
        /// The matched text exactly as it appears in the narrative.
        text: String,
        /// Stable per-instance identity for click/selection handling.
        instance_id: KeywordInstanceId,
        importance: u8,
        /// Whether the keyword carries structured-field associations.
        has_features: bool,
    },
}

struct Candidate {
    term: String,
    normalized: String,
    instance_id: KeywordInstanceId,
    importance: u8,
    has_features: bool,
}

/// Annotate `text` with the keyword occurrences found in it.
///
/// `sentence_number` is the number of the line being rendered; it stands in
/// for keywords that arrived without one (last resort: sentence 1).
pub fn highlight(
    text: &str,
    keywords: &[Keyword],
    sentence_number: Option<u32>,
) -> Vec<Segment> {
    if text.is_empty() {
        return Vec::new();
    }

    let candidates = collect_candidates(keywords, sentence_number);
    if candidates.is_empty() {
        // No terms — also avoids building an empty alternation.
        return vec![Segment::Plain(text.to_string())];
    }

    let pattern = candidates
        .iter()
        .map(|c| relaxed_pattern(&c.term))
        .collect::<Vec<_>>()
        .join("|");

    let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build highlight regex; rendering plain");
            return vec![Segment::Plain(text.to_string())];
        }
    };

    let mut segments = Vec::new();
    let mut cursor = 0;

    for mat in regex.find_iter(text) {
        if mat.start() > cursor {
            segments.push(Segment::Plain(text[cursor..mat.start()].to_string()));
        }

        let fragment = mat.as_str();
        let normalized = normalize(fragment);
        match candidates.iter().find(|c| c.normalized == normalized) {
            Some(c) => segments.push(Segment::Keyword {
                text: fragment.to_string(),
                instance_id: c.instance_id.clone(),
                importance: c.importance,
                has_features: c.has_features,
            }),
            // Matched the relaxed pattern but no candidate normalizes to it;
            // render as plain rather than inventing an identity.
            None => segments.push(Segment::Plain(fragment.to_string())),
        }
        cursor = mat.end();
    }

    if cursor < text.len() {
        segments.push(Segment::Plain(text[cursor..].to_string()));
    }

    segments
}

/// Flatten keywords and aliases into candidate terms, longest first.
fn collect_candidates(keywords: &[Keyword], sentence_number: Option<u32>) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for kw in keywords {
        let sentence = kw.sentence_number.or(sentence_number).unwrap_or(1);
        for term in kw.terms() {
            let normalized = normalize(term);
            if normalized.is_empty() {
                continue;
            }
            candidates.push(Candidate {
                term: term.to_string(),
                instance_id: KeywordInstanceId {
                    sentence_number: sentence,
                    term: normalized.clone(),
                },
                normalized,
                importance: kw.importance,
                has_features: kw.has_features(),
            });
        }
    }

    // Longest first, so a short term cannot pre-empt a longer one it is a
    // substring of within the alternation.
    candidates.sort_by(|a, b| b.term.len().cmp(&a.term.len()));
    candidates
}

/// Escape a term for literal matching, then relax it: whitespace runs match
/// any whitespace/NBSP run, and any hyphen matches the whole Unicode hyphen
/// block. Minor formatting drift in the narrative still matches.
fn relaxed_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() * 2);
    let mut chars = term.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
            pattern.push_str(r"[\s\x{00A0}]+");
        } else if c == '-' || ('\u{2010}'..='\u{2015}').contains(&c) {
            pattern.push_str(r"[\-\x{2010}-\x{2015}]");
        } else {
            let mut buf = [0u8; 4];
            pattern.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keyword(value: serde_json::Value) -> Keyword {
        Keyword::from_raw(&value).unwrap()
    }

    fn interactive(segments: &[Segment]) -> Vec<(&str, String)> {
        segments
            .iter()
            .filter_map(|s| match s {
                Segment::Keyword { text, instance_id, .. } => {
                    Some((text.as_str(), instance_id.to_string()))
                }
                Segment::Plain(_) => None,
            })
            .collect()
    }

    #[test]
    fn two_sentence_scenario() {
        let keywords = vec![
            keyword(json!({"text": "mitral regurgitation", "sentence_number": 1, "aliases": []})),
            keyword(json!({
                "text": "LV dilated",
                "sentence_number": 2,
                "aliases": ["left ventricle dilated"]
            })),
        ];

        let line1 = highlight("1. Mitral regurgitation moderate.", &keywords, Some(1));
        let line2 = highlight("2. LV dilated.", &keywords, Some(2));

        assert_eq!(
            interactive(&line1),
            vec![("Mitral regurgitation", "1::mitral regurgitation".to_string())]
        );
        assert_eq!(
            interactive(&line2),
            vec![("LV dilated", "2::lv dilated".to_string())]
        );
    }

    #[test]
    fn zero_keywords_yields_single_plain_segment() {
        let segments = highlight("1. Normal study.", &[], Some(1));
        assert_eq!(segments, vec![Segment::Plain("1. Normal study.".to_string())]);
    }

    #[test]
    fn empty_text_yields_no_segments() {
        let keywords = vec![keyword(json!({"text": "LV"}))];
        assert!(highlight("", &keywords, None).is_empty());
    }

    #[test]
    fn longer_term_wins_over_contained_shorter_term() {
        let keywords = vec![
            keyword(json!({"text": "LV", "sentence_number": 1})),
            keyword(json!({"text": "LV dysfunction", "sentence_number": 1})),
        ];
        let segments = highlight("Severe LV dysfunction noted.", &keywords, Some(1));
        assert_eq!(
            interactive(&segments),
            vec![("LV dysfunction", "1::lv dysfunction".to_string())]
        );
    }

    #[test]
    fn segments_never_overlap_and_reassemble_input() {
        let text = "Moderate mitral regurgitation with LV dilated and mitral stenosis.";
        let keywords = vec![
            keyword(json!({"text": "mitral regurgitation", "sentence_number": 1})),
            keyword(json!({"text": "LV dilated", "sentence_number": 1})),
            keyword(json!({"text": "mitral", "sentence_number": 1})),
        ];
        let segments = highlight(text, &keywords, Some(1));

        let reassembled: String = segments
            .iter()
            .map(|s| match s {
                Segment::Plain(t) => t.as_str(),
                Segment::Keyword { text, .. } => text.as_str(),
            })
            .collect();
        assert_eq!(reassembled, text);

        // "mitral regurgitation" claimed its span; the bare "mitral" only
        // matched the later standalone occurrence.
        let ids: Vec<String> = interactive(&segments).into_iter().map(|(_, id)| id).collect();
        assert_eq!(
            ids,
            vec![
                "1::mitral regurgitation".to_string(),
                "1::lv dilated".to_string(),
                "1::mitral".to_string(),
            ]
        );
    }

    #[test]
    fn nbsp_and_unicode_hyphen_drift_still_match() {
        let keywords = vec![keyword(json!({"text": "D-shape", "sentence_number": 3}))];
        let segments = highlight("Septal D\u{2013}shape present.", &keywords, Some(3));
        assert_eq!(interactive(&segments), vec![("D\u{2013}shape", "3::d-shape".to_string())]);

        let keywords = vec![keyword(json!({"text": "apical sparing", "sentence_number": 1}))];
        let segments = highlight("Shows apical\u{00A0}sparing pattern.", &keywords, Some(1));
        assert_eq!(
            interactive(&segments),
            vec![("apical\u{00A0}sparing", "1::apical sparing".to_string())]
        );
    }

    #[test]
    fn case_insensitive_matching() {
        let keywords = vec![keyword(json!({"text": "mitral regurgitation", "sentence_number": 1}))];
        let segments = highlight("MITRAL REGURGITATION severe.", &keywords, Some(1));
        assert_eq!(
            interactive(&segments),
            vec![("MITRAL REGURGITATION", "1::mitral regurgitation".to_string())]
        );
    }

    #[test]
    fn alias_match_carries_own_instance_term() {
        let keywords = vec![keyword(json!({
            "text": "LV dilated",
            "sentence_number": 2,
            "aliases": ["left ventricle dilated"]
        }))];
        let segments = highlight("The left ventricle dilated over time.", &keywords, Some(2));
        assert_eq!(
            interactive(&segments),
            vec![("left ventricle dilated", "2::left ventricle dilated".to_string())]
        );
    }

    #[test]
    fn keyword_without_sentence_number_uses_line_number() {
        let keywords = vec![keyword(json!({"text": "pericardial effusion"}))];
        let segments = highlight("4. Small pericardial effusion.", &keywords, Some(4));
        assert_eq!(
            interactive(&segments),
            vec![("pericardial effusion", "4::pericardial effusion".to_string())]
        );
    }

    #[test]
    fn importance_and_features_carried_on_segments() {
        let keywords = vec![keyword(json!({
            "text": "pulmonary hypertension",
            "sentence_number": 5,
            "importance": 5,
            "key_feature": ["pulmonary_hypertension"]
        }))];
        let segments = highlight("5. Severe pulmonary hypertension.", &keywords, Some(5));
        let Segment::Keyword { importance, has_features, .. } = &segments[1] else {
            panic!("expected interactive segment");
        };
        assert_eq!(*importance, 5);
        assert!(has_features);
    }

    #[test]
    fn regex_metacharacters_in_terms_are_literal() {
        let keywords = vec![keyword(json!({"text": "E/e' ratio", "sentence_number": 1}))];
        let segments = highlight("Elevated E/e' ratio.", &keywords, Some(1));
        assert_eq!(interactive(&segments).len(), 1);
    }
}
