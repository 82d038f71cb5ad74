//! Resolution of a clicked keyword instance back to its canonical record.

use super::types::{Keyword, KeywordInstanceId};

/// Resolve an instance id against the active keyword set.
///
/// Primary match requires both the sentence number and a normalized term (or
/// alias) to agree. When that fails — the model's sentence numbering is
/// occasionally off-by-one or missing — a text-only pass over the full set
/// returns the first term match instead. That trades sentence precision for
/// availability: callers needing sentence-exact semantics must compare the
/// returned keyword's `sentence_number` against the query themselves.
///
/// `id.term` must already be normalized (`KeywordInstanceId` guarantees this).
pub fn resolve<'a>(keywords: &'a [Keyword], id: &KeywordInstanceId) -> Option<&'a Keyword> {
    let primary = keywords.iter().find(|kw| {
        kw.sentence_number == Some(id.sentence_number) && kw.matches_term(&id.term)
    });

    if primary.is_some() {
        return primary;
    }

    let fallback = keywords.iter().find(|kw| kw.matches_term(&id.term));
    if fallback.is_some() {
        tracing::debug!(term = %id.term, sentence = id.sentence_number, "resolved keyword via text-only fallback");
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keywords() -> Vec<Keyword> {
        vec![
            Keyword::from_raw(&json!({
                "text": "mitral regurgitation",
                "sentence_number": 1,
                "aliases": []
            }))
            .unwrap(),
            Keyword::from_raw(&json!({
                "text": "LV dilated",
                "sentence_number": 2,
                "aliases": ["left ventricle dilated"]
            }))
            .unwrap(),
        ]
    }

    #[test]
    fn primary_match_on_sentence_and_term() {
        let set = keywords();
        let id = KeywordInstanceId::new(1, "mitral regurgitation");
        let kw = resolve(&set, &id).unwrap();
        assert_eq!(kw.text, "mitral regurgitation");
        assert_eq!(kw.sentence_number, Some(1));
    }

    #[test]
    fn primary_match_via_alias() {
        let set = keywords();
        let id = KeywordInstanceId::new(2, "left ventricle dilated");
        assert_eq!(resolve(&set, &id).unwrap().text, "LV dilated");
    }

    #[test]
    fn wrong_sentence_falls_back_to_text_only() {
        let set = keywords();
        let id = KeywordInstanceId::new(99, "mitral regurgitation");
        let kw = resolve(&set, &id).unwrap();
        assert_eq!(kw.text, "mitral regurgitation");
        // Caller can detect the best-effort nature of the match.
        assert_ne!(kw.sentence_number, Some(99));
    }

    #[test]
    fn missing_sentence_number_still_resolves() {
        let set = vec![Keyword::from_raw(&json!({"text": "apical sparing"})).unwrap()];
        let id = KeywordInstanceId::new(3, "apical sparing");
        assert!(resolve(&set, &id).is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let set = keywords();
        let id = KeywordInstanceId::new(1, "aortic stenosis");
        assert!(resolve(&set, &id).is_none());
    }

    #[test]
    fn deterministic_for_same_query() {
        let set = keywords();
        let id = KeywordInstanceId::new(1, "mitral regurgitation");
        let a = resolve(&set, &id).map(|k| k.text.clone());
        let b = resolve(&set, &id).map(|k| k.text.clone());
        assert_eq!(a, b);
    }

    #[test]
    fn same_term_in_two_sentences_prefers_exact_sentence() {
        let set = vec![
            Keyword::from_raw(&json!({"text": "thickening", "sentence_number": 1})).unwrap(),
            Keyword::from_raw(&json!({"text": "thickening", "sentence_number": 4})).unwrap(),
        ];
        let id = KeywordInstanceId::new(4, "thickening");
        assert_eq!(resolve(&set, &id).unwrap().sentence_number, Some(4));
    }
}
