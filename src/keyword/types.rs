//! Keyword data model and validation of untrusted extraction output.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::normalize;
use crate::schema;

/// Catch-all bucket for feature hints the schema cannot place.
pub const GENERAL_CATEGORY: &str = "general";

/// An AI-identified clinically significant phrase, anchored to one numbered
/// sentence of the narrative. Immutable once created — a new narrative
/// replaces the whole keyword set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    /// The phrase as it appears in the narrative.
    pub text: String,
    /// Alternate spellings the model expects to appear in the text.
    pub aliases: Vec<String>,
    /// Numbered sentence this keyword was extracted from. Absent when the
    /// model omitted or garbled it; resolution then degrades to text-only.
    pub sentence_number: Option<u32>,
    /// Categories the model associated with the phrase.
    pub categories: Vec<String>,
    /// Clinical importance, 1 (incidental) to 5 (critical).
    pub importance: u8,
    /// Structured fields this keyword speaks to, grouped by category.
    pub key_features: BTreeMap<String, Vec<String>>,
}

pub(crate) const DEFAULT_IMPORTANCE: u8 = 3;

impl Keyword {
    /// Validate one raw keyword entry from the extraction response.
    ///
    /// Returns `None` (never errors) when the entry has no usable text; a
    /// single bad entry must not fail the batch. Missing collections default
    /// to empty, importance defaults to 3 and is clamped to 1..=5.
    pub fn from_raw(raw: &Value) -> Option<Keyword> {
        let obj = raw.as_object()?;

        // The model alternates between "text" and "term" for the phrase.
        let text = obj
            .get("text")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| obj.get("term").and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .to_string();

        let aliases = string_list(obj.get("aliases"));
        let categories = string_list(obj.get("category").or_else(|| obj.get("categories")));

        let sentence_number = match obj.get("sentence_number") {
            Some(Value::Number(n)) => n.as_u64().map(|n| n as u32),
            // Occasionally arrives as a quoted digit.
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        let importance = obj
            .get("importance")
            .or_else(|| obj.get("importanceScore"))
            .and_then(Value::as_u64)
            .map(|n| (n as u8).clamp(1, 5))
            .unwrap_or(DEFAULT_IMPORTANCE);

        let key_features = parse_key_features(obj.get("key_feature").or_else(|| {
            obj.get("key_features").or_else(|| obj.get("keyFeatureByCategory"))
        }));

        Some(Keyword {
            text,
            aliases,
            sentence_number,
            categories,
            importance,
            key_features,
        })
    }

    /// All terms this keyword can match under: its text plus every alias.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.text.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// True if any of this keyword's terms normalizes to `normalized_term`.
    pub fn matches_term(&self, normalized_term: &str) -> bool {
        self.terms().any(|t| normalize(t) == normalized_term)
    }

    /// True if this keyword carries at least one structured-field association.
    pub fn has_features(&self) -> bool {
        self.key_features.values().any(|fields| !fields.is_empty())
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        // Tolerate a bare string where an array was expected.
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Parse key-feature hints into a per-category field map.
///
/// The wire shape is either a flat list of field names (bucketed here by
/// schema reverse lookup, unknowns landing in "general") or an already-grouped
/// `{category: [fields]}` object.
fn parse_key_features(value: Option<&Value>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

    match value {
        Some(Value::Array(items)) => {
            for feature in items.iter().filter_map(Value::as_str) {
                let (category, field) = match schema::map_feature_to_field(feature) {
                    Some(found) => (found.category.to_string(), found.field.to_string()),
                    None => (GENERAL_CATEGORY.to_string(), feature.to_string()),
                };
                let fields = grouped.entry(category).or_default();
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        Some(Value::Object(map)) => {
            for (category, fields) in map {
                let fields = string_list(Some(fields));
                if !fields.is_empty() {
                    grouped.insert(category.clone(), fields);
                }
            }
        }
        _ => {}
    }

    grouped
}

/// Identity of one keyword occurrence in one sentence.
///
/// Serialized as `"<sentenceNumber>::<normalizedTerm>"` — the wire contract
/// between rendered narrative spans and the click-handling layer. The same
/// literal phrase in two sentences is two distinct instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeywordInstanceId {
    pub sentence_number: u32,
    /// Always stored normalized.
    pub term: String,
}

impl KeywordInstanceId {
    /// Build an instance id, normalizing the term.
    pub fn new(sentence_number: u32, term: &str) -> Self {
        Self {
            sentence_number,
            term: normalize(term),
        }
    }
}

impl fmt::Display for KeywordInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.sentence_number, self.term)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("malformed keyword instance id: {0:?}")]
pub struct InstanceIdParseError(pub String);

impl FromStr for KeywordInstanceId {
    type Err = InstanceIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sentence, term) = s
            .split_once("::")
            .ok_or_else(|| InstanceIdParseError(s.to_string()))?;
        let sentence_number = sentence
            .trim()
            .parse()
            .map_err(|_| InstanceIdParseError(s.to_string()))?;
        Ok(Self {
            sentence_number,
            term: normalize(term),
        })
    }
}

impl TryFrom<String> for KeywordInstanceId {
    type Error = InstanceIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<KeywordInstanceId> for String {
    fn from(id: KeywordInstanceId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_raw_complete_entry() {
        let raw = json!({
            "text": "mitral regurgitation",
            "aliases": ["MR"],
            "sentence_number": 2,
            "category": ["mv"],
            "importance": 4,
            "key_feature": ["mv_regurgitation", "mv_stenosis"]
        });
        let kw = Keyword::from_raw(&raw).unwrap();
        assert_eq!(kw.text, "mitral regurgitation");
        assert_eq!(kw.aliases, vec!["MR"]);
        assert_eq!(kw.sentence_number, Some(2));
        assert_eq!(kw.importance, 4);
        assert_eq!(
            kw.key_features.get("mv").unwrap(),
            &vec!["mv_regurgitation".to_string(), "mv_stenosis".to_string()]
        );
    }

    #[test]
    fn from_raw_defaults_for_missing_collections() {
        let raw = json!({"text": "LV dilated"});
        let kw = Keyword::from_raw(&raw).unwrap();
        assert!(kw.aliases.is_empty());
        assert!(kw.categories.is_empty());
        assert!(kw.key_features.is_empty());
        assert_eq!(kw.sentence_number, None);
        assert_eq!(kw.importance, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn from_raw_accepts_term_field() {
        let raw = json!({"term": "apical sparing"});
        assert_eq!(Keyword::from_raw(&raw).unwrap().text, "apical sparing");
    }

    #[test]
    fn from_raw_drops_textless_entry() {
        assert!(Keyword::from_raw(&json!({"sentence_number": 1})).is_none());
        assert!(Keyword::from_raw(&json!({"text": "  "})).is_none());
        assert!(Keyword::from_raw(&json!("not an object")).is_none());
    }

    #[test]
    fn from_raw_sentence_number_as_string() {
        let raw = json!({"text": "x", "sentence_number": "3"});
        assert_eq!(Keyword::from_raw(&raw).unwrap().sentence_number, Some(3));
    }

    #[test]
    fn from_raw_clamps_importance() {
        let raw = json!({"text": "x", "importance": 99});
        assert_eq!(Keyword::from_raw(&raw).unwrap().importance, 5);
    }

    #[test]
    fn from_raw_category_as_bare_string() {
        let raw = json!({"text": "x", "category": "mv"});
        assert_eq!(Keyword::from_raw(&raw).unwrap().categories, vec!["mv"]);
    }

    #[test]
    fn flat_key_features_bucketed_by_schema() {
        let raw = json!({
            "text": "pulmonary hypertension",
            "key_feature": ["pulmonary_hypertension", "rv_dysfunction", "made_up_field"]
        });
        let kw = Keyword::from_raw(&raw).unwrap();
        assert_eq!(
            kw.key_features.get("pulmonary_vessels").unwrap(),
            &vec!["pulmonary_hypertension".to_string()]
        );
        assert_eq!(
            kw.key_features.get("rv_geometry_function").unwrap(),
            &vec!["rv_dysfunction".to_string()]
        );
        assert_eq!(
            kw.key_features.get(GENERAL_CATEGORY).unwrap(),
            &vec!["made_up_field".to_string()]
        );
    }

    #[test]
    fn grouped_key_features_pass_through() {
        let raw = json!({
            "text": "x",
            "key_features": {"mv": ["mv_regurgitation"]}
        });
        let kw = Keyword::from_raw(&raw).unwrap();
        assert_eq!(
            kw.key_features.get("mv").unwrap(),
            &vec!["mv_regurgitation".to_string()]
        );
    }

    #[test]
    fn matches_term_covers_aliases() {
        let kw = Keyword::from_raw(&json!({
            "text": "LV dilated",
            "aliases": ["left ventricle dilated"]
        }))
        .unwrap();
        assert!(kw.matches_term("lv dilated"));
        assert!(kw.matches_term("left ventricle dilated"));
        assert!(!kw.matches_term("ra dilated"));
    }

    #[test]
    fn instance_id_round_trip() {
        let id = KeywordInstanceId::new(2, "LV  Dilated");
        assert_eq!(id.to_string(), "2::lv dilated");
        let parsed: KeywordInstanceId = "2::lv dilated".parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn instance_id_parse_rejects_garbage() {
        assert!("no-separator".parse::<KeywordInstanceId>().is_err());
        assert!("x::term".parse::<KeywordInstanceId>().is_err());
    }

    #[test]
    fn instance_id_serde_as_string() {
        let id = KeywordInstanceId::new(1, "mitral regurgitation");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"1::mitral regurgitation\"");
        let back: KeywordInstanceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
