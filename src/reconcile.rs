//! Bidirectional reconciliation between flat and nested patient records, plus
//! derivation of the recommended-feature panel.
//!
//! All operations are pure and total: missing or extra keys are "not yet
//! known", never errors. The field schema is a guideline here, not a
//! validator — unknown values pass through as opaque free-text.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::keyword::resolver::resolve;
use crate::keyword::types::{Keyword, KeywordInstanceId};
use crate::record::{
    is_unset, qualified_key, CategoryValue, FlatPatientRecord, StructuredRecord,
};
use crate::schema::{self, CategorySpec, SCHEMA};

/// Project a flat patient record into the nested category structure.
///
/// For nested fields the bare field name takes precedence; the qualified
/// `category//field` key is consulted only when the bare name is absent.
/// Unset values (null / empty string) are omitted entirely.
pub fn to_structured(flat: &FlatPatientRecord) -> StructuredRecord {
    let mut structured = StructuredRecord::new();

    for (category, spec) in SCHEMA {
        match spec {
            CategorySpec::Enum(_) => {
                if let Some(value) = flat.get(*category).filter(|v| !is_unset(v)) {
                    structured.insert(category.to_string(), CategoryValue::Scalar(value.clone()));
                }
            }
            CategorySpec::Fields(fields) => {
                let mut nested = BTreeMap::new();
                for (field, _) in *fields {
                    let value = flat
                        .get(*field)
                        .or_else(|| flat.get(&qualified_key(category, field)));
                    if let Some(value) = value.filter(|v| !is_unset(v)) {
                        nested.insert(field.to_string(), value.clone());
                    }
                }
                if !nested.is_empty() {
                    structured.insert(category.to_string(), CategoryValue::Fields(nested));
                }
            }
        }
    }

    structured
}

/// Project a structured record down to flat field → value pairs.
///
/// Nested fields are emitted under their bare names; scalar categories under
/// the category name. Lossy by design: qualified-name provenance is
/// discarded, so two categories sharing a field name with different values do
/// not round-trip (last one in category order wins).
pub fn to_flat(structured: &StructuredRecord) -> FlatPatientRecord {
    let mut flat = FlatPatientRecord::new();

    for (category, value) in structured {
        match value {
            CategoryValue::Fields(fields) => {
                for (field, v) in fields {
                    flat.insert(field.clone(), v.clone());
                }
            }
            CategoryValue::Scalar(v) => {
                flat.insert(category.clone(), v.clone());
            }
        }
    }

    flat
}

/// Deep-merge AI-suggested updates into an existing structured record.
///
/// Per category: a field map merges field-by-field (only listed fields
/// change); a scalar replaces the category value wholesale. Categories and
/// fields absent from `updates` are untouched. Same-field collisions are
/// last-write-wins — accepted policy, no conflict detection.
pub fn merge_updates(existing: &StructuredRecord, updates: &StructuredRecord) -> StructuredRecord {
    let mut merged = existing.clone();

    for (category, update) in updates {
        match update {
            CategoryValue::Fields(update_fields) => {
                let entry = merged
                    .entry(category.clone())
                    .or_insert_with(|| CategoryValue::Fields(BTreeMap::new()));
                match entry {
                    CategoryValue::Fields(fields) => {
                        for (field, value) in update_fields {
                            fields.insert(field.clone(), value.clone());
                        }
                    }
                    // A scalar being overwritten by a field map: the update's
                    // shape wins.
                    CategoryValue::Scalar(_) => {
                        *entry = CategoryValue::Fields(update_fields.clone());
                    }
                }
            }
            CategoryValue::Scalar(value) => {
                merged.insert(category.clone(), CategoryValue::Scalar(value.clone()));
            }
        }
    }

    merged
}

/// A field surfaced for editing, derived per-render from the keyword set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedFeature {
    pub category: String,
    pub field: String,
    /// Highest importance among the keywords contributing this field.
    pub importance: u8,
    /// First-seen position, the tie-break within equal importance.
    pub order: usize,
}

/// Derive the recommended fields to surface, optionally filtered to one
/// selected keyword instance.
///
/// Pairs are deduplicated across keywords, keeping the maximum importance and
/// the first-seen order, then ranked by importance descending with first-seen
/// order as tie-break. When `selected` resolves to a keyword that carries
/// features, only that keyword's pairs are kept; when resolution fails or the
/// keyword has none, the full set is returned — an unfiltered panel beats an
/// empty one.
pub fn recommended_features(
    keywords: &[Keyword],
    selected: Option<&KeywordInstanceId>,
) -> Vec<RecommendedFeature> {
    let mut features: Vec<RecommendedFeature> = Vec::new();

    for kw in keywords {
        for (category, fields) in &kw.key_features {
            for field in fields {
                match features
                    .iter_mut()
                    .find(|f| f.category == *category && f.field == *field)
                {
                    Some(existing) => {
                        if kw.importance > existing.importance {
                            existing.importance = kw.importance;
                        }
                    }
                    None => {
                        let order = features.len();
                        features.push(RecommendedFeature {
                            category: category.clone(),
                            field: field.clone(),
                            importance: kw.importance,
                            order,
                        });
                    }
                }
            }
        }
    }

    if let Some(id) = selected {
        if let Some(kw) = resolve(keywords, id).filter(|kw| kw.has_features()) {
            features.retain(|f| {
                kw.key_features
                    .get(&f.category)
                    .is_some_and(|fields| fields.contains(&f.field))
            });
        }
    }

    features.sort_by(|a, b| b.importance.cmp(&a.importance).then(a.order.cmp(&b.order)));
    features
}

/// Where a recommended feature lands in the schema, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureEditor {
    /// Enumerated dropdown with the permitted values.
    Select { category: &'static str, field: &'static str, options: &'static [&'static str] },
    /// Numeric input.
    Numeric { category: &'static str, field: &'static str },
    /// Schema miss — render a free-text input, never reject.
    FreeText,
}

/// Classify how a recommended feature should be edited.
pub fn feature_editor(feature: &RecommendedFeature) -> FeatureEditor {
    let Some(found) = schema::map_feature_to_field(&feature.field) else {
        return FeatureEditor::FreeText;
    };

    match schema::category(found.category).copied() {
        Some(CategorySpec::Enum(options)) => FeatureEditor::Select {
            category: found.category,
            field: found.field,
            options,
        },
        Some(CategorySpec::Fields(fields)) => {
            match fields.iter().find(|(f, _)| *f == found.field).copied() {
                Some((_, schema::FieldSpec::Enum(options))) => FeatureEditor::Select {
                    category: found.category,
                    field: found.field,
                    options,
                },
                Some((_, schema::FieldSpec::Numeric)) => FeatureEditor::Numeric {
                    category: found.category,
                    field: found.field,
                },
                None => FeatureEditor::FreeText,
            }
        }
        None => FeatureEditor::FreeText,
    }
}
