//! Patient-record data shapes shared by the reconciler and the session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field value. Kept as raw JSON — the flat record comes from
/// external subsystems and values the schema cannot classify are preserved as
/// opaque free-text rather than rejected.
pub type FieldValue = Value;

/// Single-level field → value mapping, the source-of-truth shape used by the
/// surrounding system. Keys may be bare field names or qualified as
/// `category//field`.
pub type FlatPatientRecord = BTreeMap<String, FieldValue>;

/// Value of one category in a structured record.
///
/// Untagged on the wire: a JSON object is a field map, anything else is the
/// scalar value of a flat classification category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Fields(BTreeMap<String, FieldValue>),
    Scalar(FieldValue),
}

/// Nested category → value mapping. Sparse: only categories and fields with a
/// known value are present — absence means "unknown", never a typed default.
pub type StructuredRecord = BTreeMap<String, CategoryValue>;

/// Qualified flat-record key, `category//field`.
pub fn qualified_key(category: &str, field: &str) -> String {
    format!("{category}//{field}")
}

/// True for values that mean "unset": null or the empty string.
pub fn is_unset(value: &FieldValue) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
