//! Static echocardiogram field schema — categories, fields, and permitted values.
//!
//! Loaded once, never mutated. The registry answers reverse lookups used when
//! the extraction model hands back a field name (or, sometimes, a bare value)
//! without saying which category it belongs to. Lookups return `None` on a
//! miss; callers render a free-text fallback instead of failing — the model's
//! category/field hints are a guideline, not a strict contract.

/// Permitted domain of a single nested field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    /// Enumerated string values.
    Enum(&'static [&'static str]),
    /// Free numeric value (e.g. an ejection fraction percentage).
    Numeric,
}

/// Schema entry for one category.
#[derive(Debug, Clone, Copy)]
pub enum CategorySpec {
    /// Flat classification category — the category itself holds one value.
    Enum(&'static [&'static str]),
    /// Nested category — a set of named fields.
    Fields(&'static [(&'static str, FieldSpec)]),
}

/// Location of a field within the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    pub category: &'static str,
    pub field: &'static str,
}

/// A value token located within the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRef {
    pub category: &'static str,
    pub field: &'static str,
    pub value: &'static str,
}

const YES_NO: FieldSpec = FieldSpec::Enum(&["yes", "no"]);
const SEVERITY: FieldSpec = FieldSpec::Enum(&["none", "mild", "moderate", "severe"]);
const REGURGITATION: FieldSpec =
    FieldSpec::Enum(&["none", "trivial", "mild", "moderate", "severe"]);
const PROSTHETIC: FieldSpec = FieldSpec::Enum(&["mechanical", "bioprosthetic", "no"]);

/// The full schema, in display order. Order matters for deterministic
/// projection and prompt rendering.
pub static SCHEMA: &[(&str, CategorySpec)] = &[
    ("image_quality", CategorySpec::Enum(&["normal", "poor"])),
    ("cardiac_rhythm_abnormality", CategorySpec::Enum(&["normal", "abnormal"])),
    (
        "cardiac_rhythm",
        CategorySpec::Enum(&[
            "normal",
            "atrial_fibrillation",
            "atrial_flutter",
            "ventricular_premature_beat",
            "atrial_premature_beat",
            "paced_rhythm",
            "other",
        ]),
    ),
    (
        "lv_geometry",
        CategorySpec::Fields(&[
            ("lv_cavity_size", FieldSpec::Enum(&["normal", "small", "dilated"])),
            ("lvh_presence", YES_NO),
            (
                "lvh_pattern",
                FieldSpec::Enum(&[
                    "normal",
                    "concentric_remodeling",
                    "concentric_hypertrophy",
                    "eccentric_hypertrophy",
                ]),
            ),
            ("increased_lv_wall_thickeness", YES_NO),
            ("diffuse_lv_wall_thickening_pattern", YES_NO),
            ("asymmetric_lv_wall_thickening_pattern", YES_NO),
            ("local_lv_wall_thickening_pattern_septum", YES_NO),
            ("local_lv_wall_thickening_pattern_apex", YES_NO),
            ("local_lv_wall_thickening_pattern_other", YES_NO),
            ("sigmoid_septum_or_basal_or_septal_hypertrophy_presence", YES_NO),
            ("papillary_muscle_abnormality", YES_NO),
            ("apical_burnout", YES_NO),
            ("D_shape", YES_NO),
            ("myocardial_texture_abnormality", YES_NO),
        ]),
    ),
    (
        "lv_systolic_function",
        CategorySpec::Fields(&[
            ("apical_sparing", YES_NO),
            ("RWMA", YES_NO),
            ("abnormal_septal_motion", YES_NO),
            ("global_LV_systolic_function", FieldSpec::Enum(&["normal", "abnormal"])),
            ("lv_sec_presence", YES_NO),
            ("lvef", FieldSpec::Numeric),
        ]),
    ),
    (
        "lv_diastolic_function",
        CategorySpec::Fields(&[
            (
                "transmitral_flow_pattern_abnormality",
                FieldSpec::Enum(&["normal", "abnormal_relaxation", "pseudo_normal", "restrictive"]),
            ),
            ("pulmonary_venous_flow_pattern_abnormality", YES_NO),
            (
                "diastolic_dysfunction_grade",
                FieldSpec::Enum(&["normal", "grade_1", "grade_2", "grade_3"]),
            ),
        ]),
    ),
    (
        "rv_geometry_function",
        CategorySpec::Fields(&[
            ("rv_dilation", YES_NO),
            ("rvh_presence", YES_NO),
            ("rv_dysfunction", FieldSpec::Enum(&["normal", "mild", "moderate", "severe"])),
            ("rv_compression_or_constraint", YES_NO),
        ]),
    ),
    (
        "atria",
        CategorySpec::Fields(&[
            ("la_size", FieldSpec::Enum(&["normal", "enlarged", "severely_dilated"])),
            ("ra_size", FieldSpec::Enum(&["normal", "enlarged", "severely_dilated"])),
            ("la_sec_presence", YES_NO),
            ("interatrial_septum_abnormality", YES_NO),
        ]),
    ),
    (
        "av",
        CategorySpec::Fields(&[
            ("degenerative", YES_NO),
            ("calcification", YES_NO),
            ("thickening", YES_NO),
            ("sclerosis", YES_NO),
            ("rheumatic", YES_NO),
            ("congenital", YES_NO),
            ("bicuspid", YES_NO),
            ("quadricuspid", YES_NO),
            ("prolapse", YES_NO),
            ("vegetation", YES_NO),
            ("prosthetic_valve", PROSTHETIC),
            ("thrombus_pannus", YES_NO),
            ("uncertain", YES_NO),
            ("av_stenosis", SEVERITY),
            ("av_regurgitation", REGURGITATION),
        ]),
    ),
    (
        "mv",
        CategorySpec::Fields(&[
            ("degenerative", YES_NO),
            ("rheumatic", YES_NO),
            ("calcification", YES_NO),
            ("annular_calcification", YES_NO),
            ("doming", YES_NO),
            ("fish_mouth_appearance", YES_NO),
            ("thickening", YES_NO),
            ("prolapse", YES_NO),
            ("functional", YES_NO),
            ("prosthetic_valve", PROSTHETIC),
            ("annular_ring", YES_NO),
            ("vegetation", YES_NO),
            ("thrombus_pannus", YES_NO),
            ("uncertain", YES_NO),
            ("sam", YES_NO),
            ("mv_stenosis", SEVERITY),
            ("mv_regurgitation", REGURGITATION),
        ]),
    ),
    (
        "tv",
        CategorySpec::Fields(&[
            ("functional", YES_NO),
            ("coaptation_failure", YES_NO),
            ("thickening", YES_NO),
            ("prolapse", YES_NO),
            ("ebstein_anomaly", YES_NO),
            ("prosthetic_valve", PROSTHETIC),
            ("annular_ring", YES_NO),
            ("vegetation", YES_NO),
            ("degenerative", YES_NO),
            ("thrombus_pannus", YES_NO),
            ("uncertain", YES_NO),
            ("tv_stenosis", SEVERITY),
            ("tv_regurgitation", REGURGITATION),
        ]),
    ),
    (
        "pv",
        CategorySpec::Fields(&[
            ("thickening", YES_NO),
            ("prosthetic_valve", PROSTHETIC),
            ("uncertain", YES_NO),
            ("pv_stenosis", SEVERITY),
            ("pv_regurgitation", REGURGITATION),
        ]),
    ),
    (
        "aorta",
        CategorySpec::Fields(&[
            ("aortic_root_ascending_abnormalities", YES_NO),
            ("aortic_arch_abnormalities", YES_NO),
            ("abdominal_aorta_abnormalities", YES_NO),
        ]),
    ),
    (
        "ivc",
        CategorySpec::Fields(&[("ivc_dilation", YES_NO), ("ivc_plethora", YES_NO)]),
    ),
    (
        "pulmonary_vessels",
        CategorySpec::Fields(&[
            ("pulmonary_hypertension", SEVERITY),
            ("pulmonary_artery_thrombus", YES_NO),
            ("pulmonary_artery_stenosis", YES_NO),
            ("pulmonary_artery_dilatation", YES_NO),
        ]),
    ),
    (
        "pericardial_disease",
        CategorySpec::Fields(&[
            ("effusion_amount", FieldSpec::Enum(&["none", "small", "moderate", "large"])),
            ("pericardial_thickening_or_adhesion", YES_NO),
            ("hemodynamic_significance", YES_NO),
            ("constrictive_physiology", YES_NO),
            ("effusive_constrictive", YES_NO),
            (
                "tamponade_physiology",
                FieldSpec::Enum(&["none", "early/boarderline", "definite"]),
            ),
            (
                "epicardial_adipose_tissue",
                FieldSpec::Enum(&["none", "small", "moderate", "large"]),
            ),
        ]),
    ),
    (
        "cardiomyopathy",
        CategorySpec::Fields(&[
            (
                "cardiomyopathy_type",
                FieldSpec::Enum(&["no", "hypertrophic", "dilated", "restrictive", "infiltrative"]),
            ),
            (
                "hypertrophic_type",
                FieldSpec::Enum(&["none", "septal", "apical", "mixed", "diffuse", "other"]),
            ),
        ]),
    ),
    (
        "intracardiac_findings",
        CategorySpec::Fields(&[
            ("ASD", YES_NO),
            ("PFO", YES_NO),
            ("VSD", YES_NO),
            ("PDA", YES_NO),
            ("intracardiac_device", FieldSpec::Enum(&["none", "pacemaker", "icd", "crt"])),
            ("LVOT obstruction", YES_NO),
            ("RVOT obstruction", YES_NO),
            ("mid-cavity obstruction", YES_NO),
            ("mass_presence", YES_NO),
        ]),
    ),
];

/// Look up a category by name.
pub fn category(name: &str) -> Option<&'static CategorySpec> {
    SCHEMA.iter().find(|(c, _)| *c == name).map(|(_, spec)| spec)
}

/// True if `name` is a flat classification category (the category key itself
/// carries the value, as opposed to a nested field map).
pub fn is_enum_category(name: &str) -> bool {
    matches!(category(name), Some(CategorySpec::Enum(_)))
}

/// Reverse lookup: field name → owning category.
///
/// A flat category's own name resolves to itself (`category == field`).
/// Field names are not globally unique across categories; the first match in
/// schema order wins.
pub fn lookup_field(name: &str) -> Option<FieldRef> {
    for &(cat, spec) in SCHEMA {
        match spec {
            CategorySpec::Enum(_) => {
                if cat == name {
                    return Some(FieldRef { category: cat, field: cat });
                }
            }
            CategorySpec::Fields(fields) => {
                if let Some(&(field, _)) = fields.iter().find(|(f, _)| *f == name) {
                    return Some(FieldRef { category: cat, field });
                }
            }
        }
    }
    None
}

/// Reverse lookup: value token → owning field.
///
/// Exact-case match first across the whole schema, then a case-insensitive
/// pass. Used when the extraction model supplies a value (e.g. "severe")
/// where a field name was expected.
pub fn lookup_value(value: &str) -> Option<ValueRef> {
    find_value(value, |a, b| a == b).or_else(|| find_value(value, |a, b| a.eq_ignore_ascii_case(b)))
}

fn find_value(value: &str, eq: impl Fn(&str, &str) -> bool) -> Option<ValueRef> {
    for &(cat, spec) in SCHEMA {
        match spec {
            CategorySpec::Enum(values) => {
                if let Some(&v) = values.iter().find(|v| eq(v, value)) {
                    return Some(ValueRef { category: cat, field: cat, value: v });
                }
            }
            CategorySpec::Fields(fields) => {
                for &(field, fspec) in fields {
                    if let FieldSpec::Enum(values) = fspec {
                        if let Some(&v) = values.iter().find(|v| eq(v, value)) {
                            return Some(ValueRef { category: cat, field, value: v });
                        }
                    }
                }
            }
        }
    }
    None
}

/// Resolve a feature hint from the extraction model to a schema location.
///
/// Tries, in order: flat category name, nested field name, value token.
/// Returns `None` for hints the schema does not know — callers treat those as
/// opaque free-text features rather than rejecting them.
pub fn map_feature_to_field(feature: &str) -> Option<FieldRef> {
    if is_enum_category(feature) {
        return Some(FieldRef { category: schema_key(feature)?, field: schema_key(feature)? });
    }
    lookup_field(feature)
        .or_else(|| lookup_value(feature).map(|v| FieldRef { category: v.category, field: v.field }))
}

/// Canonical `&'static str` for a category name, if present.
fn schema_key(name: &str) -> Option<&'static str> {
    SCHEMA.iter().find(|(c, _)| *c == name).map(|(c, _)| *c)
}
