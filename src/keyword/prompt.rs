//! Prompt construction for keyword extraction.
//!
//! The available category/field listing is rendered from the schema registry
//! rather than hand-maintained, so the prompt can never drift from what the
//! reconciler actually understands.

use crate::schema::{CategorySpec, SCHEMA};

pub const KEYWORD_SYSTEM_PROMPT: &str = r#"
You are a cardiologist AI that extracts clinically significant keywords from an
echocardiogram narrative summary.

RULES:
1. Extract ONLY phrases that appear verbatim in the summary.
2. Each keyword MUST carry the sentence number it came from — the number at the
   start of the line (e.g. "1.", "2.").
3. key_feature lists the structured fields each keyword speaks to. Include every
   related field; fields from any category may be combined freely.
4. importance is 1 (incidental) to 5 (critical).
5. Output MUST be a single valid JSON object. No prose outside the JSON.

OUTPUT FORMAT:
{
  "keywords": [
    {
      "text": "keyword phrase",
      "aliases": ["alternate spelling", ...],
      "sentence_number": 1,
      "category": ["category1", ...],
      "importance": 1-5,
      "key_feature": ["field1", "field2", ...]
    }
  ]
}
"#;

/// Render the `category: field, field, ...` listing from the schema.
fn render_field_listing() -> String {
    let mut out = String::new();
    for (category, spec) in SCHEMA {
        match spec {
            CategorySpec::Enum(values) => {
                out.push_str(category);
                out.push_str(": ");
                out.push_str(&values.join(", "));
            }
            CategorySpec::Fields(fields) => {
                out.push_str(category);
                out.push_str(": ");
                let names: Vec<&str> = fields.iter().map(|(f, _)| *f).collect();
                out.push_str(&names.join(", "));
            }
        }
        out.push('\n');
    }
    out
}

/// Build the full system prompt, schema listing included.
pub fn build_system_prompt() -> String {
    format!(
        "{KEYWORD_SYSTEM_PROMPT}\nAVAILABLE FIELDS PER CATEGORY:\n{}",
        render_field_listing()
    )
}

/// Build the user payload: narrative, structured context, and exam id as JSON.
pub fn build_user_payload(
    narrative: &str,
    structured_context: &serde_json::Value,
    exam_id: Option<&str>,
) -> String {
    serde_json::json!({
        "summary": narrative,
        "struct_pred": structured_context,
        "exam_id": exam_id,
    })
    .to_string()
}
