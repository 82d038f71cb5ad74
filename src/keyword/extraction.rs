//! Keyword extraction adapter — wraps the external text-generation service.
//!
//! The generator is a black box with a best-effort output contract: responses
//! may arrive fenced in markdown, interleaved with prose, or with individual
//! keyword entries malformed. Everything here is defensive — a bad entry is
//! dropped with a warning, never an error; only the network/service call
//! itself can fail the operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::prompt;
use super::types::Keyword;
use crate::config;

/// Errors from the extraction service boundary. The only failure in the core
/// that is surfaced to the user (as a retryable, non-fatal state).
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Cannot connect to generation service at {0}")]
    Connection(String),

    #[error("Generation request timed out after {0}s")]
    Timeout(u64),

    #[error("Generation service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("No JSON object found in response")]
    MalformedResponse,

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
}

/// Abstraction over the text generator, so extraction logic is testable
/// without a live service.
pub trait TextGenerator {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ExtractionError>;
}

/// HTTP client for the local generation service.
pub struct GenerationClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GenerationClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client configured from the environment (see `config`).
    pub fn from_env() -> Self {
        Self::new(
            &config::generation_service_url(),
            &config::generation_model(),
            config::GENERATION_TIMEOUT_SECS,
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl TextGenerator for GenerationClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ExtractionError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            // Keyword extraction must be reproducible across re-renders.
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                ExtractionError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ExtractionError::Timeout(self.timeout_secs)
            } else {
                ExtractionError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ExtractionError::JsonParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

/// Run keyword extraction for a narrative and validate the result.
pub fn extract_keywords<G: TextGenerator>(
    generator: &G,
    narrative: &str,
    structured_context: &Value,
    exam_id: Option<&str>,
) -> Result<Vec<Keyword>, ExtractionError> {
    let system = prompt::build_system_prompt();
    let payload = prompt::build_user_payload(narrative, structured_context, exam_id);

    let response = generator.generate(&system, &payload)?;
    parse_keyword_response(&response)
}

/// Parse the generator's response into validated keywords.
///
/// Accepts raw JSON, a fenced ```json``` block, or loose prose with a JSON
/// object embedded — the first balanced `{...}` is taken. Individual keyword
/// entries that fail validation are dropped, not fatal.
pub fn parse_keyword_response(response: &str) -> Result<Vec<Keyword>, ExtractionError> {
    let parsed: Value = match serde_json::from_str(response) {
        Ok(v) => v,
        Err(_) => {
            let json_str =
                extract_json_object(response).ok_or(ExtractionError::MalformedResponse)?;
            serde_json::from_str(&json_str)
                .map_err(|e| ExtractionError::JsonParsing(e.to_string()))?
        }
    };

    let raw_keywords = match parsed.get("keywords") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => {
            tracing::warn!("extraction response carried no keywords array");
            &[]
        }
    };

    let mut keywords = Vec::with_capacity(raw_keywords.len());
    for raw in raw_keywords {
        match Keyword::from_raw(raw) {
            Some(kw) => keywords.push(kw),
            None => tracing::warn!(entry = %raw, "dropped malformed keyword entry"),
        }
    }

    Ok(keywords)
}

/// Pull a JSON object out of a free-form response.
///
/// Prefers a fenced code block; otherwise scans for the first balanced
/// top-level `{...}`, skipping braces inside string literals.
fn extract_json_object(text: &str) -> Option<String> {
    if let Some(fenced) = extract_fenced_block(text) {
        return Some(fenced);
    }
    extract_balanced_object(text)
}

fn extract_fenced_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let mut content = &text[start + 3..];
    // Skip an optional language tag on the fence.
    if let Some(rest) = content.strip_prefix("json") {
        content = rest;
    }
    let end = content.find("```")?;
    let block = content[..end].trim();
    if block.is_empty() {
        None
    } else {
        Some(block.to_string())
    }
}

fn extract_balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + c.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
