//! Environment-driven configuration for the extraction service boundary.

pub const APP_NAME: &str = "echoscribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "echoscribe_core=info".to_string()
}

const DEFAULT_SERVICE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "medgemma:latest";

/// Keyword extraction waits at most this long for the generator.
pub const GENERATION_TIMEOUT_SECS: u64 = 120;

/// Base URL of the text-generation service.
pub fn generation_service_url() -> String {
    std::env::var("ECHOSCRIBE_SERVICE_URL").unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string())
}

/// Model name to request from the generation service.
pub fn generation_model() -> String {
    std::env::var("ECHOSCRIBE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
}
