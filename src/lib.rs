//! Keyword resolution and bidirectional text/structured-data reconciliation
//! for echocardiogram reporting.
//!
//! The crate is the algorithmic core behind a clinical documentation UI: an
//! AI generates a numbered narrative summary of an echocardiogram, keywords
//! anchored to specific sentences are extracted from it, and the physician
//! edits either the narrative or the structured findings while both stay
//! consistent. Everything here is a synchronous, pure transform over
//! in-memory state except the extraction adapter, which wraps the external
//! generation service.

pub mod config;
pub mod highlight;
pub mod keyword;
pub mod narrative;
pub mod normalize;
pub mod reconcile;
pub mod record;
pub mod schema;
pub mod session;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding this crate. Honors RUST_LOG,
/// falling back to the crate's default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
