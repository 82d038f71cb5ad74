//! Keyword model, extraction adapter, and instance resolution.

pub mod extraction;
pub mod prompt;
pub mod resolver;
pub mod types;

pub use extraction::{extract_keywords, ExtractionError, GenerationClient, TextGenerator};
pub use resolver::resolve;
pub use types::{Keyword, KeywordInstanceId};
