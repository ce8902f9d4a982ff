//! Query processing: sanitization, expansion, intent classification, and
//! entity extraction.
//!
//! A raw query string enters here once per request and leaves as an
//! immutable [`ProcessedQuery`]; processing is deterministic for identical
//! input and context.

pub mod entity;
pub mod expansion;
pub mod intent;
pub mod processor;

pub use entity::{EntityExtractor, KeywordEntityExtractor};
pub use expansion::expand_query;
pub use intent::QueryIntent;
pub use processor::{ProcessedQuery, QueryContext, QueryProcessor, QueryProcessorConfig};
