//! # Sorrel
//!
//! A document store with typed fields on top of a pluggable full-text
//! index engine.
//!
//! ## Features
//!
//! - Schema-driven indexing of text, numeric, date and boolean fields
//! - Free-text query parsing with boolean operators, phrases, wildcards and ranges
//! - Field filters, facets, sorting, collapsing and pagination
//! - Stemming, stopwords, synonyms and spelling correction
//! - Transactions with rollback
//! - BM25 scoring in the bundled in-memory engine
// Core modules
pub mod analysis;
pub mod codec;
mod data;
mod document;
pub mod engine;
mod error;
mod indexer;
pub mod query;
pub mod schema;
pub mod search;
pub mod spelling;
pub mod store;
mod util;

// Re-exports for the public API
pub use data::FieldValue;
pub use document::{CONTENT_FIELD, Document, ID_FIELD};
pub use engine::memory::MemoryEngine;
pub use engine::{IndexEngine, OpenMode};
pub use error::{Result, SorrelError};
pub use indexer::{IndexedDocument, Indexer};
pub use query::{DefaultOp, QueryFlags, QueryParser, StemStrategy};
pub use schema::{FieldOption, FieldSpec, FieldType, IndexMode, Schema, SchemaDefinition};
pub use search::{CheckAtLeast, Order, ResultPage, SearchQuery, SearchRequest};
pub use store::{SearchDefaults, Store, StoreConfig, StoreState};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
