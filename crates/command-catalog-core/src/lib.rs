//! # Command Catalog Core
//!
//! Storage-agnostic logic for the command catalog: data model, keyword
//! extraction, store traits, lexical candidate filtering, similarity
//! ranking, and the consistency rules that keep records and their
//! embeddings in step.
//!
//! This crate has no database, HTTP, or filesystem dependencies. The
//! application crate supplies a SQLite-backed store and network embedding
//! providers; tests use [`store::memory::InMemoryStore`].
//!
//! ```text
//! query ──► KeywordExtractor ──► CatalogStore::match_keywords ──┐
//!   │                                (fallback: all records)    ├─► rank ─► hits
//!   └─────► EmbeddingProvider ──────────────────────────────────┘
//! ```

pub mod catalog;
pub mod consistency;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod keywords;
pub mod models;
pub mod rank;
pub mod store;

pub use catalog::{Catalog, CommandDetail, RelatedCommand, SearchFilters, SearchRequest};
pub use consistency::{
    DuplicateGroup, IntegrityReport, InvalidRecord, RebuildFailure, RebuildSummary,
};
pub use error::{CatalogError, Result};
