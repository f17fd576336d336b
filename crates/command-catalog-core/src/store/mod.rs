//! Storage abstraction for the command catalog.
//!
//! Two traits split the persisted state the way ownership works: the
//! [`CatalogStore`] owns command records and the text index derived from
//! them, the [`EmbeddingStore`] owns one vector per record. A backend
//! usually implements both over the same database (see `SqliteStore` in
//! the application crate, or [`memory::InMemoryStore`]).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! Methods return `anyhow::Result`; the engine converts failures into
//! [`CatalogError`](crate::error::CatalogError).

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::Embedding;
use crate::models::{CommandRecord, NewCommand, SearchFilters};

/// Command records plus the derived lexical index.
///
/// The text index over (name, description, keywords, category) is
/// maintained by the store itself on every insert, update and delete, so
/// its contents are always a function of the current records.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_command`](CatalogStore::insert_command) | Assign an id and store a new record |
/// | [`get_command`](CatalogStore::get_command) | Point lookup |
/// | [`get_commands`](CatalogStore::get_commands) | Batch lookup, unknown ids omitted |
/// | [`update_command`](CatalogStore::update_command) | Overwrite a record's mutable fields |
/// | [`delete_command`](CatalogStore::delete_command) | Remove a record |
/// | [`find_by_name_category`](CatalogStore::find_by_name_category) | Unique-key lookup |
/// | [`list_commands`](CatalogStore::list_commands) | Full scan, ascending id |
/// | [`active_ids`](CatalogStore::active_ids) | Ids eligible for search |
/// | [`match_keywords`](CatalogStore::match_keywords) | Disjunctive text-index query |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a record. Ids are assigned monotonically and never reused;
    /// `created_at` and `updated_at` are set to the current time.
    async fn insert_command(&self, cmd: &NewCommand) -> Result<CommandRecord>;

    async fn get_command(&self, id: i64) -> Result<Option<CommandRecord>>;

    /// Records for `ids`, in ascending id order. Unknown ids are skipped.
    async fn get_commands(&self, ids: &[i64]) -> Result<Vec<CommandRecord>>;

    /// Replace every mutable field of `record.id` and bump `updated_at`.
    ///
    /// Returns the stored record, or `None` if the id does not exist.
    async fn update_command(&self, record: &CommandRecord) -> Result<Option<CommandRecord>>;

    /// Returns `false` if the id did not exist.
    async fn delete_command(&self, id: i64) -> Result<bool>;

    /// Lowest id whose (name, category) equals the given pair exactly.
    async fn find_by_name_category(&self, name: &str, category: &str) -> Result<Option<i64>>;

    async fn list_commands(&self) -> Result<Vec<CommandRecord>>;

    /// Ids of records passing `filters`, ascending.
    async fn active_ids(&self, filters: &SearchFilters) -> Result<Vec<i64>>;

    /// Ids of records passing `filters` where any token matches the name,
    /// description, keywords or category. A token matches a run of words
    /// when its alphanumeric parts equal those words, the last part as a
    /// prefix (`clus` matches `clusterxl`, `fw_ctl` matches `fw ctl`).
    /// At most `cap` ids, taken after filtering.
    async fn match_keywords(
        &self,
        tokens: &[String],
        filters: &SearchFilters,
        cap: usize,
    ) -> Result<Vec<i64>>;
}

/// One vector per record, keyed by record id.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Insert or replace the embedding of `id`.
    async fn put(&self, id: i64, embedding: &Embedding) -> Result<()>;

    async fn get(&self, id: i64) -> Result<Option<Embedding>>;

    /// Embeddings for `ids`; ids without one are simply absent.
    async fn get_many(&self, ids: &[i64]) -> Result<HashMap<i64, Embedding>>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Owner ids of every stored embedding, ascending.
    async fn ids(&self) -> Result<Vec<i64>>;

    /// Owner ids whose stored vector cannot be decoded, ascending.
    ///
    /// Stores that keep vectors in decoded form never hold corrupt ones.
    async fn corrupt_ids(&self) -> Result<Vec<i64>> {
        Ok(Vec::new())
    }
}
