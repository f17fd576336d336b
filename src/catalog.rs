//! Wiring: build a [`Catalog`] over SQLite from configuration.

use std::sync::Arc;

use anyhow::Result;

use command_catalog_core::Catalog;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;
use crate::{db, embedding, migrate};

pub type SqliteCatalog = Catalog<SqliteStore>;

/// Connect, migrate, and construct the configured provider and extractor.
///
/// Call [`close`] when done so WAL checkpoints complete.
pub async fn open(config: &Config) -> Result<SqliteCatalog> {
    let provider = embedding::create_provider(&config.embedding)?;
    let pool = db::connect(config).await?;
    migrate::migrate(&pool).await?;

    tracing::debug!(
        provider = %config.embedding.provider,
        model = provider.model_name(),
        "catalog opened"
    );

    Ok(Catalog::new(Arc::new(SqliteStore::new(pool)), provider)
        .with_extractor(config.retrieval.keyword_extractor())
        .with_candidate_cap(config.retrieval.candidate_cap))
}

pub async fn close(catalog: SqliteCatalog) {
    catalog.store().close().await;
}
