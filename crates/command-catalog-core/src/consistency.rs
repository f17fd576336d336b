//! Embedding consistency: the write paths of [`Catalog`].
//!
//! Every mutation keeps three things in step: the command record, its
//! embedding, and the text index (which the store derives from the record).
//!
//! | Operation | Embedding effect |
//! |-----------|------------------|
//! | [`add`](Catalog::add) | computed from `name + " " + description` |
//! | [`update`](Catalog::update) | recomputed only if name or description changed |
//! | [`delete`](Catalog::delete) | deleted before the record |
//! | [`rebuild_embedding`](Catalog::rebuild_embedding) | recomputed for one record |
//! | [`rebuild_all`](Catalog::rebuild_all) | recomputed for every record, failures collected |
//! | [`embed_pending`](Catalog::embed_pending) | recomputed where missing or stale |
//!
//! Embedding failures after a committed record write are reported as
//! [`CatalogError::RetrievalUnavailable`] carrying the record id; the
//! record write is never rolled back.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::catalog::Catalog;
use crate::embedding::{embed_one, Embedding};
use crate::error::{CatalogError, Result};
use crate::models::{CommandRecord, CommandUpdate, NewCommand};
use crate::store::{CatalogStore, EmbeddingStore};

/// Outcome of a batch embedding run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RebuildSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<RebuildFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildFailure {
    pub id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub name: String,
    pub category: String,
    pub count: usize,
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRecord {
    pub id: i64,
    pub problems: Vec<String>,
}

/// Structural consistency report. Problems are reported, never repaired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Records with no embedding.
    pub missing_embeddings: Vec<i64>,
    /// Embeddings whose owner record does not exist.
    pub orphaned_embeddings: Vec<i64>,
    /// Records with an empty name or category.
    pub invalid_records: Vec<InvalidRecord>,
    /// Embeddings computed from text the record no longer has.
    pub stale_embeddings: Vec<i64>,
    /// Embeddings whose length differs from the provider's dimension.
    pub dimension_mismatches: Vec<i64>,
    /// Stored vectors that cannot be decoded. `embed pending` overwrites
    /// them when the owner record still exists.
    pub corrupt_embeddings: Vec<i64>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.missing_embeddings.is_empty()
            && self.orphaned_embeddings.is_empty()
            && self.invalid_records.is_empty()
            && self.stale_embeddings.is_empty()
            && self.dimension_mismatches.is_empty()
            && self.corrupt_embeddings.is_empty()
    }

    /// Turn a non-clean report into [`CatalogError::IntegrityViolation`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_clean() {
            return Ok(self);
        }
        Err(CatalogError::IntegrityViolation(format!(
            "{} missing, {} orphaned, {} invalid, {} stale, {} wrong-dimension, {} corrupt",
            self.missing_embeddings.len(),
            self.orphaned_embeddings.len(),
            self.invalid_records.len(),
            self.stale_embeddings.len(),
            self.dimension_mismatches.len(),
            self.corrupt_embeddings.len()
        )))
    }
}

impl<S: CatalogStore + EmbeddingStore> Catalog<S> {
    /// Create a record and its embedding.
    ///
    /// Fails with [`CatalogError::Duplicate`] if `(name, category)` is taken.
    /// If the embedding step fails the record stays stored and the error
    /// names its id so the caller can retry with
    /// [`rebuild_embedding`](Catalog::rebuild_embedding).
    pub async fn add(&self, cmd: NewCommand) -> Result<CommandRecord> {
        let cmd = cmd.normalized()?;
        if let Some(existing_id) = self
            .store()
            .find_by_name_category(&cmd.name, &cmd.category)
            .await?
        {
            return Err(CatalogError::Duplicate {
                existing_id,
                name: cmd.name,
                category: cmd.category,
            });
        }

        let record = self.store().insert_command(&cmd).await?;
        tracing::info!(command_id = record.id, name = %record.name, "command added");

        self.refresh_embedding(&record).await?;
        Ok(record)
    }

    /// Apply a partial update. The embedding is regenerated only when the
    /// name or description value actually changed.
    pub async fn update(&self, id: i64, update: &CommandUpdate) -> Result<CommandRecord> {
        let current = self.get(id).await?;
        if update.is_empty() {
            return Ok(current);
        }
        let next = update.apply_to(&current)?;

        if next.name != current.name || next.category != current.category {
            if let Some(existing_id) = self
                .store()
                .find_by_name_category(&next.name, &next.category)
                .await?
                .filter(|existing| *existing != id)
            {
                return Err(CatalogError::Duplicate {
                    existing_id,
                    name: next.name,
                    category: next.category,
                });
            }
        }

        let stored = self
            .store()
            .update_command(&next)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        tracing::info!(command_id = id, "command updated");

        if stored.searchable_text() != current.searchable_text() {
            self.refresh_embedding(&stored).await?;
        }
        Ok(stored)
    }

    /// Delete a record and its embedding.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.store().get_command(id).await?.is_none() {
            return Err(CatalogError::NotFound(id));
        }
        // Embedding first: an interruption leaves a record without a
        // vector (reported as missing), never an orphaned vector.
        EmbeddingStore::delete(self.store(), id).await?;
        if !self.store().delete_command(id).await? {
            return Err(CatalogError::NotFound(id));
        }
        tracing::info!(command_id = id, "command deleted");
        Ok(())
    }

    /// Recompute one record's embedding from its current text.
    pub async fn rebuild_embedding(&self, id: i64) -> Result<()> {
        let record = self.get(id).await?;
        self.refresh_embedding(&record).await
    }

    /// Recompute every embedding, one record at a time.
    ///
    /// A failing record is counted and keeps its previous embedding; the
    /// run always continues with the next record.
    pub async fn rebuild_all(&self) -> Result<RebuildSummary> {
        let records = self.store().list_commands().await?;
        tracing::info!(records = records.len(), "rebuilding all embeddings");
        Ok(self.embed_records(&records).await)
    }

    /// Embed only records whose embedding is missing or stale.
    pub async fn embed_pending(&self) -> Result<RebuildSummary> {
        let pending = self.pending_records().await?;
        tracing::info!(records = pending.len(), "embedding pending records");
        Ok(self.embed_records(&pending).await)
    }

    /// Records whose embedding is missing, stale or undecodable.
    pub async fn pending_records(&self) -> Result<Vec<CommandRecord>> {
        let records = self.store().list_commands().await?;
        let (vectors, _corrupt) = self.readable_vectors(&records).await?;
        Ok(records
            .into_iter()
            .filter(|r| match vectors.get(&r.id) {
                Some(e) => !e.is_current_for(&r.searchable_text()),
                None => true,
            })
            .collect())
    }

    /// Decodable vectors of `records`, plus the ids whose stored vector is
    /// corrupt. Corrupt rows are never passed to a batch read.
    async fn readable_vectors(
        &self,
        records: &[CommandRecord],
    ) -> Result<(HashMap<i64, Embedding>, HashSet<i64>)> {
        let corrupt: HashSet<i64> = self.store().corrupt_ids().await?.into_iter().collect();
        let ids: Vec<i64> = records
            .iter()
            .map(|r| r.id)
            .filter(|id| !corrupt.contains(id))
            .collect();
        let vectors = self.store().get_many(&ids).await?;
        Ok((vectors, corrupt))
    }

    /// Groups of records sharing `(name, category)`, ordered by name then
    /// category; ids within a group ascend.
    pub async fn find_duplicates(&self) -> Result<Vec<DuplicateGroup>> {
        let mut groups: BTreeMap<(String, String), Vec<i64>> = BTreeMap::new();
        for record in self.store().list_commands().await? {
            groups
                .entry((record.name, record.category))
                .or_default()
                .push(record.id);
        }

        Ok(groups
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((name, category), mut ids)| {
                ids.sort_unstable();
                DuplicateGroup {
                    name,
                    category,
                    count: ids.len(),
                    ids,
                }
            })
            .collect())
    }

    /// Cross-check records against embeddings.
    pub async fn validate_integrity(&self) -> Result<IntegrityReport> {
        let records = self.store().list_commands().await?;
        let record_ids: HashSet<i64> = records.iter().map(|r| r.id).collect();
        let embedding_ids = self.store().ids().await?;
        let (vectors, corrupt) = self.readable_vectors(&records).await?;
        let dims = self.provider().dims();

        let mut report = IntegrityReport {
            orphaned_embeddings: embedding_ids
                .iter()
                .copied()
                .filter(|id| !record_ids.contains(id))
                .collect(),
            ..Default::default()
        };

        for record in &records {
            let problems = record.problems();
            if !problems.is_empty() {
                report.invalid_records.push(InvalidRecord {
                    id: record.id,
                    problems,
                });
            }
            if corrupt.contains(&record.id) {
                continue;
            }
            match vectors.get(&record.id) {
                None => report.missing_embeddings.push(record.id),
                Some(e) => {
                    if !e.is_current_for(&record.searchable_text()) {
                        report.stale_embeddings.push(record.id);
                    }
                    if dims > 0 && e.vector.len() != dims {
                        report.dimension_mismatches.push(record.id);
                    }
                }
            }
        }

        report.corrupt_embeddings = corrupt.into_iter().collect();
        report.corrupt_embeddings.sort_unstable();
        if !report.corrupt_embeddings.is_empty() {
            tracing::warn!(
                corrupt = ?report.corrupt_embeddings,
                "stored vectors that cannot be decoded"
            );
        }
        if !report.orphaned_embeddings.is_empty() {
            tracing::warn!(
                orphans = ?report.orphaned_embeddings,
                "embeddings without an owning record"
            );
        }
        Ok(report)
    }

    async fn refresh_embedding(&self, record: &CommandRecord) -> Result<()> {
        let text = record.searchable_text();
        let vector = embed_one(self.provider(), &text)
            .await
            .map_err(|e| e.for_record(record.id))?;
        let embedding = Embedding::new(vector, self.provider().model_name(), &text);
        self.store()
            .put(record.id, &embedding)
            .await
            .map_err(|e| CatalogError::RetrievalUnavailable {
                record_id: Some(record.id),
                reason: format!("failed to store embedding: {:#}", e),
            })?;
        tracing::debug!(command_id = record.id, "embedding stored");
        Ok(())
    }

    async fn embed_records(&self, records: &[CommandRecord]) -> RebuildSummary {
        let mut summary = RebuildSummary::default();
        for record in records {
            match self.refresh_embedding(record).await {
                Ok(()) => summary.success_count += 1,
                Err(e) => {
                    tracing::warn!(command_id = record.id, "embedding failed: {}", e);
                    summary.failure_count += 1;
                    summary.failures.push(RebuildFailure {
                        id: record.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        summary
    }
}
