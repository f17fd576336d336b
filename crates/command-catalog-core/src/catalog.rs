//! The [`Catalog`] engine: one explicitly constructed handle bundling a
//! store, an embedding provider and retrieval settings.
//!
//! Read paths (search, lookup) live here; the write paths that keep
//! records, embeddings and the text index consistent live in
//! [`consistency`](crate::consistency).

use std::sync::Arc;

use serde::Serialize;

use crate::embedding::{embed_one, EmbeddingProvider};
use crate::error::{CatalogError, Result};
use crate::filter::{candidate_ids, CandidateSource, DEFAULT_CANDIDATE_CAP};
use crate::keywords::KeywordExtractor;
use crate::models::{CommandRecord, SearchHit};
pub use crate::models::SearchFilters;
use crate::rank::{rank, validate_params};
use crate::store::{CatalogStore, EmbeddingStore};

/// Hybrid retrieval and embedding lifecycle over a store.
///
/// The catalog assumes a single writer: callers serialize mutations.
/// Concurrent searches are fine since they never write.
pub struct Catalog<S> {
    store: Arc<S>,
    provider: Arc<dyn EmbeddingProvider>,
    extractor: KeywordExtractor,
    candidate_cap: usize,
}

#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub limit: usize,
    /// Minimum cosine score, within `[0, 1]`.
    pub threshold: f64,
    pub filters: SearchFilters,
}

impl<'a> SearchRequest<'a> {
    pub fn new(query: &'a str, limit: usize, threshold: f64) -> Self {
        Self {
            query,
            limit,
            threshold,
            filters: SearchFilters::default(),
        }
    }
}

/// A record plus its resolved relations.
#[derive(Debug, Clone, Serialize)]
pub struct CommandDetail {
    #[serde(flatten)]
    pub record: CommandRecord,
    pub related_commands: Vec<RelatedCommand>,
    /// Related ids that no longer resolve to a record.
    pub stale_related: Vec<i64>,
    pub has_embedding: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedCommand {
    pub id: i64,
    pub name: String,
    pub category: String,
}

impl<S: CatalogStore + EmbeddingStore> Catalog<S> {
    pub fn new(store: Arc<S>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            provider,
            extractor: KeywordExtractor::default(),
            candidate_cap: DEFAULT_CANDIDATE_CAP,
        }
    }

    pub fn with_extractor(mut self, extractor: KeywordExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_candidate_cap(mut self, cap: usize) -> Self {
        self.candidate_cap = cap.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }


    /// Rank commands for a natural-language query.
    ///
    /// 1. Extract keywords and query the text index restricted by the
    ///    request's [`SearchFilters`] (falling back to every matching
    ///    record), while embedding the query text concurrently.
    /// 2. Load stored vectors for the candidates; candidates without one
    ///    are skipped.
    /// 3. Score, threshold, sort and truncate.
    pub async fn search(&self, req: &SearchRequest<'_>) -> Result<Vec<SearchHit>> {
        validate_params(req.threshold, req.limit)?;
        if req.query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.extractor.extract(req.query);
        let (candidates, query_vec) = futures::join!(
            candidate_ids(
                self.store.as_ref(),
                &tokens,
                self.candidate_cap,
                &req.filters,
            ),
            embed_one(self.provider.as_ref(), req.query),
        );
        let candidates = candidates?;
        let query_vec = query_vec?;

        if candidates.source == CandidateSource::Fallback {
            tracing::debug!(
                candidates = candidates.ids.len(),
                "lexical filter uninformative, ranking full corpus"
            );
        }

        let vectors = EmbeddingStore::get_many(self.store.as_ref(), &candidates.ids).await?;
        let with_vectors: Vec<i64> = candidates
            .ids
            .iter()
            .copied()
            .filter(|id| vectors.contains_key(id))
            .collect();
        let skipped = candidates.ids.len() - with_vectors.len();
        if skipped > 0 {
            tracing::debug!(skipped, "candidates without embeddings not ranked");
        }

        let records = self.store.get_commands(&with_vectors).await?;

        let scored: Vec<(&CommandRecord, &[f64])> = records
            .iter()
            .filter_map(|r| vectors.get(&r.id).map(|e| (r, e.vector.as_slice())))
            .collect();

        rank(&query_vec, &scored, req.threshold, req.limit)
    }

    pub async fn get(&self, id: i64) -> Result<CommandRecord> {
        self.store
            .get_command(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Fetch a record with its related commands resolved. Related ids that
    /// point at deleted records are reported, not treated as errors.
    pub async fn get_detail(&self, id: i64) -> Result<CommandDetail> {
        let record = self.get(id).await?;
        let related = self.store.get_commands(&record.related).await?;
        let stale_related = record
            .related
            .iter()
            .copied()
            .filter(|rid| !related.iter().any(|r| r.id == *rid))
            .collect();
        // A vector that cannot be decoded counts as absent here; `validate`
        // reports it.
        let has_embedding = match EmbeddingStore::get(self.store.as_ref(), id).await {
            Ok(embedding) => embedding.is_some(),
            Err(e) => match CatalogError::from(e) {
                CatalogError::IntegrityViolation(reason) => {
                    tracing::warn!(command_id = id, "{}", reason);
                    false
                }
                other => return Err(other),
            },
        };

        Ok(CommandDetail {
            related_commands: related
                .into_iter()
                .map(|r| RelatedCommand {
                    id: r.id,
                    name: r.name,
                    category: r.category,
                })
                .collect(),
            stale_related,
            has_embedding,
            record,
        })
    }
}
