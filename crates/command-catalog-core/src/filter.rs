//! Lexical candidate filter.
//!
//! Narrows the set of records that get scored by vector similarity. The
//! filter is only a recall optimization: when it has nothing useful to say
//! (no tokens, no matches, or the index query failed) it falls back to every
//! searchable record instead of returning nothing. Search filters are
//! pushed down into both queries, so the cap and the fallback only ever
//! see records the caller may get back.

use crate::error::Result;
use crate::models::SearchFilters;
use crate::store::CatalogStore;

pub const DEFAULT_CANDIDATE_CAP: usize = 100;

/// Where a candidate set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Text-index matches for at least one token.
    Lexical,
    /// Every searchable record.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    pub ids: Vec<i64>,
    pub source: CandidateSource,
}

/// Candidate ids for `tokens`, at most `cap` when they come from the index.
///
/// Index failures are logged and treated as zero matches. Only a failure
/// of the fallback listing itself is returned as an error.
pub async fn candidate_ids<S: CatalogStore + ?Sized>(
    store: &S,
    tokens: &[String],
    cap: usize,
    filters: &SearchFilters,
) -> Result<Candidates> {
    if !tokens.is_empty() {
        match store.match_keywords(tokens, filters, cap).await {
            Ok(ids) if !ids.is_empty() => {
                return Ok(Candidates {
                    ids,
                    source: CandidateSource::Lexical,
                })
            }
            Ok(_) => tracing::debug!(?tokens, "no lexical matches, using all records"),
            Err(e) => tracing::warn!(?tokens, "lexical index query failed: {:#}", e),
        }
    }

    let ids = store.active_ids(filters).await?;
    Ok(Candidates {
        ids,
        source: CandidateSource::Fallback,
    })
}
