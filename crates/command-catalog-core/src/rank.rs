//! Brute-force similarity ranking.
//!
//! The catalog is small enough that every candidate is scored against the
//! query vector directly; there is no approximate index.

use std::cmp::Ordering;

use crate::embedding::cosine_similarity;
use crate::error::{CatalogError, Result};
use crate::models::{CommandRecord, SearchHit};

/// Reject thresholds outside `[0, 1]` and a zero limit.
pub fn validate_params(threshold: f64, limit: usize) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CatalogError::Validation(format!(
            "threshold must be within [0, 1], got {}",
            threshold
        )));
    }
    if limit == 0 {
        return Err(CatalogError::Validation("limit must be >= 1".into()));
    }
    Ok(())
}

/// Score every candidate against `query` and return the best `limit`.
///
/// A candidate whose vector length differs from the query's aborts the
/// ranking with [`CatalogError::DimensionMismatch`] naming that record.
pub fn rank(
    query: &[f64],
    candidates: &[(&CommandRecord, &[f64])],
    threshold: f64,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    let mut hits = Vec::with_capacity(candidates.len());
    for (record, vector) in candidates {
        let score = cosine_similarity(query, vector).map_err(|e| e.for_record(record.id))?;
        hits.push(SearchHit::from_record(record, score));
    }
    Ok(select_top(hits, threshold, limit))
}

/// Keep hits with `score >= threshold`, order by score descending then id
/// ascending, and truncate to `limit`.
pub fn select_top(mut hits: Vec<SearchHit>, threshold: f64, limit: usize) -> Vec<SearchHit> {
    hits.retain(|h| h.score >= threshold);
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    hits.truncate(limit);
    hits
}
