//! Error taxonomy shared by every catalog operation.
//!
//! Each variant carries enough context (record id, conflicting id,
//! underlying cause) for the caller to decide what to do next. Backend
//! failures that are not part of the taxonomy (SQL errors, I/O) travel in
//! [`CatalogError::Storage`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field is missing or a value is out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// `(name, category)` already belongs to another record.
    #[error("command '{name}' already exists in category '{category}' (id {existing_id})")]
    Duplicate {
        existing_id: i64,
        name: String,
        category: String,
    },

    #[error("command not found: {0}")]
    NotFound(i64),

    /// The embedding provider was unreachable, timed out, or answered with
    /// something unusable, or the fresh vector could not be written. When
    /// `record_id` is set the record write itself was committed and only
    /// its embedding is missing or stale.
    #[error("{}", retrieval_message(.record_id, .reason))]
    RetrievalUnavailable {
        record_id: Option<i64>,
        reason: String,
    },

    /// Two vectors that must share a dimension do not.
    #[error("{}", dimension_message(.id, .expected, .actual))]
    DimensionMismatch {
        id: Option<i64>,
        expected: usize,
        actual: usize,
    },

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Store implementations return `anyhow::Result`; a taxonomy error raised
/// inside a store (e.g. a corrupt vector blob) keeps its variant.
impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CatalogError>() {
            Ok(catalog_err) => catalog_err,
            Err(other) => CatalogError::Storage(other),
        }
    }
}

impl CatalogError {
    pub fn retrieval(reason: impl Into<String>) -> Self {
        CatalogError::RetrievalUnavailable {
            record_id: None,
            reason: reason.into(),
        }
    }

    /// Attach a record id to a provider failure so the caller can retry
    /// the embedding step for exactly that record.
    pub fn for_record(self, id: i64) -> Self {
        match self {
            CatalogError::RetrievalUnavailable { reason, .. } => {
                CatalogError::RetrievalUnavailable {
                    record_id: Some(id),
                    reason,
                }
            }
            CatalogError::DimensionMismatch {
                expected, actual, ..
            } => CatalogError::DimensionMismatch {
                id: Some(id),
                expected,
                actual,
            },
            other => other,
        }
    }
}

fn retrieval_message(record_id: &Option<i64>, reason: &str) -> String {
    match record_id {
        Some(id) => format!(
            "embedding unavailable (command {} is stored without a current embedding): {}",
            id, reason
        ),
        None => format!("embedding provider unavailable: {}", reason),
    }
}

fn dimension_message(id: &Option<i64>, expected: &usize, actual: &usize) -> String {
    match id {
        Some(id) => format!(
            "vector dimension mismatch for command {}: expected {}, got {}",
            id, expected, actual
        ),
        None => format!(
            "vector dimension mismatch: expected {}, got {}",
            expected, actual
        ),
    }
}
