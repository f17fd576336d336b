//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, plus pure helpers for vector serialization and similarity.
//! Concrete providers (OpenAI, Ollama, fastembed) live in the
//! `command-catalog` application crate.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{CatalogError, Result};

/// Bytes per stored vector component.
pub const COMPONENT_BYTES: usize = 8;

/// A text → vector backend.
///
/// Implementations bound every call with a timeout and report timeouts,
/// transport errors, non-success statuses and malformed responses as
/// [`CatalogError::RetrievalUnavailable`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `768`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, one vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}

/// Embed a single text and check the vector against [`EmbeddingProvider::dims`].
pub async fn embed_one(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f64>> {
    let vector = provider
        .embed(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CatalogError::retrieval("empty embedding response"))?;

    let dims = provider.dims();
    if dims > 0 && vector.len() != dims {
        return Err(CatalogError::DimensionMismatch {
            id: None,
            expected: dims,
            actual: vector.len(),
        });
    }
    Ok(vector)
}

/// A stored vector plus what it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f64>,
    pub model: String,
    /// [`content_hash`] of the text the vector was computed from.
    pub content_hash: String,
}

impl Embedding {
    pub fn new(vector: Vec<f64>, model: &str, text: &str) -> Self {
        Self {
            vector,
            model: model.to_string(),
            content_hash: content_hash(text),
        }
    }

    /// True when the vector was computed from exactly `text`.
    pub fn is_current_for(&self, text: &str) -> bool {
        self.content_hash == content_hash(text)
    }
}

/// SHA-256 of the embedded text, hex encoded.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Encode a vector as a BLOB (native-endian `f64`, 8 bytes per component).
///
/// # Example
///
/// ```rust
/// use command_catalog_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f64, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 24);
/// assert_eq!(blob_to_vec(&blob), Some(v));
/// ```
pub fn vec_to_blob(vec: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * COMPONENT_BYTES);
    for &v in vec {
        bytes.extend_from_slice(&v.to_ne_bytes());
    }
    bytes
}

/// Decode a BLOB produced by [`vec_to_blob`].
///
/// Returns `None` when the length is not a multiple of 8, which can only
/// happen if the stored bytes were corrupted.
pub fn blob_to_vec(blob: &[u8]) -> Option<Vec<f64>> {
    if blob.len() % COMPONENT_BYTES != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(COMPONENT_BYTES)
            .map(|chunk| {
                let mut raw = [0u8; COMPONENT_BYTES];
                raw.copy_from_slice(chunk);
                f64::from_ne_bytes(raw)
            })
            .collect(),
    )
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` when either vector has zero
/// norm (including empty vectors). Vectors of different length are a
/// [`CatalogError::DimensionMismatch`].
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(CatalogError::DimensionMismatch {
            id: None,
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return Ok(0.0);
    }

    Ok((dot / denom).clamp(-1.0, 1.0))
}
