//! Embedding provider implementations.
//!
//! Concrete backends for the core
//! [`EmbeddingProvider`](command_catalog_core::embedding::EmbeddingProvider)
//! trait:
//! - **[`DisabledProvider`]**: every call fails; used when embeddings are not configured.
//! - **[`OpenAIProvider`]**: `POST /v1/embeddings` with retry and backoff.
//! - **[`OllamaProvider`]**: `POST {url}/api/embed` on a local Ollama instance.
//! - **`LocalProvider`**: fastembed inference, behind the `local-embeddings` feature.
//!
//! Every failure (unreachable host, timeout, non-success status, malformed
//! body) is reported as
//! [`CatalogError::RetrievalUnavailable`](command_catalog_core::CatalogError::RetrievalUnavailable).
//!
//! # Provider Selection
//!
//! ```rust
//! # use command_catalog::config::EmbeddingConfig;
//! # use command_catalog::embedding::create_provider;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```
//!
//! # Retry Strategy
//!
//! The HTTP providers use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

#[cfg(feature = "local-embeddings")]
mod local;

#[cfg(feature = "local-embeddings")]
pub use local::LocalProvider;

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;

use command_catalog_core::embedding::EmbeddingProvider;
use command_catalog_core::{CatalogError, Result};

use crate::config::EmbeddingConfig;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

// ============ Disabled Provider ============

/// A provider that refuses every request.
///
/// Used when `embedding.provider = "disabled"`. Records can still be
/// created; their embeddings are reported as missing until a real provider
/// is configured and `cmdcat embed pending` is run.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Err(CatalogError::retrieval(
            "embedding provider is disabled; set [embedding] provider in config",
        ))
    }
}

// ============ HTTP plumbing ============

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send a JSON request, retrying 429/5xx/network failures.
///
/// `build` is called once per attempt since a `RequestBuilder` is consumed
/// by `send`.
async fn send_with_retry<F>(label: &str, max_retries: u32, build: F) -> Result<serde_json::Value>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::debug!(attempt, ?delay, "{} retry", label);
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json().await.map_err(|e| {
                        CatalogError::retrieval(format!("{} returned malformed JSON: {}", label, e))
                    });
                }

                let body_text = response.text().await.unwrap_or_default();
                let reason = format!("{} API error {}: {}", label, status, body_text.trim());

                // Rate limited or server error: retry
                if status.as_u16() == 429 || status.is_server_error() {
                    tracing::warn!(attempt, "{}", reason);
                    last_err = Some(reason);
                    continue;
                }

                return Err(CatalogError::retrieval(reason));
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!("{} request timed out", label)
                } else {
                    format!("{} connection error: {}", label, e)
                };
                tracing::warn!(attempt, "{}", reason);
                last_err = Some(reason);
            }
        }
    }

    Err(CatalogError::retrieval(last_err.unwrap_or_else(|| {
        format!("{} embedding failed after retries", label)
    })))
}

fn malformed(label: &str, what: &str) -> CatalogError {
    CatalogError::retrieval(format!("invalid {} response: {}", label, what))
}

/// Convert a JSON array of numbers into a vector, rejecting non-numbers.
fn json_vector(label: &str, value: &serde_json::Value) -> Result<Vec<f64>> {
    value
        .as_array()
        .ok_or_else(|| malformed(label, "embedding is not an array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| malformed(label, "embedding contains a non-number"))
        })
        .collect()
}

fn expect_count(label: &str, vectors: &[Vec<f64>], inputs: usize) -> Result<()> {
    if vectors.len() != inputs {
        return Err(malformed(
            label,
            &format!("{} embeddings for {} inputs", vectors.len(), inputs),
        ));
    }
    Ok(())
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Requires the `OPENAI_API_KEY` environment variable. `embedding.url`
/// may point at any OpenAI-compatible server.
pub struct OpenAIProvider {
    model: String,
    dims: usize,
    url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());

        Ok(Self {
            model,
            dims,
            url: url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let endpoint = format!("{}/v1/embeddings", self.url);

        let json = send_with_retry("OpenAI", self.max_retries, || {
            self.client
                .post(&endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        let vectors = parse_openai_response(&json)?;
        expect_count("OpenAI", &vectors, texts.len())?;
        Ok(vectors)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f64>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| malformed("OpenAI", "missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        let embedding = item
            .get("embedding")
            .ok_or_else(|| malformed("OpenAI", "missing embedding"))?;
        indexed.push((index, json_vector("OpenAI", embedding)?));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Requires Ollama to be running with an embedding model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaProvider {
    model: String,
    dims: usize,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for Ollama provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            model,
            dims,
            url: url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let endpoint = format!("{}/api/embed", self.url);

        let json = send_with_retry("Ollama", self.max_retries, || {
            self.client.post(&endpoint).json(&body)
        })
        .await
        .map_err(|e| match e {
            CatalogError::RetrievalUnavailable { record_id, reason } => {
                CatalogError::RetrievalUnavailable {
                    record_id,
                    reason: format!("{} (is Ollama running at {}?)", reason, self.url),
                }
            }
            other => other,
        })?;

        let vectors = parse_ollama_response(&json)?;
        expect_count("Ollama", &vectors, texts.len())?;
        Ok(vectors)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f64>>> {
    json.get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| malformed("Ollama", "missing embeddings array"))?
        .iter()
        .map(|embedding| json_vector("Ollama", embedding))
        .collect()
}

/// Create the configured [`EmbeddingProvider`].
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"openai"` | [`OpenAIProvider`] |
/// | `"ollama"` | [`OllamaProvider`] |
/// | `"local"` | `LocalProvider` (requires the `local-embeddings` feature) |
pub fn create_provider(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Arc::new(LocalProvider::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings"),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
