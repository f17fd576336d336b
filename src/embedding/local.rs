//! Local inference via fastembed.
//!
//! The model is downloaded from Hugging Face on first use and cached;
//! after that no network calls are made. Inference is CPU-bound, so it
//! runs on the blocking thread pool.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;

use command_catalog_core::embedding::EmbeddingProvider;
use command_catalog_core::{CatalogError, Result};

use crate::config::EmbeddingConfig;

const DEFAULT_LOCAL_MODEL: &str = "all-minilm-l6-v2";

pub struct LocalProvider {
    model_name: String,
    dims: usize,
    timeout: Duration,
    fastembed_model: fastembed::EmbeddingModel,
    /// Initialized lazily on the first `embed` call.
    model: Arc<Mutex<Option<fastembed::TextEmbedding>>>,
}

impl LocalProvider {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string());
        let (fastembed_model, default_dims) = resolve_model(&model_name)?;

        Ok(Self {
            dims: config.dims.unwrap_or(default_dims),
            model_name,
            timeout: Duration::from_secs(config.timeout_secs),
            fastembed_model,
            model: Arc::new(Mutex::new(None)),
        })
    }
}

fn resolve_model(name: &str) -> anyhow::Result<(fastembed::EmbeddingModel, usize)> {
    use fastembed::EmbeddingModel as M;
    match name {
        "all-minilm-l6-v2" => Ok((M::AllMiniLML6V2, 384)),
        "bge-small-en-v1.5" => Ok((M::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((M::BGEBaseENV15, 768)),
        "nomic-embed-text-v1.5" => Ok((M::NomicEmbedTextV15, 768)),
        "multilingual-e5-small" => Ok((M::MultilingualE5Small, 384)),
        "multilingual-e5-base" => Ok((M::MultilingualE5Base, 768)),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, \
             nomic-embed-text-v1.5, multilingual-e5-small, multilingual-e5-base",
            other
        ),
    }
}

#[async_trait]
impl EmbeddingProvider for LocalProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        let texts = texts.to_vec();
        let slot = Arc::clone(&self.model);
        let which = self.fastembed_model.clone();

        let task = tokio::task::spawn_blocking(move || -> std::result::Result<_, String> {
            let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.is_none() {
                let model = fastembed::TextEmbedding::try_new(
                    fastembed::InitOptions::new(which).with_show_download_progress(false),
                )
                .map_err(|e| format!("failed to initialize local embedding model: {}", e))?;
                *guard = Some(model);
            }
            match guard.as_mut() {
                Some(model) => model
                    .embed(texts, None)
                    .map_err(|e| format!("local embedding failed: {}", e)),
                None => Err("local embedding model unavailable".to_string()),
            }
        });

        let vectors = tokio::time::timeout(self.timeout, task)
            .await
            .map_err(|_| CatalogError::retrieval("local embedding timed out"))?
            .map_err(|e| CatalogError::retrieval(format!("local embedding task failed: {}", e)))?
            .map_err(CatalogError::retrieval)?;

        Ok(vectors
            .into_iter()
            .map(|v| v.into_iter().map(f64::from).collect())
            .collect())
    }
}
