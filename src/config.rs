//! TOML configuration.
//!
//! Every section except `[db]` is optional; missing keys take the defaults
//! below. [`load_config`] parses and validates in one step so the rest of
//! the application can trust the values it receives.
//!
//! ```toml
//! [db]
//! path = "./data/catalog.sqlite"
//!
//! [retrieval]
//! candidate_cap = 100
//! default_limit = 5
//! default_threshold = 0.3
//!
//! [embedding]
//! provider = "ollama"
//! model = "nomic-embed-text"
//! dims = 768
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use command_catalog_core::keywords::{KeywordExtractor, DEFAULT_MIN_LEN};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum number of lexical candidates passed to the ranker.
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,
    #[serde(default = "default_min_keyword_len")]
    pub min_keyword_len: usize,
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_cap: default_candidate_cap(),
            default_limit: default_limit(),
            default_threshold: default_threshold(),
            min_keyword_len: default_min_keyword_len(),
            extra_stopwords: Vec::new(),
        }
    }
}

impl RetrievalConfig {
    pub fn keyword_extractor(&self) -> KeywordExtractor {
        KeywordExtractor::new(self.min_keyword_len)
            .with_extra_stopwords(self.extra_stopwords.iter().cloned())
    }
}

fn default_candidate_cap() -> usize {
    100
}
fn default_limit() -> usize {
    5
}
fn default_threshold() -> f64 {
    0.3
}
fn default_min_keyword_len() -> usize {
    DEFAULT_MIN_LEN
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    2
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` overrides it.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.path.as_os_str().is_empty() {
        bail!("db.path must not be empty");
    }

    let retrieval = &config.retrieval;
    if retrieval.candidate_cap == 0 {
        bail!("retrieval.candidate_cap must be >= 1");
    }
    if retrieval.default_limit == 0 {
        bail!("retrieval.default_limit must be >= 1");
    }
    if !(0.0..=1.0).contains(&retrieval.default_threshold) {
        bail!("retrieval.default_threshold must be in [0.0, 1.0]");
    }
    if retrieval.min_keyword_len == 0 {
        bail!("retrieval.min_keyword_len must be >= 1");
    }

    let embedding = &config.embedding;
    match embedding.provider.as_str() {
        "disabled" | "local" => {}
        "openai" | "ollama" => {
            if embedding.dims.is_none() || embedding.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    embedding.provider
                );
            }
            if embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    embedding.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }
    if embedding.timeout_secs == 0 {
        bail!("embedding.timeout_secs must be > 0");
    }

    Ok(())
}
