use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use docrecall_core::request::IndexRequest;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub remote_store: Option<RemoteStoreConfig>,
}

impl Config {
    /// A config with every section at its default, storing under `dir`.
    /// Embeddings are disabled.
    pub fn with_storage_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig { dir: dir.into() },
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            remote_store: None,
        }
    }

    /// Build parameters taken from `[chunking]`.
    pub fn index_request(&self) -> IndexRequest {
        IndexRequest {
            chunk_size: self.chunking.size,
            overlap: self.chunking.overlap,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    800
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_max_k")]
    pub max_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            max_k: default_max_k(),
        }
    }
}

fn default_k() -> usize {
    3
}
fn default_max_k() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL of the embedding service. Defaults per provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum embedding requests in flight during a build.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
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
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_concurrency() -> usize {
    4
}
fn default_max_retries() -> u32 {
    5
}
fn default_retry_base_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Pinecone-compatible managed vector store.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteStoreConfig {
    /// Index host, e.g. `https://my-index-abc123.svc.us-east1.pinecone.io`.
    pub url: String,
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_upsert_batch")]
    pub batch_size: usize,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
    /// Consult the store at query time once the current generation is synced.
    #[serde(default)]
    pub serve_queries: bool,
}

fn default_store_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}
fn default_namespace() -> String {
    "docrecall".to_string()
}
fn default_upsert_batch() -> usize {
    100
}
fn default_store_timeout_secs() -> u64 {
    10
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.size == 0 {
        anyhow::bail!("chunking.size must be > 0");
    }

    // Validate retrieval
    if config.retrieval.max_k < 1 {
        anyhow::bail!("retrieval.max_k must be >= 1");
    }
    if !(1..=config.retrieval.max_k).contains(&config.retrieval.default_k) {
        anyhow::bail!(
            "retrieval.default_k must be in 1..={}",
            config.retrieval.max_k
        );
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    if config.embedding.is_enabled() {
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.dims == Some(0) {
            anyhow::bail!("embedding.dims must be > 0 when set");
        }
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.concurrency == 0 {
        anyhow::bail!("embedding.concurrency must be > 0");
    }

    if let Some(store) = &config.remote_store {
        if store.url.trim().is_empty() {
            anyhow::bail!("remote_store.url must not be empty");
        }
        if store.batch_size == 0 {
            anyhow::bail!("remote_store.batch_size must be > 0");
        }
    }

    Ok(())
}
