//! Embedding provider implementations.
//!
//! Concrete implementations of [`EmbeddingProvider`]:
//! - **[`UnconfiguredProvider`]**: fails every call with `ProviderUnavailable`;
//!   used when embeddings are disabled or the API credential is missing.
//! - **[`RemoteApiProvider`]**: calls an embedding service over HTTP, speaking
//!   either the OpenAI `/embeddings` protocol or Ollama's `/api/embed`.
//!
//! # Provider Selection
//!
//! Use [`create_provider`] to instantiate the appropriate provider based
//! on the configuration:
//!
//! ```rust
//! # use docrecall::config::EmbeddingConfig;
//! # use docrecall::embedding::create_provider;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! assert!(!provider.is_available());
//! ```
//!
//! # Retry Strategy
//!
//! The remote provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately (`ProviderRejected`)
//! - Network errors and timeouts → retry
//! - Backoff: `retry_base_ms × 2^(attempt-1)`, exponent capped at 5
//!
//! Exhausting the retries yields `ProviderCallFailed`.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use docrecall_core::embedding::EmbeddingProvider;
use docrecall_core::{Result, RetrievalError};

use crate::config::EmbeddingConfig;

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

// ============ Unconfigured Provider ============

/// A provider with no embedding capability.
///
/// Callers treat its `ProviderUnavailable` error as the signal to skip
/// every embedding-based path and fall back to keyword matching.
pub struct UnconfiguredProvider {
    reason: String,
}

impl UnconfiguredProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for UnconfiguredProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> Option<usize> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RetrievalError::ProviderUnavailable(self.reason.clone()))
    }
}

// ============ Remote API Provider ============

/// Wire protocol spoken by a [`RemoteApiProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `POST {url}/embeddings`, bearer auth, `data[].embedding` response.
    OpenAi,
    /// `POST {url}/api/embed`, no auth, `embeddings[]` response.
    Ollama,
}

impl fmt::Display for ApiFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFlavor::OpenAi => f.write_str("OpenAI"),
            ApiFlavor::Ollama => f.write_str("Ollama"),
        }
    }
}

/// Embedding provider backed by a network service.
///
/// # Features
///
/// - Batched embedding (multiple texts per API call)
/// - Per-request timeout
/// - Exponential backoff retry for rate limits, server errors, and
///   network failures
/// - Response validation: one vector per input, configured dimension
pub struct RemoteApiProvider {
    flavor: ApiFlavor,
    model: String,
    dims: Option<usize>,
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    max_retries: u32,
    retry_base_ms: u64,
}

impl RemoteApiProvider {
    /// Create a provider from configuration and an optional API key.
    ///
    /// # Errors
    ///
    /// Returns an error if `embedding.model` is missing or the HTTP client
    /// cannot be constructed.
    pub fn new(
        flavor: ApiFlavor,
        config: &EmbeddingConfig,
        api_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for {} provider", flavor))?;
        let default_url = match flavor {
            ApiFlavor::OpenAi => OPENAI_DEFAULT_URL,
            ApiFlavor::Ollama => OLLAMA_DEFAULT_URL,
        };
        let url = config
            .url
            .as_deref()
            .unwrap_or(default_url)
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build embedding HTTP client")?;

        Ok(Self {
            flavor,
            model,
            dims: config.dims,
            url,
            api_key,
            client,
            max_retries: config.max_retries,
            retry_base_ms: config.retry_base_ms,
        })
    }

    fn endpoint(&self) -> String {
        match self.flavor {
            ApiFlavor::OpenAi => format!("{}/embeddings", self.url),
            ApiFlavor::Ollama => format!("{}/api/embed", self.url),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << (attempt.saturating_sub(1)).min(5);
        Duration::from_millis(self.retry_base_ms.saturating_mul(factor))
    }

    /// Verify a decoded response against the request.
    fn check_batch(&self, expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
        if vectors.len() != expected {
            return Err(RetrievalError::ProviderCallFailed(format!(
                "{} returned {} embeddings for {} inputs",
                self.flavor,
                vectors.len(),
                expected
            )));
        }
        if let Some(dims) = self.dims {
            if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dims,
                    actual: bad.len(),
                });
            }
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteApiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> Option<usize> {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let endpoint = self.endpoint();

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff(attempt)).await;
            }

            let mut request = self
                .client
                .post(&endpoint)
                .header("Content-Type", "application/json")
                .json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: Value = response.json().await.map_err(|e| {
                            RetrievalError::ProviderCallFailed(format!(
                                "invalid {} response body: {}",
                                self.flavor, e
                            ))
                        })?;
                        let vectors = match self.flavor {
                            ApiFlavor::OpenAi => parse_openai_response(&json)?,
                            ApiFlavor::Ollama => parse_ollama_response(&json)?,
                        };
                        debug!(batch = texts.len(), attempt, "embedding batch complete");
                        return self.check_batch(texts.len(), vectors);
                    }

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        warn!(%status, attempt, "{} embedding request failed, will retry", self.flavor);
                        last_err = Some(format!("{} API error {}: {}", self.flavor, status, body_text));
                        continue;
                    }

                    // Client error (not 429): fail now
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(RetrievalError::ProviderRejected(format!(
                        "{} API error {}: {}",
                        self.flavor, status, body_text
                    )));
                }
                Err(e) => {
                    warn!(error = %e, attempt, "{} embedding request did not complete", self.flavor);
                    last_err = Some(format!("{} connection error at {}: {}", self.flavor, self.url, e));
                    continue;
                }
            }
        }

        Err(RetrievalError::ProviderCallFailed(last_err.unwrap_or_else(|| {
            "embedding failed after retries".to_string()
        })))
    }
}

/// Parse an OpenAI embeddings response.
///
/// Extracts `data[].embedding` and orders the vectors by `data[].index`
/// so they line up with the request's input order.
fn parse_openai_response(json: &Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| invalid_response("OpenAI", "missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());

    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| invalid_response("OpenAI", "missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        indexed.push((index, to_f32_vec(embedding)));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

/// Parse an Ollama `/api/embed` response (`embeddings: [[f32]]`).
fn parse_ollama_response(json: &Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| invalid_response("Ollama", "missing embeddings array"))?;

    embeddings
        .iter()
        .map(|embedding| {
            embedding
                .as_array()
                .map(|values| to_f32_vec(values))
                .ok_or_else(|| invalid_response("Ollama", "embedding is not an array"))
        })
        .collect()
}

fn to_f32_vec(values: &[Value]) -> Vec<f32> {
    values
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect()
}

fn invalid_response(flavor: &str, detail: &str) -> RetrievalError {
    RetrievalError::ProviderCallFailed(format!("Invalid {} response: {}", flavor, detail))
}

/// Create the [`EmbeddingProvider`] selected by configuration.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`UnconfiguredProvider`] |
/// | `"openai"` | [`RemoteApiProvider`] (OpenAI), or [`UnconfiguredProvider`] if the key env var is unset |
/// | `"ollama"` | [`RemoteApiProvider`] (Ollama) |
///
/// # Errors
///
/// Returns an error for unknown provider names or if the provider cannot be
/// initialized from the config.
pub fn create_provider(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(UnconfiguredProvider::new(
            "embedding provider is disabled",
        ))),
        "openai" => match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Arc::new(RemoteApiProvider::new(
                ApiFlavor::OpenAi,
                config,
                Some(key),
            )?)),
            _ => {
                warn!(
                    env = %config.api_key_env,
                    "API key not set; embeddings disabled, keyword search only"
                );
                Ok(Arc::new(UnconfiguredProvider::new(format!(
                    "{} is not set",
                    config.api_key_env
                ))))
            }
        },
        "ollama" => Ok(Arc::new(RemoteApiProvider::new(
            ApiFlavor::Ollama,
            config,
            None,
        )?)),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}
