//! Pinecone-compatible managed vector store.
//!
//! Entries are upserted as `<generation>:chunk_<n>` with the chunk text in
//! metadata, so the store can answer queries without touching local files.
//! Queries are filtered to the generation that was synced, which keeps
//! results from an older generation out of the response after a rebuild.
//!
//! Only the data plane is used (`/vectors/upsert` and `/query`); the index
//! itself must already exist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use docrecall_core::index::{rank, BuildOutcome, VectorIndex};
use docrecall_core::models::{chunk_label, BackendKind, BuildGeneration, IndexEntry, ScoredEntry};
use docrecall_core::{Result, RetrievalError};

use crate::config::RemoteStoreConfig;
use crate::storage::parse_chunk_label;

pub struct RemoteStoreBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
    namespace: String,
    batch_size: usize,
    serve_queries: bool,
    generation_id: String,
    dimension: usize,
    synced: AtomicBool,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: String,
    values: &'a [f32],
    metadata: VectorMetadata<'a>,
}

#[derive(Serialize)]
struct VectorMetadata<'a> {
    text: &'a str,
    chunk_id: String,
    generation: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    namespace: &'a str,
    filter: serde_json::Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: String,
    #[serde(default)]
    chunk_id: Option<String>,
}

impl RemoteStoreBackend {
    /// Returns `None` when the API key variable is unset or the HTTP client
    /// cannot be built; the store is then simply not part of the generation.
    pub fn from_config(
        config: &RemoteStoreConfig,
        generation_id: &str,
        dimension: usize,
    ) -> Option<Self> {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(
                    env = %config.api_key_env,
                    "remote store configured but API key is not set; skipping"
                );
                return None;
            }
        };

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "failed to build remote store client");
                return None;
            }
        };

        Some(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key,
            namespace: config.namespace.clone(),
            batch_size: config.batch_size.max(1),
            serve_queries: config.serve_queries,
            generation_id: generation_id.to_string(),
            dimension,
            synced: AtomicBool::new(false),
        })
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// Enable the read path for a generation synced by an earlier process.
    pub fn mark_synced(&self) {
        self.synced.store(true, Ordering::Release);
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn vector_id(&self, chunk_id: usize) -> String {
        format!("{}:{}", self.generation_id, chunk_label(chunk_id))
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(format!("{}{}", self.url, path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| RetrievalError::BackendUnavailable(format!("remote store: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RetrievalError::BackendUnavailable(format!(
                "remote store {} returned {}: {}",
                path, status, body
            )));
        }
        Ok(resp)
    }
}

#[async_trait]
impl VectorIndex for RemoteStoreBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::RemoteStore
    }

    fn is_available(&self) -> bool {
        self.serve_queries && self.is_synced()
    }

    async fn build(
        &self,
        entries: &[IndexEntry],
        generation: &BuildGeneration,
    ) -> Result<BuildOutcome> {
        if generation.id != self.generation_id {
            return Err(RetrievalError::InvalidRequest(format!(
                "remote store bound to generation {}, asked to sync {}",
                self.generation_id, generation.id
            )));
        }

        let mut upserted = 0;
        for batch in entries.chunks(self.batch_size) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|e| UpsertVector {
                        id: self.vector_id(e.chunk_id),
                        values: &e.vector,
                        metadata: VectorMetadata {
                            text: &e.text,
                            chunk_id: chunk_label(e.chunk_id),
                            generation: &self.generation_id,
                        },
                    })
                    .collect(),
                namespace: &self.namespace,
            };
            self.post("/vectors/upsert", &request).await?;
            upserted += batch.len();
            tracing::debug!(upserted, total = entries.len(), "remote store upsert");
        }

        self.mark_synced();
        Ok(BuildOutcome {
            kind: BackendKind::RemoteStore,
            indexed: upserted,
        })
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        if vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let request = QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
            namespace: &self.namespace,
            filter: serde_json::json!({ "generation": { "$eq": self.generation_id } }),
        };
        let resp: QueryResponse = self
            .post("/query", &request)
            .await?
            .json()
            .await
            .map_err(|e| RetrievalError::BackendUnavailable(format!("remote store: {}", e)))?;

        let hits = resp
            .matches
            .into_iter()
            .filter_map(|m| {
                let metadata = m.metadata?;
                let label = metadata
                    .chunk_id
                    .unwrap_or_else(|| m.id.rsplit(':').next().unwrap_or_default().to_string());
                let chunk_id = parse_chunk_label(&label).ok()?;
                Some(ScoredEntry {
                    score: m.score,
                    chunk_id,
                    text: metadata.text,
                })
            })
            .collect();

        Ok(rank(hits, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key_env: &str, serve: bool) -> RemoteStoreConfig {
        RemoteStoreConfig {
            url: "http://127.0.0.1:9/".into(),
            api_key_env: key_env.into(),
            namespace: "ns".into(),
            batch_size: 100,
            timeout_secs: 1,
            serve_queries: serve,
        }
    }

    #[test]
    fn test_missing_key_disables_store() {
        assert!(RemoteStoreBackend::from_config(
            &config("DOCRECALL_TEST_UNSET_STORE_KEY", true),
            "g",
            3
        )
        .is_none());
    }

    #[test]
    fn test_unsynced_store_is_unavailable() {
        std::env::set_var("DOCRECALL_TEST_STORE_KEY_A", "k");
        let store =
            RemoteStoreBackend::from_config(&config("DOCRECALL_TEST_STORE_KEY_A", true), "g1", 3)
                .unwrap();
        assert!(!store.is_available());
        assert_eq!(store.vector_id(4), "g1:chunk_4");
        assert_eq!(store.url, "http://127.0.0.1:9");

        store.mark_synced();
        assert!(store.is_available());
    }

    #[test]
    fn test_write_only_store_never_serves() {
        std::env::set_var("DOCRECALL_TEST_STORE_KEY_B", "k");
        let store =
            RemoteStoreBackend::from_config(&config("DOCRECALL_TEST_STORE_KEY_B", false), "g", 3)
                .unwrap();
        store.mark_synced();
        assert!(!store.is_available());
    }
}
