//! Build and query orchestration over immutable generations.
//!
//! A build stages a complete generation in its own directory, then commits
//! it by repointing `CURRENT` and swapping the in-memory pointer. Queries
//! clone the current [`Generation`] and never wait on a build, so they
//! always see the last committed generation. A generation that has been
//! replaced deletes its directory once the last query holding it finishes.
//!
//! Query order: flat → remote store (when enabled and synced) → linear scan
//! → keyword. Unavailable or failing backends are skipped.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use docrecall_core::chunk::chunk_text;
use docrecall_core::embedding::{uniform_dimension, EmbeddingProvider};
use docrecall_core::index::VectorIndex;
use docrecall_core::models::{
    BackendKind, BuildGeneration, Chunk, IndexEntry, ScoredEntry, SearchResponse, SearchResult,
    SearchStatus,
};
use docrecall_core::request::{IndexRequest, SearchRequest};
use docrecall_core::{Result, RetrievalError};

use crate::backends::{FlatIndexBackend, KeywordFallback, LinearScanFallback, RemoteStoreBackend};
use crate::config::{Config, EmbeddingConfig, RemoteStoreConfig};
use crate::storage::{self, RemoteSyncMarker, GENERATION_FILE, REMOTE_SYNC_FILE};

/// One committed build and the backends bound to its directory.
pub struct Generation {
    meta: BuildGeneration,
    dir: PathBuf,
    flat: FlatIndexBackend,
    remote: Option<Arc<RemoteStoreBackend>>,
    linear: LinearScanFallback,
    keyword: KeywordFallback,
    retired: AtomicBool,
}

impl Generation {
    fn new(meta: BuildGeneration, dir: PathBuf, remote_cfg: Option<&RemoteStoreConfig>) -> Self {
        let remote = match remote_cfg {
            Some(cfg) if meta.has_embeddings() => {
                RemoteStoreBackend::from_config(cfg, &meta.id, meta.dimension).map(Arc::new)
            }
            _ => None,
        };
        Self {
            flat: FlatIndexBackend::new(&dir),
            linear: LinearScanFallback::new(&dir),
            keyword: KeywordFallback::new(&dir),
            remote,
            meta,
            dir,
            retired: AtomicBool::new(false),
        }
    }

    pub fn meta(&self) -> &BuildGeneration {
        &self.meta
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn remote_synced(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.is_synced())
    }

    /// Schedule directory removal for when the last reference is dropped.
    fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    /// Re-enable the remote read path if an earlier process recorded a
    /// successful sync to the same store.
    async fn restore_remote_sync(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        if let Ok(marker) =
            storage::read_json::<RemoteSyncMarker>(&self.dir.join(REMOTE_SYNC_FILE)).await
        {
            if marker.url == remote.url() && marker.namespace == remote.namespace() {
                remote.mark_synced();
            }
        }
    }

    fn vector_backends(&self) -> Vec<&dyn VectorIndex> {
        let mut chain: Vec<&dyn VectorIndex> = vec![&self.flat];
        if let Some(remote) = &self.remote {
            chain.push(remote.as_ref());
        }
        chain.push(&self.linear);
        chain
    }

    /// First non-empty answer from the vector chain.
    async fn vector_search(&self, vector: &[f32], k: usize) -> Option<(BackendKind, Vec<ScoredEntry>)> {
        for backend in self.vector_backends() {
            let kind = backend.kind();
            if !backend.is_available() {
                tracing::debug!(backend = %kind, "backend unavailable, skipping");
                continue;
            }
            match backend.query(vector, k).await {
                Ok(hits) if !hits.is_empty() => return Some((kind, hits)),
                Ok(_) => tracing::debug!(backend = %kind, "backend returned no results"),
                Err(e) => tracing::warn!(backend = %kind, error = %e, "backend query failed"),
            }
        }
        None
    }
}

impl Drop for Generation {
    fn drop(&mut self) {
        if self.retired.load(Ordering::Acquire) {
            if let Err(e) = std::fs::remove_dir_all(&self.dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "failed to remove retired generation");
                }
            }
        }
    }
}

/// Outcome of one optional build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum StepStatus {
    Done,
    Scheduled,
    Skipped,
    Failed(String),
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Done => f.write_str("done"),
            StepStatus::Scheduled => f.write_str("scheduled"),
            StepStatus::Skipped => f.write_str("skipped"),
            StepStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub committed: bool,
    /// The generation now being served: the new one when committed,
    /// otherwise the one that was kept.
    pub generation: Option<BuildGeneration>,
    pub chunk_count: usize,
    pub entry_count: usize,
    pub keyword_only: bool,
    pub flat_index: StepStatus,
    pub remote_sync: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildReport {
    /// Committed, but the flat index could not be built.
    pub fn is_partial(&self) -> bool {
        self.committed && matches!(self.flat_index, StepStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPhase {
    Empty,
    Building,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub phase: IndexPhase,
    /// Generation being served. Present while `Building` if a previous
    /// build committed.
    pub generation: Option<BuildGeneration>,
}

/// Raised for the lifetime of a build; `status` reads it without touching
/// the build lock.
struct BuildingFlag<'a>(&'a AtomicBool);

impl<'a> BuildingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for BuildingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Staged {
    generation: Generation,
    entries: Vec<IndexEntry>,
    flat_index: StepStatus,
}

pub struct RetrievalCoordinator {
    storage_dir: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    embedding: EmbeddingConfig,
    remote_store: Option<RemoteStoreConfig>,
    max_k: usize,
    current: RwLock<Option<Arc<Generation>>>,
    build_lock: tokio::sync::Mutex<()>,
    building: AtomicBool,
    remote_sync: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RetrievalCoordinator {
    /// Open the store under `config.storage.dir`, recovering the committed
    /// generation and deleting directories left behind by abandoned builds.
    pub async fn open(config: &Config, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let storage_dir = config.storage.dir.clone();
        tokio::fs::create_dir_all(storage::generations_root(&storage_dir)).await?;

        let mut current = None;
        if let Some(id) = storage::read_current(&storage_dir).await? {
            let dir = storage::generation_dir(&storage_dir, &id);
            match storage::read_json::<BuildGeneration>(&dir.join(GENERATION_FILE)).await {
                Ok(meta) => {
                    let generation = Generation::new(meta, dir, config.remote_store.as_ref());
                    generation.restore_remote_sync().await;
                    tracing::info!(
                        generation = %id,
                        chunks = generation.meta.chunk_count,
                        entries = generation.meta.entry_count,
                        "recovered current generation"
                    );
                    current = Some(Arc::new(generation));
                }
                Err(e) => {
                    tracing::warn!(generation = %id, error = %e, "current generation unreadable; starting empty");
                }
            }
        }

        let keep = current.as_ref().map(|g: &Arc<Generation>| g.meta.id.clone());
        for id in storage::list_generations(&storage_dir).await? {
            if Some(&id) == keep.as_ref() {
                continue;
            }
            let dir = storage::generation_dir(&storage_dir, &id);
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => tracing::debug!(generation = %id, "removed orphaned generation"),
                Err(e) => tracing::warn!(generation = %id, error = %e, "failed to remove orphaned generation"),
            }
        }

        Ok(Self {
            storage_dir,
            provider,
            embedding: config.embedding.clone(),
            remote_store: config.remote_store.clone(),
            max_k: config.retrieval.max_k,
            current: RwLock::new(current),
            build_lock: tokio::sync::Mutex::new(()),
            building: AtomicBool::new(false),
            remote_sync: std::sync::Mutex::new(None),
        })
    }

    /// The generation queries currently see.
    pub fn current_generation(&self) -> Option<Arc<Generation>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn swap(&self, next: Option<Arc<Generation>>) -> Option<Arc<Generation>> {
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *slot, next)
    }

    pub fn status(&self) -> IndexStatus {
        let generation = self.current_generation().map(|g| g.meta.clone());
        let phase = if self.building.load(Ordering::Acquire) {
            IndexPhase::Building
        } else if generation.is_some() {
            IndexPhase::Ready
        } else {
            IndexPhase::Empty
        };
        IndexStatus { phase, generation }
    }

    /// Replace the indexed document with `text`.
    ///
    /// Returns `Err` only for an invalid request or a concurrent build.
    /// Any other failure yields a report with `committed == false` and
    /// leaves the previous generation in place.
    pub async fn build(&self, text: &str, request: IndexRequest) -> Result<BuildReport> {
        request.validate()?;
        let _guard = self
            .build_lock
            .try_lock()
            .map_err(|_| RetrievalError::BuildInProgress)?;
        let _building = BuildingFlag::raise(&self.building);

        let id = Uuid::new_v4().to_string();
        let dir = storage::generation_dir(&self.storage_dir, &id);
        tracing::info!(generation = %id, chars = text.chars().count(), "building generation");

        let staged = match self.stage(&id, &dir, text, request).await {
            Ok(staged) => staged,
            Err(e) => return Ok(self.abandon(&id, &dir, e).await),
        };
        if let Err(e) = storage::write_current(&self.storage_dir, &id).await {
            return Ok(self.abandon(&id, &dir, e).await);
        }

        let Staged {
            generation,
            entries,
            flat_index,
        } = staged;
        let meta = generation.meta.clone();
        let remote = generation.remote.clone();
        if let Some(previous) = self.swap(Some(Arc::new(generation))) {
            previous.retire();
        }

        let remote_sync = match remote {
            Some(remote) if !entries.is_empty() => {
                self.schedule_remote_sync(remote, entries, meta.clone(), dir);
                StepStatus::Scheduled
            }
            _ => StepStatus::Skipped,
        };

        tracing::info!(
            generation = %meta.id,
            chunks = meta.chunk_count,
            entries = meta.entry_count,
            flat_index = %flat_index,
            "generation committed"
        );

        Ok(BuildReport {
            committed: true,
            chunk_count: meta.chunk_count,
            entry_count: meta.entry_count,
            keyword_only: !meta.has_embeddings(),
            generation: Some(meta),
            flat_index,
            remote_sync,
            error: None,
        })
    }

    async fn stage(
        &self,
        id: &str,
        dir: &Path,
        text: &str,
        request: IndexRequest,
    ) -> Result<Staged> {
        tokio::fs::create_dir_all(dir).await?;

        let chunks = chunk_text(text, request.chunk_size, request.overlap);
        let keyword = KeywordFallback::new(dir);
        keyword.persist(&chunks).await?;

        let entries = match self.embed_chunks(&chunks).await? {
            Some(entries) => entries,
            None => {
                tracing::warn!(generation = %id, "embedding provider unavailable; building keyword-only generation");
                Vec::new()
            }
        };
        let dimension = entries.first().map(|e| e.vector.len()).unwrap_or(0);

        let meta = BuildGeneration {
            id: id.to_string(),
            created_at: chrono::Utc::now(),
            dimension,
            entry_count: entries.len(),
            chunk_count: chunks.len(),
            chunk_size: request.chunk_size,
            overlap: request.overlap,
            model: self.provider.model_name().to_string(),
            text_sha256: storage::sha256_hex(text.as_bytes()),
        };
        let generation = Generation::new(meta, dir.to_path_buf(), self.remote_store.as_ref());

        let flat_index = if entries.is_empty() {
            StepStatus::Skipped
        } else {
            generation.linear.build(&entries, &generation.meta).await?;
            match generation.flat.build(&entries, &generation.meta).await {
                Ok(_) => StepStatus::Done,
                Err(e) => {
                    tracing::warn!(generation = %id, error = %e, "flat index build failed; linear scan will serve");
                    StepStatus::Failed(e.to_string())
                }
            }
        };

        storage::write_json(&dir.join(GENERATION_FILE), &generation.meta).await?;

        Ok(Staged {
            generation,
            entries,
            flat_index,
        })
    }

    /// Embed every chunk, `batch_size` texts per request with at most
    /// `concurrency` requests in flight. Returns `None` when the provider
    /// cannot embed at all.
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Option<Vec<IndexEntry>>> {
        if !self.provider.is_available() {
            return Ok(None);
        }

        let provider = self.provider.as_ref();
        let batches: Vec<Vec<String>> = chunks
            .chunks(self.embedding.batch_size.max(1))
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
            .collect();

        let embedded: Vec<Vec<Vec<f32>>> = match stream::iter(batches)
            .map(|texts| async move { provider.embed_batch(&texts).await })
            .buffered(self.embedding.concurrency.max(1))
            .try_collect()
            .await
        {
            Ok(embedded) => embedded,
            Err(RetrievalError::ProviderUnavailable(reason)) => {
                tracing::warn!(reason = %reason, "embedding provider unavailable");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let vectors: Vec<Vec<f32>> = embedded.into_iter().flatten().collect();
        if vectors.len() != chunks.len() {
            return Err(RetrievalError::ProviderCallFailed(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        uniform_dimension(&vectors)?;

        Ok(Some(
            chunks
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| IndexEntry {
                    chunk_id: chunk.id,
                    text: chunk.text.clone(),
                    vector,
                })
                .collect(),
        ))
    }

    async fn abandon(&self, id: &str, dir: &Path, error: RetrievalError) -> BuildReport {
        tracing::warn!(generation = %id, error = %error, "build failed; keeping previous generation");
        if let Err(e) = tokio::fs::remove_dir_all(dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(generation = %id, error = %e, "failed to remove staging directory");
            }
        }
        BuildReport {
            committed: false,
            generation: self.current_generation().map(|g| g.meta.clone()),
            chunk_count: 0,
            entry_count: 0,
            keyword_only: false,
            flat_index: StepStatus::Skipped,
            remote_sync: StepStatus::Skipped,
            error: Some(error.to_string()),
        }
    }

    fn schedule_remote_sync(
        &self,
        remote: Arc<RemoteStoreBackend>,
        entries: Vec<IndexEntry>,
        meta: BuildGeneration,
        dir: PathBuf,
    ) {
        let handle = tokio::spawn(async move {
            match remote.build(&entries, &meta).await {
                Ok(outcome) => {
                    tracing::info!(generation = %meta.id, upserted = outcome.indexed, "remote store synced");
                    let marker = RemoteSyncMarker {
                        url: remote.url().to_string(),
                        namespace: remote.namespace().to_string(),
                        entries: outcome.indexed,
                        synced_at: chrono::Utc::now(),
                    };
                    if let Err(e) = storage::write_json(&dir.join(REMOTE_SYNC_FILE), &marker).await {
                        tracing::debug!(generation = %meta.id, error = %e, "could not record remote sync");
                    }
                }
                Err(e) => {
                    tracing::warn!(generation = %meta.id, error = %e, "remote store sync failed");
                }
            }
        });
        *self.remote_sync.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Wait for the most recently scheduled remote sync, if any.
    pub async fn wait_for_remote_sync(&self) {
        let handle = self
            .remote_sync
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "remote sync task panicked");
            }
        }
    }

    /// Top-`k` chunks for `request.query`.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        request.validate(self.max_k)?;
        let query = request.trimmed_query();
        if query.is_empty() {
            return Ok(SearchResponse::empty(SearchStatus::EmptyQuery, "query is empty"));
        }
        let Some(generation) = self.current_generation() else {
            return Ok(SearchResponse::empty(
                SearchStatus::NoDocument,
                "no document has been indexed",
            ));
        };

        if generation.meta.has_embeddings() && self.provider.is_available() {
            match self.provider.embed(query).await {
                Ok(vector) => {
                    if let Some((kind, hits)) = generation.vector_search(&vector, request.k).await {
                        tracing::debug!(backend = %kind, hits = hits.len(), "query served");
                        return Ok(SearchResponse::served(kind, to_results(kind, hits)));
                    }
                    tracing::warn!("vector backends exhausted; falling back to keyword search");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "query embedding failed; falling back to keyword search");
                }
            }
        }

        let kind = generation.keyword.kind();
        if !generation.keyword.is_available() {
            tracing::warn!(generation = %generation.meta.id, "keyword index missing");
            return Ok(SearchResponse::empty(
                SearchStatus::NoMatches,
                "keyword index unavailable",
            ));
        }
        match generation.keyword.query(query, request.k).await {
            Ok(hits) if !hits.is_empty() => Ok(SearchResponse::served(kind, to_results(kind, hits))),
            Ok(_) => Ok(SearchResponse::empty(
                SearchStatus::NoMatches,
                format!("no chunk mentions '{}'", query),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "keyword search failed");
                Ok(SearchResponse::empty(
                    SearchStatus::NoMatches,
                    format!("keyword search failed: {}", e),
                ))
            }
        }
    }

    /// Forget the indexed document.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self
            .build_lock
            .try_lock()
            .map_err(|_| RetrievalError::BuildInProgress)?;
        storage::remove_current(&self.storage_dir).await?;
        if let Some(previous) = self.swap(None) {
            tracing::info!(generation = %previous.meta.id, "cleared index");
            previous.retire();
        }
        Ok(())
    }
}

fn to_results(source: BackendKind, hits: Vec<ScoredEntry>) -> Vec<SearchResult> {
    hits.into_iter()
        .map(|hit| SearchResult {
            score: hit.score,
            text: hit.text,
            source,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::UnconfiguredProvider;
    use tempfile::TempDir;

    #[test]
    fn test_step_status_display() {
        assert_eq!(StepStatus::Done.to_string(), "done");
        assert_eq!(StepStatus::Failed("x".into()).to_string(), "failed: x");
    }

    #[test]
    fn test_partial_report() {
        let report = BuildReport {
            committed: true,
            generation: None,
            chunk_count: 1,
            entry_count: 1,
            keyword_only: false,
            flat_index: StepStatus::Failed("disk".into()),
            remote_sync: StepStatus::Skipped,
            error: None,
        };
        assert!(report.is_partial());
    }

    #[tokio::test]
    async fn test_open_removes_orphans() {
        let tmp = TempDir::new().unwrap();
        let orphan = storage::generation_dir(tmp.path(), "abandoned");
        std::fs::create_dir_all(&orphan).unwrap();

        let coordinator = RetrievalCoordinator::open(
            &Config::with_storage_dir(tmp.path()),
            Arc::new(UnconfiguredProvider::new("test")),
        )
        .await
        .unwrap();
        assert!(!orphan.exists());
        assert_eq!(coordinator.status().phase, IndexPhase::Empty);
    }

    #[tokio::test]
    async fn test_keyword_only_generation_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let coordinator = RetrievalCoordinator::open(
            &Config::with_storage_dir(tmp.path()),
            Arc::new(UnconfiguredProvider::new("test")),
        )
        .await
        .unwrap();

        let report = coordinator
            .build("alpha beta gamma", IndexRequest::default())
            .await
            .unwrap();
        assert!(report.committed);
        assert!(report.keyword_only);
        assert_eq!(report.flat_index, StepStatus::Skipped);
        let first = coordinator.current_generation().unwrap();
        let first_dir = first.dir().to_path_buf();
        drop(first);

        coordinator
            .build("delta epsilon", IndexRequest::default())
            .await
            .unwrap();
        assert!(!first_dir.exists());

        coordinator.clear().await.unwrap();
        assert_eq!(coordinator.status().phase, IndexPhase::Empty);
        assert_eq!(storage::read_current(tmp.path()).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_status_polling_never_blocks_builds() {
        let tmp = TempDir::new().unwrap();
        let coordinator = Arc::new(
            RetrievalCoordinator::open(
                &Config::with_storage_dir(tmp.path()),
                Arc::new(UnconfiguredProvider::new("test")),
            )
            .await
            .unwrap(),
        );

        let done = Arc::new(AtomicBool::new(false));
        let pollers: Vec<_> = (0..3)
            .map(|_| {
                let coordinator = coordinator.clone();
                let done = done.clone();
                tokio::spawn(async move {
                    while !done.load(Ordering::Relaxed) {
                        let _ = coordinator.status();
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let report = coordinator
                .build(&format!("document number {}", i), IndexRequest::default())
                .await
                .unwrap();
            assert!(report.committed);
            coordinator.clear().await.unwrap();
        }
        done.store(true, Ordering::Relaxed);
        for poller in pollers {
            poller.await.unwrap();
        }
        assert_eq!(coordinator.status().phase, IndexPhase::Empty);
    }

    #[tokio::test]
    async fn test_status_reflects_build_flag_not_lock() {
        let tmp = TempDir::new().unwrap();
        let coordinator = RetrievalCoordinator::open(
            &Config::with_storage_dir(tmp.path()),
            Arc::new(UnconfiguredProvider::new("test")),
        )
        .await
        .unwrap();

        {
            let _flag = BuildingFlag::raise(&coordinator.building);
            assert_eq!(coordinator.status().phase, IndexPhase::Building);
        }
        assert_eq!(coordinator.status().phase, IndexPhase::Empty);

        // A clear holding the lock is not reported as a build.
        let _held = coordinator.build_lock.lock().await;
        assert_eq!(coordinator.status().phase, IndexPhase::Empty);
    }

    #[tokio::test]
    async fn test_retired_generation_outlives_readers() {
        let tmp = TempDir::new().unwrap();
        let coordinator = RetrievalCoordinator::open(
            &Config::with_storage_dir(tmp.path()),
            Arc::new(UnconfiguredProvider::new("test")),
        )
        .await
        .unwrap();
        coordinator.build("one", IndexRequest::default()).await.unwrap();
        let held = coordinator.current_generation().unwrap();

        coordinator.build("two", IndexRequest::default()).await.unwrap();
        assert!(held.dir().exists());
        assert_eq!(held.keyword.query("one", 1).await.unwrap().len(), 1);

        let dir = held.dir().to_path_buf();
        drop(held);
        assert!(!dir.exists());
    }
}
