//! CLI command implementations.
//!
//! Each command opens the coordinator for the configured storage
//! directory, runs one operation, and prints a human-readable summary to
//! stdout. Diagnostics go to stderr through `tracing`.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use docrecall_core::models::SearchStatus;
use docrecall_core::request::{IndexRequest, SearchRequest};

use crate::config::Config;
use crate::coordinator::{IndexPhase, RetrievalCoordinator};
use crate::embedding;

async fn open(config: &Config) -> Result<RetrievalCoordinator> {
    let provider = embedding::create_provider(&config.embedding)?;
    RetrievalCoordinator::open(config, provider)
        .await
        .with_context(|| format!("Failed to open store at {}", config.storage.dir.display()))
}

fn read_document(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read document from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))
}

/// Index `path` (or stdin for `-`), replacing any previous document.
pub async fn run_index(
    config: &Config,
    path: &Path,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> Result<()> {
    let text = read_document(path)?;
    let defaults = config.index_request();
    let request = IndexRequest {
        chunk_size: chunk_size.unwrap_or(defaults.chunk_size),
        overlap: overlap.unwrap_or(defaults.overlap),
    };

    let coordinator = open(config).await?;
    let report = coordinator.build(&text, request).await?;
    coordinator.wait_for_remote_sync().await;

    if !report.committed {
        anyhow::bail!(
            "index build failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("index");
    if let Some(generation) = &report.generation {
        println!("  generation: {}", generation.id);
        println!("  model: {}", generation.model);
        println!("  dimension: {}", generation.dimension);
    }
    println!("  chunks: {}", report.chunk_count);
    println!("  embedded: {}", report.entry_count);
    if report.keyword_only {
        println!("  mode: keyword only (embedding provider unavailable)");
    }
    println!("  flat index: {}", report.flat_index);
    println!("  remote sync: {}", report.remote_sync);
    Ok(())
}

pub async fn run_search(config: &Config, query: &str, k: Option<usize>, json: bool) -> Result<()> {
    let coordinator = open(config).await?;
    let request = SearchRequest::new(query, k.unwrap_or(config.retrieval.default_k));
    let response = coordinator.search(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response.status {
        SearchStatus::Ok => {}
        SearchStatus::EmptyQuery | SearchStatus::NoMatches => {
            println!("No results.");
            return Ok(());
        }
        SearchStatus::NoDocument => {
            println!("No document indexed. Run `recall index <FILE>` first.");
            return Ok(());
        }
    }

    for (i, result) in response.results.iter().enumerate() {
        println!("{}. [{:.4}] ({})", i + 1, result.score, result.source);
        let excerpt: String = result.text.chars().take(240).collect();
        println!("    \"{}\"", excerpt.replace('\n', " "));
        println!();
    }
    Ok(())
}

pub async fn run_status(config: &Config) -> Result<()> {
    let coordinator = open(config).await?;
    let status = coordinator.status();

    println!("status");
    println!("  storage: {}", config.storage.dir.display());
    let phase = match status.phase {
        IndexPhase::Empty => "empty",
        IndexPhase::Building => "building",
        IndexPhase::Ready => "ready",
    };
    println!("  phase: {}", phase);
    if let Some(generation) = coordinator.current_generation() {
        let meta = generation.meta();
        println!("  generation: {}", meta.id);
        println!("  created: {}", meta.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  chunks: {} (size {}, overlap {})", meta.chunk_count, meta.chunk_size, meta.overlap);
        println!("  embedded: {}", meta.entry_count);
        println!("  model: {}", meta.model);
        if config.remote_store.is_some() {
            println!("  remote synced: {}", generation.remote_synced());
        }
    }
    Ok(())
}

pub async fn run_clear(config: &Config) -> Result<()> {
    let coordinator = open(config).await?;
    coordinator.clear().await?;
    println!("Index cleared.");
    Ok(())
}
