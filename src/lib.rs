//! # docrecall
//!
//! Semantic retrieval over a single document, degrading gracefully from
//! exact vector search to plain keyword matching.
//!
//! A document is split into overlapping chunks, each chunk is embedded, and
//! the embeddings are indexed by several backends. Every build produces an
//! immutable generation on disk; queries are answered from the last
//! committed generation by the first backend that can serve them.
//!
//! ## Architecture
//!
//! ```text
//!   text ──▶ chunk ──▶ embed (batched, bounded concurrency)
//!                          │
//!          ┌───────────────┼──────────────┬──────────────┐
//!          ▼               ▼              ▼              ▼
//!     ┌─────────┐   ┌────────────┐  ┌───────────┐  ┌──────────┐
//!     │  Flat   │   │RemoteStore │  │LinearScan │  │ Keyword  │
//!     └─────────┘   └────────────┘  └───────────┘  └──────────┘
//!          query order: left to right, first non-empty answer wins
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | OpenAI / Ollama providers and the unconfigured fallback |
//! | [`backends`] | Index backends bound to one generation |
//! | [`coordinator`] | Build, swap and query orchestration |
//! | [`storage`] | On-disk generation layout |
//! | [`commands`] | CLI command implementations |
//!
//! Chunking, similarity, keyword scoring and the shared types live in
//! [`docrecall_core`].

pub mod backends;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod embedding;
pub mod storage;

pub use coordinator::{BuildReport, IndexPhase, IndexStatus, RetrievalCoordinator, StepStatus};
pub use docrecall_core::{Result, RetrievalError};
