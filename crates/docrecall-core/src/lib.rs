//! # docrecall core
//!
//! I/O-free retrieval logic shared by the `docrecall` app: data models,
//! sliding-window chunking, similarity scoring, keyword fallback scoring,
//! result ranking, request schemas, and the [`embedding::EmbeddingProvider`]
//! and [`index::VectorIndex`] traits that concrete backends implement.
//!
//! This crate performs no filesystem or network I/O. Everything that touches
//! disk or the network lives in the `docrecall` crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod keyword;
pub mod models;
pub mod request;
pub mod similarity;

pub use error::{Result, RetrievalError};
