//! Index backends bound to a single generation directory.
//!
//! | Backend | Artifact | Needs embeddings |
//! |---------|----------|------------------|
//! | [`FlatIndexBackend`] | `embeddings.index` + `embeddings_meta.json` | yes |
//! | [`RemoteStoreBackend`] | managed store, filtered by generation | yes |
//! | [`LinearScanFallback`] | `embeddings.json` | yes |
//! | [`KeywordFallback`] | `chunks.json` | no |

pub mod flat;
pub mod keyword;
pub mod linear;
pub mod remote;

pub use flat::FlatIndexBackend;
pub use keyword::KeywordFallback;
pub use linear::LinearScanFallback;
pub use remote::RemoteStoreBackend;
