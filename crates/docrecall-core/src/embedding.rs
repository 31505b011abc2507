//! Embedding provider trait.
//!
//! Defines the [`EmbeddingProvider`] capability that turns text into
//! fixed-dimension vectors. Concrete providers (remote API, unconfigured)
//! live in the `docrecall` app crate.

use async_trait::async_trait;

use crate::error::{Result, RetrievalError};

/// Trait for embedding providers.
///
/// `embed_batch` returns exactly one vector per input, in input order.
/// Providers that cannot embed at all report `is_available() == false` and
/// fail every call with [`RetrievalError::ProviderUnavailable`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the expected vector dimensionality, or `None` when the
    /// provider learns it from the first response.
    fn dims(&self) -> Option<usize>;

    /// Cheap check: false means every embed call will fail with
    /// [`RetrievalError::ProviderUnavailable`].
    fn is_available(&self) -> bool {
        true
    }

    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::ProviderCallFailed("empty embedding response".into()))
    }
}

/// Check that every vector in a batch shares one dimension.
///
/// Returns that dimension (0 for an empty batch), or
/// [`RetrievalError::DimensionMismatch`] naming the first offender.
pub fn uniform_dimension(vectors: &[Vec<f32>]) -> Result<usize> {
    let Some(first) = vectors.first() else {
        return Ok(0);
    };
    let dim = first.len();
    match vectors.iter().find(|v| v.len() != dim) {
        Some(bad) => Err(RetrievalError::DimensionMismatch {
            expected: dim,
            actual: bad.len(),
        }),
        None => Ok(dim),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> Option<usize> {
            Some(2)
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_embed_delegates_to_batch() {
        let v = Fixed.embed("abc").await.unwrap();
        assert_eq!(v, vec![3.0, 1.0]);
    }

    #[test]
    fn test_uniform_dimension() {
        assert_eq!(uniform_dimension(&[]).unwrap(), 0);
        assert_eq!(uniform_dimension(&[vec![1.0; 3], vec![2.0; 3]]).unwrap(), 3);
        let err = uniform_dimension(&[vec![1.0; 3], vec![2.0; 4]]).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
        ));
    }
}
