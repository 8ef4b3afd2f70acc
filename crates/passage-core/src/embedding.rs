//! Embedding port and vector encoding helpers.
//!
//! [`Embedder`] is the contract the pipelines depend on. Concrete
//! providers (Gemini, OpenAI, Ollama) live in the `passage` app crate,
//! together with their retry and throttling policy.

use async_trait::async_trait;

use crate::error::Result;

/// What a text is being embedded for.
///
/// Some services produce different vectors for documents and for the
/// queries that search them; providers without that distinction ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPurpose {
    Document,
    Query,
}

/// An external embedding service.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-004"`).
    fn model_name(&self) -> &str;

    /// Returns the dimensionality every vector from this embedder must have.
    fn dims(&self) -> usize;

    /// Embed one text.
    ///
    /// Fails with [`Error::EmbeddingService`](crate::Error::EmbeddingService)
    /// on quota, auth, or network failure.
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>>;
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// # Example
///
/// ```rust
/// use passage_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
/// assert_eq!(blob_to_vec(&blob), Some(v));
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
///
/// Returns `None` when the length is not a multiple of 4, which means
/// the stored bytes are not an encoded vector.
pub fn blob_to_vec(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
