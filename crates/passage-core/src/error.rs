use thiserror::Error;

/// Every failure the core can report.
///
/// Nothing in the core retries: chunking and ranking are deterministic,
/// and retry policy for the embedding service lives in its adapter.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid strategy name or parameter combination. Raised before any work.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Extraction succeeded but produced no text.
    #[error("document has no extractable text: {0}")]
    EmptyDocument(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// Embedding dimensions disagree. Indicates corrupted storage or a
    /// change of embedding model; never skipped.
    #[error("data integrity error: {context}: expected {expected} dimensions, found {found}")]
    DataIntegrity {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
