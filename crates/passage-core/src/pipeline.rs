//! Index and search pipelines.
//!
//! Thin orchestration over the ports. Both pipelines run strictly
//! sequentially: one document at a time, one chunk embedding in flight,
//! chunks handled in sequence order.
//!
//! # Indexing
//!
//! 1. Extract text through a [`DocumentReader`].
//! 2. Reject empty text ([`Error::EmptyDocument`]).
//! 3. Chunk with the requested [`Strategy`].
//! 4. Embed every chunk; the first failure aborts the document.
//! 5. Check every vector's dimension against the embedder and the store.
//! 6. Persist all records in one [`ChunkStore::insert_chunks`] call.
//!
//! Nothing is written until step 6, so a failed document leaves storage
//! exactly as it was.
//!
//! # Searching
//!
//! Embed the query, fetch every stored record, and hand them to
//! [`rank`](crate::rank::rank).

use std::path::Path;

use serde::Serialize;

use crate::chunk::{chunk_text, Strategy};
use crate::embedding::{EmbedPurpose, Embedder};
use crate::error::{Error, Result};
use crate::models::{ChunkRecord, NewChunkRecord, SearchResult};
use crate::rank::rank;
use crate::store::{ChunkStore, WriteMode};

/// Text extraction port: file path in, plain text out.
pub trait DocumentReader: Send + Sync {
    /// Fails with [`Error::Extraction`] on unreadable or unsupported files.
    fn read_text(&self, path: &Path) -> Result<String>;
}

/// Inputs for indexing one document.
#[derive(Debug, Clone)]
pub struct IndexRequest<'a> {
    pub path: &'a Path,
    pub strategy: Strategy,
    pub mode: WriteMode,
}

/// Summary of an indexed document.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub filename: String,
    pub strategy: String,
    /// Characters of extracted text.
    pub characters: usize,
    pub chunks: usize,
    pub dims: usize,
    pub record_ids: Vec<i64>,
}

/// Progress notifications emitted while indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent<'a> {
    Extracted { filename: &'a str, characters: usize },
    Chunked { chunks: usize },
    Embedded { n: usize, total: usize },
    Persisted { records: usize },
}

/// Receives [`IndexEvent`]s. The CLI renders them on stderr.
pub trait IndexObserver: Send + Sync {
    fn on_event(&self, event: IndexEvent<'_>);
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl IndexObserver for NoopObserver {
    fn on_event(&self, _event: IndexEvent<'_>) {}
}

/// Index one document: extract, chunk, embed, persist.
///
/// # Errors
///
/// - [`Error::Configuration`] for an invalid strategy (before extraction).
/// - [`Error::Extraction`] / [`Error::EmptyDocument`] from extraction.
/// - [`Error::EmbeddingService`] on the first failed chunk; nothing is stored.
/// - [`Error::DataIntegrity`] when a vector's dimension disagrees with the
///   embedder or, when appending, with what is already stored; nothing is
///   stored.
pub async fn index_document<R, E, S>(
    reader: &R,
    embedder: &E,
    store: &S,
    req: &IndexRequest<'_>,
    observer: &dyn IndexObserver,
) -> Result<IndexReport>
where
    R: DocumentReader + ?Sized,
    E: Embedder + ?Sized,
    S: ChunkStore + ?Sized,
{
    req.strategy.validate()?;

    let filename = file_name(req.path);
    let text = reader.read_text(req.path)?;
    if text.trim().is_empty() {
        return Err(Error::EmptyDocument(filename));
    }
    let characters = text.chars().count();
    observer.on_event(IndexEvent::Extracted {
        filename: &filename,
        characters,
    });

    let chunks = chunk_text(&text, &req.strategy)?;
    observer.on_event(IndexEvent::Chunked {
        chunks: chunks.len(),
    });
    tracing::info!(
        filename = %filename,
        strategy = %req.strategy,
        chunks = chunks.len(),
        "chunked document"
    );

    let expected = embedder.dims();
    // Replace discards the stored vectors, so only appends must agree with them.
    let stored = match req.mode {
        WriteMode::Append => store.embedding_dims().await?,
        WriteMode::Replace => None,
    };
    if let Some(stored) = stored {
        if stored != expected {
            return Err(Error::DataIntegrity {
                context: format!("embedder '{}' vs stored embeddings", embedder.model_name()),
                expected: stored,
                found: expected,
            });
        }
    }

    let total = chunks.len();
    let mut records = Vec::with_capacity(total);
    for chunk in chunks {
        let vector = embedder.embed(&chunk.text, EmbedPurpose::Document).await?;
        if vector.len() != expected {
            return Err(Error::DataIntegrity {
                context: format!("embedding for chunk {} of {}", chunk.sequence_index, filename),
                expected,
                found: vector.len(),
            });
        }
        tracing::debug!(chunk = chunk.sequence_index, total, "embedded chunk");
        observer.on_event(IndexEvent::Embedded {
            n: chunk.sequence_index + 1,
            total,
        });
        records.push(NewChunkRecord {
            chunk_text: chunk.text,
            embedding: vector,
            filename: filename.clone(),
            split_strategy: req.strategy.name().to_string(),
        });
    }

    let record_ids = store.insert_chunks(&records, req.mode).await?;
    observer.on_event(IndexEvent::Persisted {
        records: record_ids.len(),
    });
    tracing::info!(filename = %filename, records = record_ids.len(), "persisted chunks");

    Ok(IndexReport {
        filename,
        strategy: req.strategy.name().to_string(),
        characters,
        chunks: total,
        dims: expected,
        record_ids,
    })
}

/// Embed `query` and return the `top_k` most similar stored chunks.
///
/// A blank query returns no results without calling the embedder. An
/// empty store returns no results.
///
/// # Errors
///
/// - [`Error::Configuration`] when `top_k` is 0 (before embedding).
/// - [`Error::EmbeddingService`] if the query cannot be embedded.
/// - [`Error::DataIntegrity`] if any stored vector's dimension differs
///   from the query vector's.
pub async fn search<E, S>(
    embedder: &E,
    store: &S,
    query: &str,
    top_k: usize,
) -> Result<Vec<SearchResult>>
where
    E: Embedder + ?Sized,
    S: ChunkStore + ?Sized,
{
    if top_k == 0 {
        return Err(Error::Configuration("top_k must be >= 1".to_string()));
    }
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed(query, EmbedPurpose::Query).await?;
    let records = store.fetch_all().await?;
    tracing::debug!(candidates = records.len(), top_k, "ranking stored chunks");

    rank(
        &query_vec,
        records.into_iter().map(ChunkRecord::into_candidate).collect(),
        top_k,
    )
}

/// Final path component, as stored in `filename`.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
