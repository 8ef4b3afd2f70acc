//! Storage port for chunk records.
//!
//! The [`ChunkStore`] trait covers everything the pipelines need from
//! durable storage. Implementations: `SqliteStore` in the app crate and
//! [`memory::InMemoryStore`] here.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChunkRecord, NewChunkRecord};

/// What happens to existing records when a document is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep existing records.
    Append,
    /// Delete every existing record (and restart ids) first.
    Replace,
}

/// Abstract storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_chunks`](ChunkStore::insert_chunks) | Persist one document's records |
/// | [`fetch_all`](ChunkStore::fetch_all) | Every record, in id order |
/// | [`embedding_dims`](ChunkStore::embedding_dims) | Dimension already stored |
/// | [`count`](ChunkStore::count) | Number of records |
/// | [`clear`](ChunkStore::clear) | Delete everything |
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Persist `records` in order, all or nothing. Returns the assigned ids.
    async fn insert_chunks(&self, records: &[NewChunkRecord], mode: WriteMode) -> Result<Vec<i64>>;

    /// Every stored record, ordered by ascending id.
    async fn fetch_all(&self) -> Result<Vec<ChunkRecord>>;

    /// The embedding dimension of the stored records, or `None` when empty.
    ///
    /// Fails with [`Error::DataIntegrity`](crate::Error::DataIntegrity)
    /// if the store already holds mixed dimensions.
    async fn embedding_dims(&self) -> Result<Option<usize>>;

    async fn count(&self) -> Result<u64>;

    /// Delete every record and restart id assignment. Returns how many
    /// records were removed.
    async fn clear(&self) -> Result<u64>;
}
