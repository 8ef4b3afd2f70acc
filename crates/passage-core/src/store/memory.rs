//! In-memory [`ChunkStore`] implementation for tests and embedding the
//! core without a database.
//!
//! Records live in a `Vec` behind a `std::sync::RwLock`. Ids are assigned
//! from a counter starting at 1, mirroring an autoincrement column.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::{ChunkRecord, NewChunkRecord};

use super::{ChunkStore, WriteMode};

struct Inner {
    records: Vec<ChunkRecord>,
    next_id: i64,
}

/// In-memory store.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::Storage("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::Storage("in-memory store lock poisoned".to_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for InMemoryStore {
    async fn insert_chunks(&self, records: &[NewChunkRecord], mode: WriteMode) -> Result<Vec<i64>> {
        let mut inner = self.write()?;
        if mode == WriteMode::Replace {
            inner.records.clear();
            inner.next_id = 1;
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(records.len());
        for r in records {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.records.push(ChunkRecord {
                id,
                chunk_text: r.chunk_text.clone(),
                embedding: r.embedding.clone(),
                filename: r.filename.clone(),
                split_strategy: r.split_strategy.clone(),
                created_at: now,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn fetch_all(&self) -> Result<Vec<ChunkRecord>> {
        Ok(self.read()?.records.clone())
    }

    async fn embedding_dims(&self) -> Result<Option<usize>> {
        let inner = self.read()?;
        let mut dims = inner.records.iter().map(|r| r.embedding.len());
        let first = match dims.next() {
            Some(d) => d,
            None => return Ok(None),
        };
        if let Some(other) = dims.find(|&d| d != first) {
            return Err(Error::DataIntegrity {
                context: "stored embeddings".to_string(),
                expected: first,
                found: other,
            });
        }
        Ok(Some(first))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.records.len() as u64)
    }

    async fn clear(&self) -> Result<u64> {
        let mut inner = self.write()?;
        let removed = inner.records.len() as u64;
        inner.records.clear();
        inner.next_id = 1;
        Ok(removed)
    }
}
