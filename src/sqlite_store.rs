//! SQLite-backed [`ChunkStore`] implementation.
//!
//! One row per chunk in `document_chunks`. Embeddings are stored as
//! little-endian f32 BLOBs next to their dimension, which lets
//! [`embedding_dims`](ChunkStore::embedding_dims) answer without decoding
//! and lets [`fetch_all`](ChunkStore::fetch_all) detect truncated blobs.

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use passage_core::embedding::{blob_to_vec, vec_to_blob};
use passage_core::models::{ChunkRecord, NewChunkRecord};
use passage_core::store::{ChunkStore, WriteMode};
use passage_core::{Error, Result};

use crate::config::Config;
use crate::{db, migrate};

/// SQLite implementation of the [`ChunkStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and make sure the schema exists.
    pub async fn open(config: &Config) -> AnyResult<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn storage(e: sqlx::Error) -> Error {
    Error::Storage(e.to_string())
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn insert_chunks(&self, records: &[NewChunkRecord], mode: WriteMode) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        if mode == WriteMode::Replace {
            sqlx::query("DELETE FROM document_chunks")
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
            sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'document_chunks'")
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
        }

        let now = Utc::now().timestamp();
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO document_chunks
                    (chunk_text, embedding, dims, filename, split_strategy, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.chunk_text)
            .bind(vec_to_blob(&record.embedding))
            .bind(record.embedding.len() as i64)
            .bind(&record.filename)
            .bind(&record.split_strategy)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await.map_err(storage)?;
        Ok(ids)
    }

    async fn fetch_all(&self) -> Result<Vec<ChunkRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, chunk_text, embedding, dims, filename, split_strategy, created_at
            FROM document_chunks
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            let dims: i64 = row.get("dims");
            let blob: Vec<u8> = row.get("embedding");
            let embedding = blob_to_vec(&blob).unwrap_or_default();
            if blob.len() % 4 != 0 || embedding.len() as i64 != dims {
                return Err(Error::DataIntegrity {
                    context: format!("stored chunk {}", id),
                    expected: dims.max(0) as usize,
                    found: blob.len() / 4,
                });
            }
            records.push(ChunkRecord {
                id,
                chunk_text: row.get("chunk_text"),
                embedding,
                filename: row.get("filename"),
                split_strategy: row.get("split_strategy"),
                created_at: timestamp(row.get("created_at")),
            });
        }
        Ok(records)
    }

    async fn embedding_dims(&self) -> Result<Option<usize>> {
        let dims: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT dims FROM document_chunks ORDER BY dims LIMIT 2")
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;

        match dims.as_slice() {
            [] => Ok(None),
            [d] => Ok(Some(*d as usize)),
            [a, b, ..] => Err(Error::DataIntegrity {
                context: "stored embeddings".to_string(),
                expected: *a as usize,
                found: *b as usize,
            }),
        }
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(n as u64)
    }

    async fn clear(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let result = sqlx::query("DELETE FROM document_chunks")
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'document_chunks'")
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;
        Ok(result.rows_affected())
    }
}

/// Per-file breakdown used by `passage stats`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileStats {
    pub filename: String,
    pub split_strategy: String,
    pub chunks: i64,
    pub dims: i64,
    pub indexed_at: DateTime<Utc>,
}

impl SqliteStore {
    pub async fn file_stats(&self) -> AnyResult<Vec<FileStats>> {
        let rows = sqlx::query(
            r#"
            SELECT filename, split_strategy, COUNT(*) AS chunks, MAX(dims) AS dims,
                   MAX(created_at) AS indexed_at
            FROM document_chunks
            GROUP BY filename, split_strategy
            ORDER BY filename ASC, split_strategy ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| FileStats {
                filename: row.get("filename"),
                split_strategy: row.get("split_strategy"),
                chunks: row.get("chunks"),
                dims: row.get("dims"),
                indexed_at: timestamp(row.get("indexed_at")),
            })
            .collect())
    }
}
