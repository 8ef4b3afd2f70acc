//! Schema for the chunk table.
//!
//! Every statement is idempotent, so `passage init` can be run any number
//! of times and [`SqliteStore::open`](crate::sqlite_store::SqliteStore::open)
//! applies the schema on every start.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the `document_chunks` table and its index if missing.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_chunks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chunk_text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            dims INTEGER NOT NULL,
            filename TEXT NOT NULL,
            split_strategy TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_document_chunks_filename ON document_chunks(filename)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Connect, apply the schema, and close. Backs `passage init`.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}
