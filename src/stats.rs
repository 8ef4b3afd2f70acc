//! Database statistics and clearing.
//!
//! `passage stats` gives a quick summary of what's indexed: record count,
//! embedding dimension, and a per-file breakdown. `passage clear` deletes
//! every record.

use anyhow::Result;

use passage_core::store::ChunkStore;

use crate::config::Config;
use crate::progress::format_number;
use crate::sqlite_store::SqliteStore;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;

    let total = store.count().await?;
    let dims = store.embedding_dims().await;
    let files = store.file_stats().await?;
    store.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Passage — Database Stats");
    println!("========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Chunks:      {}", format_number(total));
    match dims {
        Ok(Some(d)) => println!("  Dimensions:  {}", d),
        Ok(None) => println!("  Dimensions:  -"),
        Err(e) => println!("  Dimensions:  {}", e),
    }

    if !files.is_empty() {
        println!();
        println!("  By file:");
        println!(
            "  {:<32} {:<12} {:>8} {:>6}   {}",
            "FILE", "STRATEGY", "CHUNKS", "DIMS", "INDEXED"
        );
        println!("  {}", "-".repeat(80));

        for f in &files {
            println!(
                "  {:<32} {:<12} {:>8} {:>6}   {}",
                f.filename,
                f.split_strategy,
                f.chunks,
                f.dims,
                f.indexed_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    println!();
    Ok(())
}

/// Delete every stored chunk.
pub async fn run_clear(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let removed = store.clear().await?;
    store.close().await;

    println!("Deleted {} chunks.", format_number(removed));
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
