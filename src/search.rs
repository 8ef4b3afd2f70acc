//! `passage search`: rank stored chunks against a query.
//!
//! Delegates to [`passage_core::pipeline::search`] over a [`SqliteStore`]
//! and prints the results either as a human-readable listing or as JSON.

use anyhow::{Context, Result};
use serde::Serialize;

use passage_core::models::SearchResult;
use passage_core::pipeline;
use passage_core::store::ChunkStore;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::sqlite_store::SqliteStore;

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    top_k: usize,
    results: &'a [SearchResult],
}

pub async fn run_search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let store = SqliteStore::open(config).await?;

    let results = if store.count().await? == 0 {
        tracing::info!("store is empty; skipping query embedding");
        if top_k == 0 {
            anyhow::bail!("top_k must be >= 1");
        }
        Vec::new()
    } else {
        let embedder = create_embedder(&config.embedding)?;
        let result = pipeline::search(embedder.as_ref(), &store, query, top_k).await;
        result.context("Search failed")?
    };
    store.close().await;

    if json {
        let output = SearchOutput {
            query,
            top_k,
            results: &results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_results(query, &results, config.retrieval.snippet_chars);
    Ok(())
}

fn print_results(query: &str, results: &[SearchResult], snippet_chars: usize) {
    println!("Searching: '{}'", query);
    println!("{}", "-".repeat(60));

    if results.is_empty() {
        println!("No results.");
        return;
    }

    println!();
    println!("Found {} similar chunks:", results.len());
    println!();

    for r in results {
        println!("{}", "=".repeat(60));
        println!("Result #{} (similarity: {:.4})", r.rank, r.score);
        println!("File: {}", r.metadata.filename);
        println!("Split strategy: {}", r.metadata.split_strategy);
        println!("ID: {}", r.id);
        println!();
        println!("Chunk:");
        println!("{}", snippet(&r.metadata.chunk_text, snippet_chars));
        println!();
    }
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
