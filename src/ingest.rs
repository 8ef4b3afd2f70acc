//! `passage index`: index one document.
//!
//! Resolves the split strategy from `[chunking]` plus command-line
//! overrides, then either previews the chunking (`--dry-run`, no embedding
//! service needed) or runs the full indexing pipeline against SQLite.

use anyhow::{bail, Context, Result};
use std::path::Path;

use passage_core::chunk::{chunk_text, ChunkParams, Strategy};
use passage_core::pipeline::{index_document, DocumentReader, IndexRequest};
use passage_core::store::WriteMode;
use passage_core::Error;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::extract::{DocumentKind, FileReader};
use crate::progress::ProgressMode;
use crate::sqlite_store::SqliteStore;

/// Command-line options for `passage index`. `None` falls back to `[chunking]`.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub strategy: Option<String>,
    pub chunk_size: Option<usize>,
    pub overlap: Option<usize>,
    pub sentences_per_chunk: Option<usize>,
    pub append: bool,
    pub dry_run: bool,
    pub progress: ProgressMode,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            strategy: None,
            chunk_size: None,
            overlap: None,
            sentences_per_chunk: None,
            append: false,
            dry_run: false,
            progress: ProgressMode::Off,
        }
    }
}

/// Merge `[chunking]` with the command-line overrides and validate.
pub fn resolve_strategy(config: &Config, opts: &IndexOptions) -> Result<Strategy> {
    let name = opts
        .strategy
        .as_deref()
        .unwrap_or(config.chunking.strategy.as_str());
    let params = ChunkParams {
        chunk_size: opts.chunk_size.unwrap_or(config.chunking.chunk_size),
        overlap: opts.overlap.unwrap_or(config.chunking.overlap),
        sentences_per_chunk: opts
            .sentences_per_chunk
            .unwrap_or(config.chunking.sentences_per_chunk),
    };
    Ok(Strategy::from_name(name, &params)?)
}

pub async fn run_index(config: &Config, path: &Path, opts: &IndexOptions) -> Result<()> {
    DocumentKind::from_path(path)?;
    let strategy = resolve_strategy(config, opts)?;

    if opts.dry_run {
        return dry_run(path, &strategy);
    }

    if !config.embedding.is_enabled() {
        bail!(
            "Embedding provider is disabled; set [embedding].provider in the config \
             or use --dry-run to preview chunking"
        );
    }

    let embedder = create_embedder(&config.embedding)?;
    let store = SqliteStore::open(config).await?;
    let observer = opts.progress.observer();
    let mode = if opts.append {
        WriteMode::Append
    } else {
        WriteMode::Replace
    };

    let request = IndexRequest {
        path,
        strategy,
        mode,
    };
    let result = index_document(
        &FileReader,
        embedder.as_ref(),
        &store,
        &request,
        observer.as_ref(),
    )
    .await;
    store.close().await;
    let report = result.with_context(|| format!("Failed to index {}", path.display()))?;

    println!("index {}", report.filename);
    println!("  strategy: {}", report.strategy);
    println!("  characters: {}", report.characters);
    println!("  chunks written: {}", report.chunks);
    println!("  dimensions: {}", report.dims);
    println!(
        "  mode: {}",
        match mode {
            WriteMode::Append => "append",
            WriteMode::Replace => "replace",
        }
    );
    println!("ok");

    Ok(())
}

fn dry_run(path: &Path, strategy: &Strategy) -> Result<()> {
    let text = FileReader.read_text(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    if text.trim().is_empty() {
        return Err(Error::EmptyDocument(filename).into());
    }
    let chunks = chunk_text(&text, strategy)?;
    let longest = chunks
        .iter()
        .map(|c| c.text.chars().count())
        .max()
        .unwrap_or(0);

    println!("index {} (dry-run)", filename);
    println!("  strategy: {}", strategy);
    println!("  characters: {}", text.chars().count());
    println!("  chunks: {}", chunks.len());
    println!("  longest chunk: {} characters", longest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_strategy_used_without_overrides() {
        let config = Config::default();
        let strategy = resolve_strategy(&config, &IndexOptions::default()).unwrap();
        assert_eq!(
            strategy,
            Strategy::FixedSize {
                chunk_size: 1000,
                overlap: 200
            }
        );
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::default();
        let opts = IndexOptions {
            strategy: Some("sentence".to_string()),
            sentences_per_chunk: Some(2),
            ..Default::default()
        };
        assert_eq!(
            resolve_strategy(&config, &opts).unwrap(),
            Strategy::Sentence {
                sentences_per_chunk: 2
            }
        );

        let opts = IndexOptions {
            chunk_size: Some(50),
            overlap: Some(10),
            ..Default::default()
        };
        assert_eq!(
            resolve_strategy(&config, &opts).unwrap(),
            Strategy::FixedSize {
                chunk_size: 50,
                overlap: 10
            }
        );
    }

    #[test]
    fn test_invalid_override_rejected() {
        let config = Config::default();
        let opts = IndexOptions {
            chunk_size: Some(100),
            overlap: Some(150),
            ..Default::default()
        };
        assert!(resolve_strategy(&config, &opts).is_err());

        let opts = IndexOptions {
            strategy: Some("words".to_string()),
            ..Default::default()
        };
        assert!(resolve_strategy(&config, &opts).is_err());
    }
}
