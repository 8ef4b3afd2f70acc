//! # Passage CLI (`passage`)
//!
//! Index PDF and Word documents as embedded chunks, then search them by
//! meaning.
//!
//! ## Usage
//!
//! ```bash
//! passage --config ./config/passage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `passage init` | Create the SQLite database and schema |
//! | `passage index <file>` | Extract, chunk, embed, and store a document |
//! | `passage search "<query>"` | Rank stored chunks against a query |
//! | `passage stats` | Summarize what is indexed |
//! | `passage clear` | Delete every stored chunk |
//!
//! ## Examples
//!
//! ```bash
//! # Index a report split into 3-sentence chunks, keeping earlier documents
//! passage index ./docs/report.pdf --strategy sentence --sentences-per-chunk 3 --append
//!
//! # Preview chunking without calling the embedding service
//! passage index ./docs/handbook.docx --strategy paragraph --dry-run
//!
//! # Top 3 matches as JSON
//! passage search "refund policy" --top-k 3 --json
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`). API keys may be placed in a `.env` file.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use passage::config::{self, Config};
use passage::ingest::{self, IndexOptions};
use passage::progress::ProgressMode;
use passage::{migrate, search, stats};

const DEFAULT_CONFIG: &str = "./config/passage.toml";

/// Passage: semantic search over your PDF and Word documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/passage.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "passage",
    about = "Passage: index PDF and DOCX documents as embedded chunks and search them by meaning",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/passage.toml`. When that default file does not
    /// exist, built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `document_chunks` table.
    /// Running it multiple times is safe.
    Init,

    /// Index one document.
    ///
    /// Extracts the text, splits it with the chosen strategy, embeds every
    /// chunk, and stores the results. By default the store is replaced by
    /// this document's chunks; pass `--append` to keep earlier documents.
    Index {
        /// Path to a `.pdf`, `.docx`, or `.doc` file.
        file: PathBuf,

        /// Split strategy: `fixed_size`, `sentence`, or `paragraph`.
        #[arg(long)]
        strategy: Option<String>,

        /// Characters per chunk (fixed_size).
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared by consecutive chunks (fixed_size).
        #[arg(long)]
        overlap: Option<usize>,

        /// Sentences per chunk (sentence).
        #[arg(long)]
        sentences_per_chunk: Option<usize>,

        /// Keep existing chunks instead of replacing them.
        #[arg(long)]
        append: bool,

        /// Show chunk counts without embedding or writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Search indexed chunks.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        top_k: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show what is indexed.
    Stats,

    /// Delete every stored chunk.
    Clear,
}

/// Load the config named on the command line, or the default file if it
/// exists, or built-in defaults.
fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => config::load_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if default.exists() {
                config::load_config(default)
            } else {
                config::parse_config("")
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index {
            file,
            strategy,
            chunk_size,
            overlap,
            sentences_per_chunk,
            append,
            dry_run,
            progress,
        } => {
            let opts = IndexOptions {
                strategy,
                chunk_size,
                overlap,
                sentences_per_chunk,
                append,
                dry_run,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            ingest::run_index(&cfg, &file, &opts).await?;
        }
        Commands::Search { query, top_k, json } => {
            search::run_search(&cfg, &query, top_k, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Clear => {
            stats::run_clear(&cfg).await?;
        }
    }

    Ok(())
}
