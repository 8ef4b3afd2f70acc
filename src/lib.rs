//! # Passage
//!
//! Index PDF and Word documents as embedded chunks in SQLite and find the
//! chunks most similar to a natural-language query.
//!
//! The pure pieces (chunking, ranking, pipelines, and the ports they run
//! against) live in the `passage-core` crate. This crate supplies the
//! adapters and the `passage` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │  Extract    │──▶│  Pipeline    │──▶│  SQLite  │
//! │  PDF/DOCX   │   │ Chunk+Embed  │   │  BLOBs   │
//! └─────────────┘   └──────┬───────┘   └────┬─────┘
//!                          │                │
//!                          ▼                ▼
//!                   ┌────────────┐    ┌──────────┐
//!                   │ Embedding  │    │  Ranker  │
//!                   │  service   │    │ (cosine) │
//!                   └────────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! passage init
//! passage index report.pdf --strategy sentence
//! passage search "quarterly revenue" --top-k 3
//! passage stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF/DOCX text extraction |
//! | [`embedding`] | Embedding service adapters |
//! | [`sqlite_store`] | SQLite chunk store |
//! | [`ingest`] | `passage index` |
//! | [`search`] | `passage search` |
//! | [`stats`] | `passage stats` / `passage clear` |
//! | [`progress`] | Indexing progress on stderr |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema |

pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod migrate;
pub mod progress;
pub mod search;
pub mod sqlite_store;
pub mod stats;
