//! # Passage Core
//!
//! Pure logic for passage: data models, the three chunking strategies,
//! the cosine-similarity ranker, the error taxonomy, and the ports
//! (traits) that stand in for text extraction, the embedding service,
//! and durable storage.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. The
//! index and search pipelines in [`pipeline`] are written against the
//! ports, so the whole flow can be exercised with [`store::memory`] and
//! a stub [`embedding::Embedder`].

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rank;
pub mod store;

pub use error::{Error, Result};
