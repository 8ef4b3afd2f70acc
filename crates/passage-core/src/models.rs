//! Data types that flow through the index and search pipelines.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rank::{Candidate, Ranked};

/// A bounded span of a document's text, produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position among the chunks of the same document, starting at 0.
    pub sequence_index: usize,
    pub text: String,
}

/// Insert payload for a chunk. Storage assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewChunkRecord {
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub filename: String,
    pub split_strategy: String,
}

/// A persisted chunk with its embedding.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: i64,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub filename: String,
    pub split_strategy: String,
    pub created_at: DateTime<Utc>,
}

/// Everything about a record except its vector; carried through ranking
/// so results can be displayed without another storage round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMetadata {
    pub chunk_text: String,
    pub filename: String,
    pub split_strategy: String,
    pub created_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Split the record into a ranker candidate.
    pub fn into_candidate(self) -> Candidate<ChunkMetadata> {
        Candidate {
            id: self.id,
            vector: self.embedding,
            metadata: ChunkMetadata {
                chunk_text: self.chunk_text,
                filename: self.filename,
                split_strategy: self.split_strategy,
                created_at: self.created_at,
            },
        }
    }
}

/// One ranked hit from the search pipeline.
pub type SearchResult = Ranked<ChunkMetadata>;
