//! Exhaustive cosine-similarity ranking.
//!
//! Scores every candidate against the query vector and keeps the `top_k`
//! best. There is no index: the cost is linear in the number of stored
//! chunks, which is the retrieval model this tool commits to.
//!
//! # Ordering
//!
//! 1. Score descending.
//! 2. Candidate id ascending (ties).
//!
//! The ordering is total, so ranking is reproducible across runs.
//!
//! # Example
//!
//! ```rust
//! use passage_core::rank::{rank, Candidate};
//!
//! let candidates = vec![
//!     Candidate { id: 1, vector: vec![0.0, 1.0], metadata: "north" },
//!     Candidate { id: 2, vector: vec![1.0, 0.0], metadata: "east" },
//! ];
//! let ranked = rank(&[1.0, 0.1], candidates, 1).unwrap();
//! assert_eq!(ranked[0].metadata, "east");
//! assert_eq!(ranked[0].rank, 1);
//! ```

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{Error, Result};

/// Score given to zero-norm vectors: they cannot be compared, so they
/// rank as least relevant.
pub const MIN_SCORE: f64 = -1.0;

/// A stored vector to score, with whatever the caller wants back.
#[derive(Debug, Clone)]
pub struct Candidate<M> {
    pub id: i64,
    pub vector: Vec<f32>,
    pub metadata: M,
}

/// A scored candidate in result order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<M> {
    /// 1-based position in the result list.
    pub rank: usize,
    pub id: i64,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f64,
    #[serde(flatten)]
    pub metadata: M,
}

/// Cosine similarity between two vectors of equal length.
///
/// Accumulates in `f64` and clamps to `[-1.0, 1.0]`. Returns
/// [`MIN_SCORE`] when either vector has zero norm.
///
/// # Errors
///
/// [`Error::DataIntegrity`] when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DataIntegrity {
            context: "cosine similarity".to_string(),
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(cosine_with_norm(a, norm(a), b))
}

/// Rank `candidates` against `query` and return the best `top_k`.
///
/// A `top_k` larger than the candidate count returns every candidate,
/// ranked. No candidates is a valid, empty result.
///
/// # Errors
///
/// - [`Error::Configuration`] when `top_k` is 0.
/// - [`Error::DataIntegrity`] when any candidate's dimension differs
///   from the query's. Checked for all candidates before scoring.
pub fn rank<M>(
    query: &[f32],
    candidates: Vec<Candidate<M>>,
    top_k: usize,
) -> Result<Vec<Ranked<M>>> {
    if top_k == 0 {
        return Err(Error::Configuration("top_k must be >= 1".to_string()));
    }

    if let Some(bad) = candidates.iter().find(|c| c.vector.len() != query.len()) {
        return Err(Error::DataIntegrity {
            context: format!("stored chunk {}", bad.id),
            expected: query.len(),
            found: bad.vector.len(),
        });
    }

    let query_norm = norm(query);
    let mut scored: Vec<(f64, Candidate<M>)> = candidates
        .into_iter()
        .map(|c| (cosine_with_norm(query, query_norm, &c.vector), c))
        .collect();

    let by_rank = |a: &(f64, Candidate<M>), b: &(f64, Candidate<M>)| -> Ordering {
        b.0.total_cmp(&a.0).then(a.1.id.cmp(&b.1.id))
    };

    if top_k < scored.len() {
        scored.select_nth_unstable_by(top_k - 1, by_rank);
        scored.truncate(top_k);
    }
    scored.sort_by(by_rank);

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, c))| Ranked {
            rank: i + 1,
            id: c.id,
            score,
            metadata: c.metadata,
        })
        .collect())
}

fn norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

fn cosine_with_norm(a: &[f32], norm_a: f64, b: &[f32]) -> f64 {
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return MIN_SCORE;
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    let score = dot / (norm_a * norm_b);
    if score.is_nan() {
        return MIN_SCORE;
    }
    // `+ 0.0` folds -0.0 into 0.0; `total_cmp` would otherwise order them.
    score.clamp(-1.0, 1.0) + 0.0
}
