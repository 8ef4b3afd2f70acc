//! Text chunker with three splitting strategies.
//!
//! Splits extracted document text into an ordered sequence of [`Chunk`]s.
//! The chunker is pure and deterministic: the same text and [`Strategy`]
//! always produce the same chunks.
//!
//! # Strategies
//!
//! | Name | Parameters | Boundary |
//! |------|------------|----------|
//! | `fixed_size` | `chunk_size`, `overlap` | every `chunk_size - overlap` characters |
//! | `sentence` | `sentences_per_chunk` | sentence terminators (`.`, `!`, `?`) |
//! | `paragraph` | none | one or more blank lines |
//!
//! Sizes and offsets count characters, not bytes, so multi-byte text is
//! never split inside a code point.
//!
//! Empty or whitespace-only text produces no chunks. Invalid parameters
//! fail with [`Error::Configuration`] before any splitting happens.
//!
//! # Example
//!
//! ```rust
//! use passage_core::chunk::{chunk_text, Strategy};
//!
//! let strategy = Strategy::fixed_size(10, 0).unwrap();
//! let chunks = chunk_text("abcdefghijklmnopqrstuvwxy", &strategy).unwrap();
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[2].text, "uvwxy");
//! ```

use std::fmt;

use crate::error::{Error, Result};
use crate::models::Chunk;

/// Names accepted by [`Strategy::from_name`].
pub const STRATEGY_NAMES: &[&str] = &["fixed_size", "sentence", "paragraph"];

/// Closing punctuation that may follow a sentence terminator.
const CLOSERS: &[char] = &['"', '\'', '\u{201D}', '\u{2019}', ')', ']', '}'];

/// How a document is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Windows of `chunk_size` characters, consecutive windows sharing
    /// `overlap` characters.
    FixedSize { chunk_size: usize, overlap: usize },
    /// Groups of `sentences_per_chunk` consecutive sentences.
    Sentence { sentences_per_chunk: usize },
    /// One chunk per paragraph.
    Paragraph,
}

/// Raw strategy parameters, as they arrive from config or the CLI.
///
/// Only the fields relevant to the chosen strategy are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub overlap: usize,
    pub sentences_per_chunk: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            sentences_per_chunk: 5,
        }
    }
}

impl Strategy {
    pub fn fixed_size(chunk_size: usize, overlap: usize) -> Result<Self> {
        let strategy = Strategy::FixedSize {
            chunk_size,
            overlap,
        };
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn sentence(sentences_per_chunk: usize) -> Result<Self> {
        let strategy = Strategy::Sentence {
            sentences_per_chunk,
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Build a validated strategy from its name and raw parameters.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for an unknown name or an invalid
    /// parameter combination.
    pub fn from_name(name: &str, params: &ChunkParams) -> Result<Self> {
        match name {
            "fixed_size" => Self::fixed_size(params.chunk_size, params.overlap),
            "sentence" => Self::sentence(params.sentences_per_chunk),
            "paragraph" => Ok(Strategy::Paragraph),
            other => Err(Error::Configuration(format!(
                "unknown split strategy: '{}'. Use {}.",
                other,
                STRATEGY_NAMES.join(", ")
            ))),
        }
    }

    /// The strategy name stored alongside every chunk record.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FixedSize { .. } => "fixed_size",
            Strategy::Sentence { .. } => "sentence",
            Strategy::Paragraph => "paragraph",
        }
    }

    /// Check the parameter constraints.
    ///
    /// The variants have public fields, so [`chunk_text`] re-validates
    /// rather than trusting the constructors were used.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Strategy::FixedSize {
                chunk_size,
                overlap,
            } => {
                if chunk_size == 0 {
                    return Err(Error::Configuration(
                        "chunk_size must be > 0".to_string(),
                    ));
                }
                if overlap >= chunk_size {
                    return Err(Error::Configuration(format!(
                        "overlap ({}) must be smaller than chunk_size ({})",
                        overlap, chunk_size
                    )));
                }
                Ok(())
            }
            Strategy::Sentence {
                sentences_per_chunk: 0,
            } => Err(Error::Configuration(
                "sentences_per_chunk must be > 0".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split `text` into chunks according to `strategy`.
///
/// # Guarantees
///
/// - Empty or whitespace-only text yields an empty vector.
/// - Every chunk's text is non-empty.
/// - `sequence_index` values are contiguous: `0, 1, 2, …, N-1`.
pub fn chunk_text(text: &str, strategy: &Strategy) -> Result<Vec<Chunk>> {
    strategy.validate()?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let pieces = match *strategy {
        Strategy::FixedSize {
            chunk_size,
            overlap,
        } => split_fixed(text, chunk_size, overlap),
        Strategy::Sentence {
            sentences_per_chunk,
        } => split_sentences(text, sentences_per_chunk),
        Strategy::Paragraph => split_paragraphs(text),
    };

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| Chunk {
            sequence_index: i,
            text: piece.to_string(),
        })
        .collect())
}

/// Character windows of `chunk_size`, advancing by `chunk_size - overlap`.
///
/// Stops once a window reaches the end of the text, so text no longer
/// than `chunk_size` is a single chunk.
fn split_fixed(text: &str, chunk_size: usize, overlap: usize) -> Vec<&str> {
    // Byte offset of every char, plus the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;
    let stride = chunk_size - overlap;

    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        pieces.push(&text[bounds[start]..bounds[end]]);
        if end >= char_count {
            break;
        }
        start += stride;
    }
    pieces
}

/// Group sentences `per_chunk` at a time. Each chunk is the source slice
/// covering its sentences, trimmed at the edges.
fn split_sentences(text: &str, per_chunk: usize) -> Vec<&str> {
    let spans = sentence_spans(text);
    spans
        .chunks(per_chunk)
        .filter_map(|group| {
            let start = group[0].0;
            let end = group[group.len() - 1].1;
            let piece = text[start..end].trim();
            (!piece.is_empty()).then_some(piece)
        })
        .collect()
}

/// Byte ranges of the sentences in `text`.
///
/// Ranges are contiguous (each starts where the previous ended) so that
/// inter-sentence whitespace survives grouping. A sentence ends after a
/// run of terminators plus any closing quotes/brackets, when followed by
/// whitespace or end of text. A run of periods followed by a lowercase
/// word is treated as an abbreviation and does not end the sentence.
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminal(chars[i].1) {
            i += 1;
            continue;
        }

        let mut j = i;
        let mut only_periods = true;
        while j < chars.len() && is_terminal(chars[j].1) {
            if chars[j].1 != '.' {
                only_periods = false;
            }
            j += 1;
        }
        while j < chars.len() && CLOSERS.contains(&chars[j].1) {
            j += 1;
        }

        let at_end = j == chars.len();
        let boundary = at_end
            || (chars[j].1.is_whitespace()
                && !(only_periods && next_word_is_lowercase(&chars[j..])));

        if boundary {
            let end = if at_end { text.len() } else { chars[j].0 };
            spans.push((start, end));
            start = end;
        }
        i = j;
    }

    if !text[start..].trim().is_empty() {
        spans.push((start, text.len()));
    }
    spans
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn next_word_is_lowercase(rest: &[(usize, char)]) -> bool {
    rest.iter()
        .map(|&(_, c)| c)
        .find(|c| !c.is_whitespace())
        .is_some_and(char::is_lowercase)
}

/// Split on blank lines. A blank line is one containing only whitespace;
/// any run of them is a single boundary.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut para_start: Option<usize> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(start) = para_start.take() {
                pieces.push(text[start..offset].trim());
            }
        } else if para_start.is_none() {
            para_start = Some(offset);
        }
        offset += line.len();
    }
    if let Some(start) = para_start {
        pieces.push(text[start..].trim());
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_fixed_size_no_overlap() {
        let text = "abcdefghijklmnopqrstuvwxy";
        assert_eq!(text.chars().count(), 25);
        let chunks = chunk_text(text, &Strategy::fixed_size(10, 0).unwrap()).unwrap();
        let lens: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
        assert_eq!(lens, vec![10, 10, 5]);
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_fixed_size_overlap_shares_characters() {
        let text: String = ('a'..='z').chain('A'..='Z').collect();
        let chunks = chunk_text(&text, &Strategy::fixed_size(10, 3).unwrap()).unwrap();
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            assert_eq!(&prev[prev.len() - 3..], &next[..3]);
        }
        // stride of 7
        let starts: Vec<char> = chunks
            .iter()
            .map(|c| c.text.chars().next().unwrap())
            .collect();
        assert_eq!(&starts[..3], &['a', 'h', 'o']);
    }

    #[test]
    fn test_fixed_size_short_text_single_chunk() {
        let chunks = chunk_text("exactly10!", &Strategy::fixed_size(10, 3).unwrap()).unwrap();
        assert_eq!(texts(&chunks), vec!["exactly10!"]);
        let chunks = chunk_text("short", &Strategy::fixed_size(10, 3).unwrap()).unwrap();
        assert_eq!(texts(&chunks), vec!["short"]);
    }

    #[test]
    fn test_fixed_size_counts_chars_not_bytes() {
        let text = "héllo wörld ñandú";
        let chunks = chunk_text(text, &Strategy::fixed_size(4, 1).unwrap()).unwrap();
        for c in &chunks {
            assert!(c.text.chars().count() <= 4);
        }
        assert_eq!(chunks[0].text, "héll");
        assert_eq!(chunks[1].text, "lo w");
    }

    #[test]
    fn test_overlap_not_smaller_than_chunk_size_fails() {
        for chunk_size in 1..20 {
            for overlap in chunk_size..chunk_size + 3 {
                let err = Strategy::fixed_size(chunk_size, overlap).unwrap_err();
                assert!(matches!(err, Error::Configuration(_)));
            }
        }
    }

    #[test]
    fn test_zero_sizes_fail() {
        assert!(matches!(
            Strategy::fixed_size(0, 0),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Strategy::sentence(0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_hand_built_invalid_strategy_rejected() {
        let strategy = Strategy::FixedSize {
            chunk_size: 5,
            overlap: 5,
        };
        assert!(matches!(
            chunk_text("some text", &strategy),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_from_name() {
        let params = ChunkParams::default();
        assert_eq!(
            Strategy::from_name("fixed_size", &params).unwrap(),
            Strategy::FixedSize {
                chunk_size: 1000,
                overlap: 200
            }
        );
        assert_eq!(
            Strategy::from_name("sentence", &params).unwrap(),
            Strategy::Sentence {
                sentences_per_chunk: 5
            }
        );
        assert_eq!(
            Strategy::from_name("paragraph", &params).unwrap(),
            Strategy::Paragraph
        );
        let err = Strategy::from_name("semantic", &params).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("semantic")));
    }

    #[test]
    fn test_name_roundtrip() {
        let params = ChunkParams::default();
        for name in STRATEGY_NAMES {
            let strategy = Strategy::from_name(name, &params).unwrap();
            assert_eq!(strategy.name(), *name);
            assert_eq!(strategy.to_string(), *name);
        }
    }

    #[test]
    fn test_paragraph_blank_runs_collapse() {
        let chunks = chunk_text("A\n\nB\n\n\nC", &Strategy::Paragraph).unwrap();
        assert_eq!(texts(&chunks), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_paragraph_whitespace_only_lines_are_blank() {
        let text = "First line\nstill first.\n  \t\n\nSecond.\r\n\r\nThird.\n";
        let chunks = chunk_text(text, &Strategy::Paragraph).unwrap();
        assert_eq!(
            texts(&chunks),
            vec!["First line\nstill first.", "Second.", "Third."]
        );
    }

    #[test]
    fn test_sentence_grouping() {
        let strategy = Strategy::sentence(2).unwrap();
        let chunks = chunk_text("One. Two. Three.", &strategy).unwrap();
        assert_eq!(texts(&chunks), vec!["One. Two.", "Three."]);
    }

    #[test]
    fn test_sentence_preserves_inner_whitespace() {
        let strategy = Strategy::sentence(2).unwrap();
        let chunks = chunk_text("Hi there!  How are you?\nFine.", &strategy).unwrap();
        assert_eq!(texts(&chunks), vec!["Hi there!  How are you?", "Fine."]);
    }

    #[test]
    fn test_sentence_closing_quotes_and_trailing_text() {
        let strategy = Strategy::sentence(1).unwrap();
        let chunks = chunk_text("He said \"Stop!\" Then he left. No period", &strategy).unwrap();
        assert_eq!(
            texts(&chunks),
            vec!["He said \"Stop!\"", "Then he left.", "No period"]
        );
    }

    // Approximate: the abbreviation heuristic only looks at the case of
    // the following word, so "Dr. Smith" still splits.
    #[test]
    fn test_sentence_abbreviation_heuristic() {
        let strategy = Strategy::sentence(1).unwrap();
        let chunks = chunk_text("See e.g. the docs. Version 3.14 is out.", &strategy).unwrap();
        assert_eq!(
            texts(&chunks),
            vec!["See e.g. the docs.", "Version 3.14 is out."]
        );
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let strategies = [
            Strategy::fixed_size(10, 2).unwrap(),
            Strategy::sentence(3).unwrap(),
            Strategy::Paragraph,
        ];
        for strategy in &strategies {
            assert!(chunk_text("", strategy).unwrap().is_empty());
            assert!(chunk_text("  \n\t \n", strategy).unwrap().is_empty());
        }
    }

    #[test]
    fn test_indices_contiguous_and_deterministic() {
        let text = (0..40)
            .map(|i| format!("Sentence number {}.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let strategy = Strategy::sentence(3).unwrap();
        let c1 = chunk_text(&text, &strategy).unwrap();
        let c2 = chunk_text(&text, &strategy).unwrap();
        assert_eq!(c1, c2);
        assert_eq!(c1.len(), 14);
        for (i, c) in c1.iter().enumerate() {
            assert_eq!(c.sequence_index, i);
            assert!(!c.text.is_empty());
        }
    }
}
