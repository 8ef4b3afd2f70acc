//! Indexing progress reporting.
//!
//! Renders [`IndexEvent`]s from the indexing pipeline so users see how far
//! a long document has got. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;

use passage_core::pipeline::{IndexEvent, IndexObserver};

/// Human-friendly progress on stderr: "index report.pdf  embedding  12 / 340 chunks".
pub struct StderrProgress;

impl IndexObserver for StderrProgress {
    fn on_event(&self, event: IndexEvent<'_>) {
        let line = match event {
            IndexEvent::Extracted {
                filename,
                characters,
            } => format!(
                "index {}  extracted  {} characters\n",
                filename,
                format_number(characters as u64)
            ),
            IndexEvent::Chunked { chunks } => {
                format!("index  chunked  {} chunks\n", format_number(chunks as u64))
            }
            IndexEvent::Embedded { n, total } => format!(
                "index  embedding  {} / {} chunks\n",
                format_number(n as u64),
                format_number(total as u64)
            ),
            IndexEvent::Persisted { records } => {
                format!("index  saved  {} records\n", format_number(records as u64))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IndexObserver for JsonProgress {
    fn on_event(&self, event: IndexEvent<'_>) {
        let obj = match event {
            IndexEvent::Extracted {
                filename,
                characters,
            } => serde_json::json!({
                "event": "progress",
                "phase": "extracted",
                "filename": filename,
                "characters": characters
            }),
            IndexEvent::Chunked { chunks } => serde_json::json!({
                "event": "progress",
                "phase": "chunked",
                "chunks": chunks
            }),
            IndexEvent::Embedded { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "embedding",
                "n": n,
                "total": total
            }),
            IndexEvent::Persisted { records } => serde_json::json!({
                "event": "progress",
                "phase": "persisted",
                "records": records
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op observer when progress is disabled.
pub struct NoProgress;

impl IndexObserver for NoProgress {
    fn on_event(&self, _event: IndexEvent<'_>) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn observer(&self) -> Box<dyn IndexObserver> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
