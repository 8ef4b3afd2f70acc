//! Text extraction for PDF and Word documents.
//!
//! The format is chosen from the file extension (case-insensitive):
//!
//! | Extension | Extractor |
//! |-----------|-----------|
//! | `.pdf` | `pdf-extract` over the whole file |
//! | `.docx`, `.doc` | `word/document.xml` from the OOXML archive, one line per paragraph |
//!
//! Anything else is rejected with "Unsupported file type". Extracted text
//! is trimmed of leading and trailing whitespace.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;

use passage_core::pipeline::DocumentReader;
use passage_core::{Error, Result};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Supported document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" | "doc" => Ok(DocumentKind::Word),
            "" => Err(Error::Extraction(format!(
                "Unsupported file type: {} has no extension. Only PDF and DOCX are supported",
                path.display()
            ))),
            other => Err(Error::Extraction(format!(
                "Unsupported file type: .{}. Only PDF and DOCX are supported",
                other
            ))),
        }
    }
}

/// Filesystem-backed [`DocumentReader`].
pub struct FileReader;

impl DocumentReader for FileReader {
    fn read_text(&self, path: &Path) -> Result<String> {
        let kind = DocumentKind::from_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Extraction(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let text = extract_text(&bytes, kind)?;
        tracing::debug!(path = %path.display(), chars = text.len(), "extracted text");
        Ok(text)
    }
}

/// Extract trimmed plain text from in-memory document bytes.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String> {
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Word => extract_docx(bytes)?,
    };
    Ok(text.trim().to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Extraction(format!("PDF extraction failed: {}", e)))
}

fn ooxml(e: impl std::fmt::Display) -> Error {
    Error::Extraction(format!("DOCX extraction failed: {}", e))
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(ooxml)?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ooxml("word/document.xml not found"))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(ooxml)?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ooxml("word/document.xml exceeds size limit"));
    }

    extract_paragraphs(&doc_xml)
}

/// Collect `<w:t>` text, one output line per `<w:p>` paragraph.
///
/// Paragraphs nest inside text boxes (`w:txbxContent`), so open paragraphs
/// are kept on a stack; an inner paragraph is emitted when it closes and the
/// outer one keeps its text.
fn extract_paragraphs(xml: &[u8]) -> Result<String> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => open.push(String::new()),
                _ => {}
            },
            Ok(Event::Empty(e)) => match (e.local_name().as_ref(), open.last_mut()) {
                (b"tab", Some(current)) => current.push('\t'),
                (b"br", Some(current)) => current.push('\n'),
                (b"p", _) => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                if let Some(current) = open.last_mut() {
                    current.push_str(te.unescape().map_err(ooxml)?.as_ref());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.extend(open.pop()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs.join("\n"))
}
