//! Extraction of the few document properties a bundle needs (page count, author).

use async_trait::async_trait;
use lopdf::{Dictionary, Document as PdfDocument, Object};
use mime::Mime;
use thiserror::Error;
use tracing::{debug, instrument};

/// What a bundle needs to know about the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub page_count: usize,
    /// Author as recorded in the document, if any.
    pub author: Option<String>,
}

impl ParsedDocument {
    /// The author split into words, or an empty list.
    pub fn authors(&self) -> Vec<String> {
        self.author
            .as_deref()
            .map(|author| author.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// Reads page count and author from the raw bytes of one document format.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    fn mime_type(&self) -> Mime;

    /// File extension handled by this parser, without the leading dot.
    fn extension(&self) -> &str;

    async fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError>;
}

/// Returns the built-in parser for a file extension (case-insensitive).
pub fn parser_for_extension(extension: &str) -> Option<Box<dyn DocumentParser>> {
    if extension.eq_ignore_ascii_case(PdfParser.extension()) {
        Some(Box::new(PdfParser))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfParser;

#[async_trait]
impl DocumentParser for PdfParser {
    fn mime_type(&self) -> Mime {
        mime::APPLICATION_PDF
    }

    fn extension(&self) -> &str {
        "pdf"
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let document = PdfDocument::load_mem(bytes)?;
        let page_count = document.get_pages().len();
        let author = info_dictionary(&document)
            .and_then(|info| info.get(b"Author").ok())
            .and_then(|object| resolve(&document, object))
            .and_then(|object| match object {
                Object::String(raw, _) => Some(decode_text_string(raw)),
                _ => None,
            })
            .map(|author| author.trim().to_string())
            .filter(|author| !author.is_empty());

        debug!(page_count, author = ?author, "Parsed PDF");
        Ok(ParsedDocument { page_count, author })
    }
}

fn resolve<'a>(document: &'a PdfDocument, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn info_dictionary(document: &PdfDocument) -> Option<&Dictionary> {
    let info = document.trailer.get(b"Info").ok()?;
    resolve(document, info)?.as_dict().ok()
}

// PDF text strings are either UTF-16BE with a byte order mark or a
// single-byte encoding close enough to Latin-1.
fn decode_text_string(raw: &[u8]) -> String {
    if let Some(utf16) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_string(),
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    }
}
