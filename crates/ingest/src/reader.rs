use std::sync::Arc;

use lopdf::Document;
use tracing::{debug, warn};

use crate::artifact::{DocumentArtifact, DocumentKind, ExtractedText};
use crate::IngestError;

/// Substituted whenever a document yields no readable text.
pub const EMPTY_DOCUMENT_SENTINEL: &str =
    "The uploaded document was empty or contained no readable text.";

/// Non-fatal warning surfaced alongside the sentinel.
pub const EMPTY_DOCUMENT_WARNING: &str = "The uploaded document appears to be empty or unreadable.";

/// Splits a paginated document into per-page text, in page order.
///
/// Pages with nothing extractable come back as empty strings; only a document
/// that cannot be opened at all is an error.
pub trait DocumentParser: Send + Sync {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError>;
}

/// `lopdf`-backed parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfParser;

impl DocumentParser for PdfParser {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        let doc = Document::load_mem(bytes).map_err(|e| IngestError::Decode(e.to_string()))?;

        let pages = doc
            .get_pages()
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    debug!(page = page_number, error = %e, "No extractable text on page");
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}

/// Result of extraction: the text handed to prompts plus an optional warning
/// for the caller to display.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: ExtractedText,
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct DocumentExtractor {
    parser: Arc<dyn DocumentParser>,
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(Arc::new(PdfParser))
    }
}

impl DocumentExtractor {
    pub fn new(parser: Arc<dyn DocumentParser>) -> Self {
        Self { parser }
    }

    pub fn extract(&self, artifact: &DocumentArtifact) -> Result<Extraction, IngestError> {
        let raw = match artifact.kind() {
            DocumentKind::Pdf => self.parser.pages(&artifact.bytes)?.concat(),
            DocumentKind::PlainText => decode_plain_text(&artifact.bytes)?,
        };

        if raw.trim().is_empty() {
            warn!(
                document = %artifact.fingerprint(),
                "Document is empty or unreadable, substituting sentinel"
            );
            return Ok(Extraction {
                text: ExtractedText::new(EMPTY_DOCUMENT_SENTINEL.to_string()),
                warning: Some(EMPTY_DOCUMENT_WARNING.to_string()),
            });
        }

        Ok(Extraction {
            text: ExtractedText::new(raw),
            warning: None,
        })
    }
}

fn decode_plain_text(bytes: &[u8]) -> Result<String, IngestError> {
    let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Decode(e.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}
