pub mod artifact;
pub mod reader;

pub use artifact::{DocumentArtifact, DocumentKind, ExtractedText};
pub use reader::{
    DocumentExtractor, DocumentParser, Extraction, PdfParser, EMPTY_DOCUMENT_SENTINEL,
    EMPTY_DOCUMENT_WARNING,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The document bytes could not be decoded as text or opened as a PDF.
    #[error("unreadable document: {0}")]
    Decode(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
