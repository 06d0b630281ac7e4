use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;

use crate::IngestError;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

/// An uploaded technical document: raw bytes plus the name it was uploaded under.
#[derive(Debug, Clone)]
pub struct DocumentArtifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DocumentArtifact {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, IngestError> {
        let bytes = fs::read(path).await.map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, bytes })
    }

    /// PDF when the name says so or the bytes carry the PDF header, plain text otherwise.
    pub fn kind(&self) -> DocumentKind {
        if self.name.to_ascii_lowercase().ends_with(".pdf") || self.bytes.starts_with(PDF_MAGIC) {
            DocumentKind::Pdf
        } else {
            DocumentKind::PlainText
        }
    }

    /// Short content hash, used to correlate log lines without logging content.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update(&self.bytes);
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }
}

/// Text pulled out of a document. `length` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub content: String,
    pub length: usize,
}

impl ExtractedText {
    pub fn new(content: String) -> Self {
        let length = content.chars().count();
        Self { content, length }
    }
}
