//! Source documents: immutable text plus page boundaries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Start of a page within the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBoundary {
    /// 1-based page number.
    pub page_number: u32,
    /// Byte offset of the page's first character in `Document::text`.
    pub char_offset: usize,
}

/// A loaded document. Created once per input file and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source: String,
    text: String,
    pages: Vec<PageBoundary>,
}

impl Document {
    /// Build a document from text and page boundaries.
    ///
    /// Pages are sorted by offset. An empty page list is treated as a single
    /// page starting at offset 0.
    pub fn new(source: impl Into<String>, text: impl Into<String>, mut pages: Vec<PageBoundary>) -> Self {
        let text = text.into();
        pages.sort_by_key(|p| p.char_offset);
        if pages.is_empty() {
            pages.push(PageBoundary {
                page_number: 1,
                char_offset: 0,
            });
        }
        Self {
            id: document_id(&text),
            source: source.into(),
            text,
            pages,
        }
    }

    /// Single-page document, mostly useful for tests and inline text.
    pub fn from_text(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(source, text, Vec::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pages(&self) -> &[PageBoundary] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page number containing the given byte offset.
    pub fn page_at(&self, offset: usize) -> u32 {
        let idx = self.pages.partition_point(|p| p.char_offset <= offset);
        if idx == 0 {
            self.pages[0].page_number
        } else {
            self.pages[idx - 1].page_number
        }
    }
}

/// Content-derived document id: first 16 hex chars of the SHA-256 of the text.
pub fn document_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
