//! Document loading for text-based formats.

use std::path::Path;

use chunkwise_core::{Document, Error, PageBoundary, Result};

/// Supported file types for document loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PlainText,
    Markdown,
    Json,
    Pdf,
    Unknown,
}

impl FileType {
    /// Detect file type from extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Self::PlainText,
            "md" | "markdown" => Self::Markdown,
            "json" => Self::Json,
            "pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::PlainText | Self::Markdown | Self::Json)
    }
}

/// Anything that can turn a path into a `Document`.
pub trait DocumentSource {
    fn load(&self, path: &Path) -> Result<Document>;
}

/// Loads `.txt` / `.md` (form feed separates pages) and `.json` page lists.
///
/// PDF text extraction is done upstream; convert to text first.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFileSource;

impl DocumentSource for TextFileSource {
    fn load(&self, path: &Path) -> Result<Document> {
        let file_type = FileType::from_path(path);
        if !file_type.is_supported() {
            return Err(Error::UnreadableDocument(format!(
                "{}: unsupported file type {:?}",
                path.display(),
                file_type
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| Error::UnreadableDocument(format!("{}: {}", path.display(), e)))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| Error::UnreadableDocument(format!("{}: not valid UTF-8", path.display())))?;
        if looks_binary(&content) {
            return Err(Error::UnreadableDocument(format!(
                "{}: binary content",
                path.display()
            )));
        }

        let pages: Vec<String> = match file_type {
            FileType::Json => json_pages(&content)
                .map_err(|e| Error::UnreadableDocument(format!("{}: {}", path.display(), e)))?,
            _ => content.split('\x0c').map(str::to_string).collect(),
        };

        let document = assemble(path.display().to_string(), &pages);
        tracing::info!(
            "Loaded {} ({} pages, {} bytes)",
            document.source,
            document.page_count(),
            document.text().len()
        );
        Ok(document)
    }
}

/// Join pages with blank lines and record where each starts.
fn assemble(source: String, pages: &[String]) -> Document {
    let mut text = String::new();
    let mut boundaries = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            text.push_str("\n\n");
        }
        boundaries.push(PageBoundary {
            page_number: i as u32 + 1,
            char_offset: text.len(),
        });
        text.push_str(page);
    }
    Document::new(source, text, boundaries)
}

/// Accepts `{"pages": ["..", ..]}` or a bare array of page strings.
fn json_pages(content: &str) -> std::result::Result<Vec<String>, String> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let array = match &value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => map
            .get("pages")
            .and_then(|p| p.as_array())
            .ok_or_else(|| "expected a \"pages\" array".to_string())?,
        _ => return Err("expected an array of pages".into()),
    };
    array
        .iter()
        .map(|p| {
            p.as_str()
                .map(str::to_string)
                .ok_or_else(|| "pages must be strings".to_string())
        })
        .collect()
}

/// NUL bytes or a high share of control characters.
fn looks_binary(content: &str) -> bool {
    if content.contains('\0') {
        return true;
    }
    let control = content
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c'))
        .count();
    control > content.len() / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_extension("TXT"), FileType::PlainText);
        assert_eq!(FileType::from_extension("md"), FileType::Markdown);
        assert_eq!(FileType::from_extension("json"), FileType::Json);
        assert_eq!(FileType::from_extension("pdf"), FileType::Pdf);
        assert!(!FileType::Pdf.is_supported());
        assert!(!FileType::from_extension("docx").is_supported());
    }

    #[test]
    fn test_load_text_with_form_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agreement.txt");
        std::fs::write(&path, "Page one text.\x0cPage two text.\x0cPage three.").unwrap();

        let doc = TextFileSource.load(&path).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.text(), "Page one text.\n\nPage two text.\n\nPage three.");
        let two = doc.text().find("Page two").unwrap();
        assert_eq!(doc.page_at(two), 2);
        assert_eq!(doc.page_at(0), 1);
    }

    #[test]
    fn test_load_json_pages() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("doc.json");
        std::fs::write(&obj, r#"{"pages": ["First.", "Second."]}"#).unwrap();
        let arr = dir.path().join("arr.json");
        std::fs::write(&arr, r#"["First.", "Second."]"#).unwrap();

        let a = TextFileSource.load(&obj).unwrap();
        let b = TextFileSource.load(&arr).unwrap();
        assert_eq!(a.text(), "First.\n\nSecond.");
        assert_eq!(a.id, b.id);
        assert_eq!(a.page_count(), 2);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"pages": [1, 2]}"#).unwrap();
        assert!(matches!(
            TextFileSource.load(&bad),
            Err(Error::UnreadableDocument(_))
        ));
    }

    #[test]
    fn test_unreadable_inputs() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            TextFileSource.load(&missing),
            Err(Error::UnreadableDocument(_))
        ));

        let pdf = dir.path().join("scan.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        assert!(matches!(
            TextFileSource.load(&pdf),
            Err(Error::UnreadableDocument(_))
        ));

        let latin1 = dir.path().join("latin1.txt");
        std::fs::write(&latin1, [0x50, 0x72, 0xEA, 0x74]).unwrap();
        assert!(matches!(
            TextFileSource.load(&latin1),
            Err(Error::UnreadableDocument(_))
        ));

        let binary = dir.path().join("blob.txt");
        std::fs::write(&binary, b"abc\0def").unwrap();
        assert!(matches!(
            TextFileSource.load(&binary),
            Err(Error::UnreadableDocument(_))
        ));
    }
}
