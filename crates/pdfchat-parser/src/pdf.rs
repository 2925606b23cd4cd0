//! PDF document parser using pdf-extract
//!
//! Extracts text page by page and joins the pages that produced text.
//! Pages with nothing extractable (scans, blank separators) are dropped.

use std::path::Path;

use crate::{
    DocumentParseMetadata, DocumentParser, FileType, ParsedDocument, ParserError, Result,
};

/// Separator placed between the text of consecutive pages
pub const PAGE_SEPARATOR: &str = "\n";

/// PDF document parser
#[derive(Debug, Clone, Default)]
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser
    pub fn new() -> Self {
        Self
    }

    /// Extract per-page text from PDF bytes
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| ParserError::PdfError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Join page texts, skipping pages that yield no text.
///
/// Returns the joined text and the number of pages kept.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> (String, u32) {
    let kept: Vec<&str> = pages
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.trim().is_empty())
        .collect();

    (kept.join(PAGE_SEPARATOR), kept.len() as u32)
}

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let file_type = FileType::from_path(path);
        if !self.can_parse(file_type) {
            return Err(ParserError::UnsupportedFormat(path.display().to_string()));
        }

        let pages = self.extract_pages(path)?;
        let (content, pages_with_text) = join_pages(&pages);

        let mut doc = ParsedDocument::new(path.display().to_string(), FileType::Pdf)
            .with_content(content);
        doc.metadata = DocumentParseMetadata {
            page_count: pages.len() as u32,
            pages_with_text,
        };

        Ok(doc)
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Pdf]
    }
}
