//! Directory loader
//!
//! Scans a directory (non-recursively) for PDF files and extracts each one
//! into a core `Document`. Files are visited in path order so repeated runs
//! over the same directory produce the same corpus order.

use std::path::{Path, PathBuf};

use pdfchat_core::Document;
use tracing::{debug, info, warn};

use crate::{DocumentParser, FileType, ParserError, PdfParser, Result};

/// Options for directory loading
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Skip PDFs with no extractable text instead of failing
    pub skip_empty: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { skip_empty: true }
    }
}

/// List the PDF files directly inside `dir`, sorted by path
pub fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |e: std::io::Error| ParserError::IoError {
        path: dir.display().to_string(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && FileType::from_path(&path) == FileType::Pdf {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Load every PDF directly inside `dir`.
///
/// An unreadable or malformed PDF aborts the load with its error. An empty
/// directory yields an empty vector; callers decide whether that is fatal.
pub fn load_pdf_directory(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let parser = PdfParser::new();
    let files = list_pdf_files(dir)?;

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let parsed = parser.parse(&path)?;

        if parsed.is_empty() {
            if !options.skip_empty {
                return Err(ParserError::EmptyDocument(parsed.file_path));
            }
            warn!(
                path = %path.display(),
                pages = parsed.metadata.page_count,
                "Skipping PDF without extractable text"
            );
            continue;
        }

        debug!(
            path = %path.display(),
            file_type = %parsed.file_type,
            pages = parsed.metadata.page_count,
            pages_with_text = parsed.metadata.pages_with_text,
            words = parsed.word_count(),
            chars = parsed.char_count(),
            "Loaded document"
        );
        documents.push(Document::new(path, parsed.content));
    }

    info!(
        dir = %dir.display(),
        documents = documents.len(),
        "Loaded PDF documents"
    );

    Ok(documents)
}
