//! Loader tests over real PDF files
//!
//! Fixtures:
//! - `boiler.pdf`: one page of text
//! - `manual.pdf`: three pages, the middle one blank
//! - `scan.pdf`: one page with no text layer
//!
//! Author: hephaex@gmail.com

use std::path::{Path, PathBuf};

use pdfchat_core::Corpus;
use pdfchat_parser::{
    load_pdf_directory, DocumentParser, LoadOptions, ParserError, PdfParser,
};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Helper: a fresh directory holding copies of the named fixtures
fn pdf_dir(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        std::fs::copy(fixture(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn test_texts_and_paths_stay_aligned() {
    let dir = pdf_dir(&["manual.pdf", "boiler.pdf"]);

    let documents = load_pdf_directory(dir.path(), &LoadOptions::default()).unwrap();
    let corpus = Corpus::from_documents(documents);
    let texts = corpus.texts();
    let paths = corpus.paths();

    assert_eq!(texts.len(), 2);
    assert_eq!(texts.len(), paths.len());
    assert_eq!(paths[0], dir.path().join("boiler.pdf"));
    assert_eq!(paths[1], dir.path().join("manual.pdf"));
    assert!(normalize(texts[0]).contains("Reset the boiler by holding the red button."));
    assert!(normalize(texts[1]).contains("Chapter one covers setup."));
}

#[test]
fn test_blank_page_is_dropped() {
    let parsed = PdfParser::new().parse(&fixture("manual.pdf")).unwrap();

    assert_eq!(parsed.metadata.page_count, 3);
    assert_eq!(parsed.metadata.pages_with_text, 2);

    let text = normalize(&parsed.content);
    let first = text.find("Chapter one covers setup.").unwrap();
    let third = text.find("Chapter three covers cleaning.").unwrap();
    assert!(first < third);
}

#[test]
fn test_text_free_pdf_is_skipped_by_default() {
    let dir = pdf_dir(&["scan.pdf", "boiler.pdf"]);

    let documents = load_pdf_directory(dir.path(), &LoadOptions::default()).unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].path, dir.path().join("boiler.pdf"));
}

#[test]
fn test_text_free_pdf_fails_when_not_skipping() {
    let dir = pdf_dir(&["scan.pdf", "boiler.pdf"]);
    let options = LoadOptions { skip_empty: false };

    let result = load_pdf_directory(dir.path(), &options);

    match result {
        Err(ParserError::EmptyDocument(path)) => assert!(path.ends_with("scan.pdf")),
        other => panic!("expected EmptyDocument, got {other:?}"),
    }
}

#[test]
fn test_only_text_free_pdfs_yield_nothing() {
    let dir = pdf_dir(&["scan.pdf"]);
    let documents = load_pdf_directory(dir.path(), &LoadOptions::default()).unwrap();
    assert!(documents.is_empty());
}
