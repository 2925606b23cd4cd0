//! pdfchat Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout pdfchat:
//! - Documents and the aligned corpus fed into the vector index
//! - Retrieval results
//! - Common error types
//! - The generative model trait
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;

pub use config::{
    AppConfig, ConfigError, DocumentsConfig, EmbeddingProvider, IndexConfig, LlmConfig,
    LlmProvider, LoggingConfig, RagConfig,
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for pdfchat operations
#[derive(Error, Debug)]
pub enum PdfChatError {
    #[error("No documents to index: {0}")]
    EmptyCorpus(String),

    #[error("Persisted index does not match the documents ({0}); rebuild the index")]
    IndexMismatch(String),

    #[error("Document parsing error: {0}")]
    ParserError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Index error: {0}")]
    IndexError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for PdfChatError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfChatError>;

// ============================================================================
// Document Models
// ============================================================================

/// A source PDF and its extracted plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path the text was extracted from
    pub path: PathBuf,

    /// Extracted text, all non-blank pages joined
    pub text: String,
}

impl Document {
    /// Create a new document
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Identity recorded next to this document's index row
    pub fn fingerprint(&self) -> DocumentFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());

        DocumentFingerprint {
            path: self.path.clone(),
            sha256: format!("{:x}", hasher.finalize()),
        }
    }
}

/// Source path plus a digest of the extracted text.
///
/// Stored with a persisted index so a reload can tell whether row `i`
/// still embeds the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub path: PathBuf,

    /// Hex SHA-256 of the document text
    pub sha256: String,
}

/// A document paired with its row in the vector index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Row of this document's embedding in the index
    pub vector_id: usize,

    /// The document itself
    pub document: Document,
}

/// Ordered collection of documents whose positions match index rows.
///
/// Entries are only created through [`Corpus::from_documents`], which assigns
/// `vector_id` from the position, so `entries[i].vector_id == i` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Build a corpus, numbering documents in the given order
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let entries = documents
            .into_iter()
            .enumerate()
            .map(|(vector_id, document)| CorpusEntry {
                vector_id,
                document,
            })
            .collect();

        Self { entries }
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the corpus holds no documents
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the entry for an index row
    pub fn get(&self, vector_id: usize) -> Option<&CorpusEntry> {
        self.entries.get(vector_id)
    }

    /// All entries in index order
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Document texts in index order
    pub fn texts(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.document.text.as_str())
            .collect()
    }

    /// Source paths in index order
    pub fn paths(&self) -> Vec<&Path> {
        self.entries
            .iter()
            .map(|e| e.document.path.as_path())
            .collect()
    }

    /// Fingerprints in index order
    pub fn fingerprints(&self) -> Vec<DocumentFingerprint> {
        self.entries.iter().map(|e| e.document.fingerprint()).collect()
    }
}

// ============================================================================
// Retrieval Types
// ============================================================================

/// A document returned by nearest-neighbor retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Index row the passage was found at
    pub vector_id: usize,

    /// Source file
    pub path: PathBuf,

    /// Full document text
    pub text: String,

    /// L2 distance from the query embedding (lower is closer)
    pub distance: f32,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for generative model clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response for a complete prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
