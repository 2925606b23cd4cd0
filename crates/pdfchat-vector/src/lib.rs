//! pdfchat Vector - Embeddings and nearest-neighbor search
//!
//! Provides the embedding clients that turn text into vectors and the
//! flat, exact L2 index the document embeddings are stored in.

use pdfchat_core::PdfChatError;
use thiserror::Error;

pub mod embedding;
pub mod flat_index;
#[cfg(feature = "local-embeddings")]
pub mod local;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use embedding::{
    create_embedding_client, known_dimension, EmbeddingClient, OllamaEmbedding, OpenAiEmbedding,
};
pub use flat_index::FlatL2Index;
#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedding;

/// Errors raised by the vector index
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Cannot build an index from zero vectors")]
    EmptyIndex,

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Search requires k > 0")]
    InvalidK,

    #[error("Index file error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VectorError> for PdfChatError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Io(e) => Self::IoError(e),
            other => Self::IndexError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, VectorError>;

/// A single nearest-neighbor match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Row of the matched vector, in insertion order
    pub position: usize,

    /// L2 distance to the query
    pub distance: f32,
}
