//! In-process sentence embeddings with fastembed
//!
//! Runs all-MiniLM-L6-v2 through ONNX Runtime, so indexing and retrieval
//! need no embedding server. The model is downloaded on first use.
//!
//! Author: hephaex@gmail.com

use std::sync::Mutex;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use pdfchat_core::{PdfChatError, Result};
use tracing::info;

use crate::EmbeddingClient;

/// all-MiniLM-L6-v2 running locally
pub struct LocalEmbedding {
    model: Mutex<TextEmbedding>,
}

impl LocalEmbedding {
    /// Model name reported for this embedder
    pub const MODEL: &'static str = "all-MiniLM-L6-v2";

    /// Output dimension of all-MiniLM-L6-v2
    pub const DIMENSION: usize = 384;

    /// Load the model, downloading it into the fastembed cache if needed
    pub fn try_new() -> Result<Self> {
        info!(model = Self::MODEL, "Loading local embedding model");
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
        )
        .map_err(|e| PdfChatError::EmbeddingError(format!("Failed to load {}: {e}", Self::MODEL)))?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }

    fn embed_texts(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| PdfChatError::EmbeddingError("Embedding model lock poisoned".to_string()))?;

        model
            .embed(texts, None)
            .map_err(|e| PdfChatError::EmbeddingError(format!("Local embedding failed: {e}")))
    }
}

#[async_trait]
impl EmbeddingClient for LocalEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_texts(vec![text])?
            .into_iter()
            .next()
            .ok_or_else(|| PdfChatError::EmbeddingError("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_texts(texts.iter().map(String::as_str).collect())
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn model(&self) -> &str {
        Self::MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatL2Index;

    #[tokio::test]
    #[ignore = "downloads all-MiniLM-L6-v2 on first run"]
    async fn test_pets_question_finds_the_cat_sentence() {
        let embedder = LocalEmbedding::try_new().unwrap();
        let texts = vec![
            "The cat sat on the mat.".to_string(),
            "Quantum computers use qubits.".to_string(),
        ];

        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert!(vectors.iter().all(|v| v.len() == LocalEmbedding::DIMENSION));

        let index = FlatL2Index::build(&vectors).unwrap();
        let query = embedder.embed("Tell me about pets").await.unwrap();
        let hits = index.search(&query, 1).unwrap();

        assert_eq!(hits[0].position, 0);
    }

    #[tokio::test]
    #[ignore = "downloads all-MiniLM-L6-v2 on first run"]
    async fn test_same_text_same_vector() {
        let embedder = LocalEmbedding::try_new().unwrap();
        let a = embedder.embed("Reset the boiler.").await.unwrap();
        let b = embedder.embed("Reset the boiler.").await.unwrap();
        assert_eq!(a, b);
    }
}
