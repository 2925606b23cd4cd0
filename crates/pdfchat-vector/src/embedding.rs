//! Embedding client for generating vector representations
//!
//! Supports Ollama and OpenAI-compatible embedding APIs. An in-process
//! all-MiniLM-L6-v2 model is available with the `local-embeddings` feature.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use pdfchat_core::{EmbeddingProvider, LlmConfig, PdfChatError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch), in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Model identifier
    fn model(&self) -> &str;
}

/// Output size of well-known embedding models.
///
/// Ollama tags (`all-minilm:latest`, `nomic-embed-text:v1.5`) resolve to
/// their base model.
pub fn known_dimension(model: &str) -> Option<usize> {
    let base = model.split(':').next().unwrap_or(model).to_lowercase();
    match base.as_str() {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" => Some(1024),
        "all-minilm" | "all-minilm-l6-v2" => Some(384),
        _ => None,
    }
}

fn check_dimension(expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != expected {
        return Err(PdfChatError::EmbeddingError(format!(
            "Expected {expected}-dimensional embedding, got {}",
            embedding.len()
        )));
    }
    Ok(())
}

// ============================================================================
// OpenAI Embedding Client
// ============================================================================

/// OpenAI-compatible embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = known_dimension(&model).unwrap_or(1536);

        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        if config.openai_api_key.is_none() && config.openai_base_url.is_none() {
            return Err(PdfChatError::ConfigError(
                "OpenAI API key required".to_string(),
            ));
        }

        let mut client = Self::new(
            config.openai_api_key.clone(),
            config.embedding_model.clone(),
        );
        if let Some(url) = &config.openai_base_url {
            client = client.with_base_url(url.clone());
        }
        if let Some(dimension) = config.embedding_dimension {
            client = client.with_dimension(dimension);
        }
        Ok(client)
    }

    /// Set custom base URL (for local OpenAI-compatible servers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the dimension for models not in the built-in table
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| PdfChatError::EmbeddingError("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OpenAiEmbeddingRequest {
            input: texts.to_vec(),
            model: self.model.clone(),
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| PdfChatError::EmbeddingError(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PdfChatError::EmbeddingError(format!(
                "OpenAI embedding error: {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            PdfChatError::EmbeddingError(format!("Failed to parse embedding response: {e}"))
        })?;

        if result.data.len() != texts.len() {
            return Err(PdfChatError::EmbeddingError(format!(
                "Requested {} embeddings, received {}",
                texts.len(),
                result.data.len()
            )));
        }

        // Sort by index and extract embeddings
        let mut embeddings: Vec<_> = result.data.into_iter().collect();
        embeddings.sort_by_key(|e| e.index);

        let embeddings: Vec<Vec<f32>> = embeddings.into_iter().map(|e| e.embedding).collect();
        for embedding in &embeddings {
            check_dimension(self.dimension, embedding)?;
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = known_dimension(&model).unwrap_or(768);

        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = Self::new(config.ollama_url.clone(), config.embedding_model.clone());
        match config.embedding_dimension {
            Some(dimension) => client.with_dimension(dimension),
            None => client,
        }
    }

    /// Override the dimension for models not in the built-in table
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PdfChatError::EmbeddingError(format!("Ollama embedding request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PdfChatError::EmbeddingError(format!(
                "Ollama embedding error: {error_text}"
            )));
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            PdfChatError::EmbeddingError(format!("Failed to parse embedding response: {e}"))
        })?;

        check_dimension(self.dimension, &result.embedding)?;
        Ok(result.embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Ollama doesn't have native batch embedding, so we process sequentially
        let mut results = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            debug!(item = i + 1, total = texts.len(), "Embedding document");
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(config: &LlmConfig) -> Result<Box<dyn EmbeddingClient>> {
    match config.embedding_provider {
        EmbeddingProvider::OpenAI => Ok(Box::new(OpenAiEmbedding::from_config(config)?)),
        EmbeddingProvider::Ollama => Ok(Box::new(OllamaEmbedding::from_config(config))),
        EmbeddingProvider::Local => local_client(),
    }
}

#[cfg(feature = "local-embeddings")]
fn local_client() -> Result<Box<dyn EmbeddingClient>> {
    Ok(Box::new(crate::local::LocalEmbedding::try_new()?))
}

#[cfg(not(feature = "local-embeddings"))]
fn local_client() -> Result<Box<dyn EmbeddingClient>> {
    Err(PdfChatError::ConfigError(
        "embedding provider 'local' needs pdfchat built with the local-embeddings feature"
            .to_string(),
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_dimension() {
        let client = OpenAiEmbedding::new(Some("test-key".to_string()), "text-embedding-3-small");
        assert_eq!(client.dimension(), 1536);

        let client = OpenAiEmbedding::new(None, "text-embedding-3-large");
        assert_eq!(client.dimension(), 3072);

        let client = OpenAiEmbedding::new(None, "custom").with_dimension(512);
        assert_eq!(client.dimension(), 512);
    }

    #[test]
    fn test_ollama_dimension() {
        let client = OllamaEmbedding::new("http://localhost:11434", "all-minilm");
        assert_eq!(client.dimension(), 384);
        assert_eq!(client.model(), "all-minilm");

        let client = OllamaEmbedding::new("http://localhost:11434", "mxbai-embed-large");
        assert_eq!(client.dimension(), 1024);
    }

    #[test]
    fn test_openai_from_config_requires_key_or_url() {
        let config = LlmConfig {
            embedding_provider: EmbeddingProvider::OpenAI,
            ..Default::default()
        };
        assert!(OpenAiEmbedding::from_config(&config).is_err());

        let config = LlmConfig {
            openai_base_url: Some("http://localhost:8080/v1".to_string()),
            ..config
        };
        let client = OpenAiEmbedding::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_tagged_ollama_models_keep_their_dimension() {
        let client = OllamaEmbedding::new("http://localhost:11434", "all-minilm:latest");
        assert_eq!(client.dimension(), 384);

        let client = OllamaEmbedding::new("http://localhost:11434", "nomic-embed-text:v1.5");
        assert_eq!(client.dimension(), 768);

        assert_eq!(known_dimension("All-MiniLM-L6-v2"), Some(384));
        assert_eq!(known_dimension("my-custom-embedder"), None);
    }

    #[test]
    fn test_configured_dimension_overrides_table() {
        let config = LlmConfig {
            embedding_model: "my-custom-embedder".to_string(),
            embedding_dimension: Some(512),
            ..Default::default()
        };
        assert_eq!(OllamaEmbedding::from_config(&config).dimension(), 512);

        let config = LlmConfig {
            embedding_provider: EmbeddingProvider::OpenAI,
            openai_api_key: Some("test-key".to_string()),
            ..config
        };
        assert_eq!(OpenAiEmbedding::from_config(&config).unwrap().dimension(), 512);
    }

    #[test]
    fn test_factory_selects_provider() {
        let client = create_embedding_client(&LlmConfig::default()).unwrap();
        assert_eq!(client.model(), "all-minilm");
        assert_eq!(client.dimension(), 384);
    }

    #[cfg(not(feature = "local-embeddings"))]
    #[test]
    fn test_local_provider_needs_feature() {
        let config = LlmConfig {
            embedding_provider: EmbeddingProvider::Local,
            ..Default::default()
        };
        assert!(matches!(
            create_embedding_client(&config),
            Err(PdfChatError::ConfigError(_))
        ));
    }

    #[test]
    fn test_check_dimension() {
        assert!(check_dimension(3, &[0.0, 1.0, 2.0]).is_ok());
        assert!(matches!(
            check_dimension(3, &[0.0]),
            Err(PdfChatError::EmbeddingError(_))
        ));
    }
}
