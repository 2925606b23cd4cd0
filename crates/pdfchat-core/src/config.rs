//! pdfchat Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with defaults suited to a local setup (Ollama on localhost, PDFs in
//! `./pdfs`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Source documents
    pub documents: DocumentsConfig,

    /// Vector index persistence
    pub index: IndexConfig,

    /// Embedding and generative model configuration
    pub llm: LlmConfig,

    /// Retrieval configuration
    pub rag: RagConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Documents
        if let Ok(dir) = std::env::var("PDF_DIR") {
            self.documents.pdf_dir = dir.into();
        }

        // Index
        if let Ok(path) = std::env::var("INDEX_PATH") {
            self.index.path = path.into();
        }

        // LLM
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            self.llm.embedding_provider = provider.parse()?;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.llm.embedding_model = model;
        }
        if let Ok(dimension) = std::env::var("EMBEDDING_DIMENSION") {
            let parsed = dimension.parse().map_err(|_| ConfigError::InvalidValue {
                key: "EMBEDDING_DIMENSION".to_string(),
                value: dimension.clone(),
            })?;
            self.llm.embedding_dimension = Some(parsed);
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.llm.ollama_url = url;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.llm.openai_base_url = Some(url);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Check values that would otherwise fail deep inside the pipeline
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "rag.top_k".to_string(),
                value: "0".to_string(),
            });
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("llm.model".to_string()));
        }
        if self.llm.embedding_model.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "llm.embedding_model".to_string(),
            ));
        }
        if self.llm.embedding_dimension == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "llm.embedding_dimension".to_string(),
                value: "0".to_string(),
            });
        }

        let needs_openai_key = self.llm.provider == LlmProvider::OpenAI
            || self.llm.embedding_provider == EmbeddingProvider::OpenAI;
        if needs_openai_key
            && self.llm.openai_api_key.is_none()
            && self.llm.openai_base_url.is_none()
        {
            // A custom base URL usually points at a local server that ignores the key
            return Err(ConfigError::MissingRequired("OPENAI_API_KEY".to_string()));
        }

        Ok(())
    }
}

/// Source document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory scanned (non-recursively) for `*.pdf` files
    pub pdf_dir: PathBuf,

    /// Skip PDFs without any extractable text instead of failing
    pub skip_empty: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("./pdfs"),
            skip_empty: true,
        }
    }
}

/// Vector index persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// File the index is written to after every build
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./pdfchat.index"),
        }
    }
}

/// Embedding and generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generative model provider
    pub provider: LlmProvider,

    /// Generative model name
    pub model: String,

    /// Embedding provider
    pub embedding_provider: EmbeddingProvider,

    /// Embedding model name
    pub embedding_model: String,

    /// Vector size of the embedding model; derived from the model name when unset
    pub embedding_dimension: Option<usize>,

    /// Ollama server URL
    pub ollama_url: String,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL (llama.cpp server, vLLM, ...)
    pub openai_base_url: Option<String>,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            model: "mistral".to_string(),
            embedding_provider: EmbeddingProvider::Ollama,
            embedding_model: "all-minilm".to_string(),
            embedding_dimension: None,
            ollama_url: "http://localhost:11434".to_string(),
            openai_api_key: None,
            openai_base_url: None,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Supported generative model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Ollama,
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAI,
    Ollama,
    /// all-MiniLM-L6-v2 run in-process (needs the `local-embeddings` feature)
    Local,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Number of documents retrieved per question
    pub top_k: usize,

    /// Separator placed between retrieved passages
    pub separator: String,

    /// Instruction placed before the context in every prompt
    pub system_prompt: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            separator: "\n\n---\n\n".to_string(),
            system_prompt: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
