//! Knowledge base and retriever
//!
//! The knowledge base pairs the corpus with the index built from it; the
//! retriever embeds a question, searches the index and maps hits back to
//! documents through their `vector_id`.
//!
//! Author: hephaex@gmail.com

use std::path::Path;
use std::sync::Arc;

use pdfchat_core::{
    Corpus, Document, DocumentFingerprint, PdfChatError, RagConfig, Result, RetrievedPassage,
};
use pdfchat_vector::{EmbeddingClient, FlatL2Index};
use tracing::{debug, info};

// ============================================================================
// Knowledge Base
// ============================================================================

/// Documents plus the index whose row `i` embeds document `i`
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    corpus: Corpus,
    index: FlatL2Index,
}

impl KnowledgeBase {
    /// Embed every document and build the index.
    ///
    /// Fails with `EmptyCorpus` before calling the embedder when there is
    /// nothing to index.
    pub async fn build(documents: Vec<Document>, embedder: &dyn EmbeddingClient) -> Result<Self> {
        if documents.is_empty() {
            return Err(PdfChatError::EmptyCorpus(
                "no PDF with extractable text was found".to_string(),
            ));
        }

        let corpus = Corpus::from_documents(documents);
        let texts: Vec<String> = corpus.texts().into_iter().map(str::to_string).collect();

        info!(
            documents = texts.len(),
            model = embedder.model(),
            "Embedding documents"
        );
        let vectors = embedder.embed_batch(&texts).await?;

        if vectors.len() != corpus.len() {
            return Err(PdfChatError::EmbeddingError(format!(
                "Embedded {} of {} documents",
                vectors.len(),
                corpus.len()
            )));
        }

        let index = FlatL2Index::build(&vectors)?;
        info!(
            rows = index.len(),
            dimension = index.dimension(),
            "Built vector index"
        );

        Ok(Self { corpus, index })
    }

    /// Pair a persisted index with freshly loaded documents.
    ///
    /// Every row must still embed the same document: same path, same
    /// extracted text, same position. Any difference is `IndexMismatch`.
    pub fn load(index_path: impl AsRef<Path>, documents: Vec<Document>) -> Result<Self> {
        let (index, rows) = FlatL2Index::load(index_path)?;
        let corpus = Corpus::from_documents(documents);

        if index.len() != corpus.len() {
            return Err(PdfChatError::IndexMismatch(format!(
                "{} rows for {} documents",
                index.len(),
                corpus.len()
            )));
        }

        for (stored, entry) in rows.iter().zip(corpus.entries()) {
            let current = entry.document.fingerprint();
            if *stored != current {
                return Err(PdfChatError::IndexMismatch(format!(
                    "row {} was built from {} but now holds {}",
                    entry.vector_id,
                    stored.path.display(),
                    describe_change(stored, &current)
                )));
            }
        }

        Ok(Self { corpus, index })
    }

    /// Write the index and its row fingerprints to disk
    pub fn persist(&self, index_path: impl AsRef<Path>) -> Result<()> {
        self.index.persist(index_path, &self.corpus.fingerprints())?;
        Ok(())
    }

    /// The indexed documents
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The vector index
    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    /// Always false for a successfully built knowledge base
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }
}

// ============================================================================
// Retriever
// ============================================================================

/// Top-k document retrieval for a question
pub struct Retriever {
    embedder: Arc<dyn EmbeddingClient>,
    knowledge: KnowledgeBase,
    separator: String,
}

impl Retriever {
    /// Create a retriever; the embedder must produce vectors of the index dimension
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        knowledge: KnowledgeBase,
        config: &RagConfig,
    ) -> Result<Self> {
        if embedder.dimension() != knowledge.index.dimension() {
            return Err(PdfChatError::IndexError(format!(
                "Embedding model {} produces {}-dimensional vectors but the index holds {}",
                embedder.model(),
                embedder.dimension(),
                knowledge.index.dimension()
            )));
        }

        Ok(Self {
            embedder,
            knowledge,
            separator: config.separator.clone(),
        })
    }

    /// The knowledge base searched by this retriever
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Return the `min(k, N)` documents closest to `query`, nearest first
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        if k == 0 {
            return Err(PdfChatError::ValidationError(
                "top_k must be at least 1".to_string(),
            ));
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = self.knowledge.index.search(&query_vector, k)?;

        let passages = hits
            .into_iter()
            .map(|hit| {
                let entry = self.knowledge.corpus.get(hit.position).ok_or_else(|| {
                    PdfChatError::IndexError(format!(
                        "Index row {} has no matching document",
                        hit.position
                    ))
                })?;

                Ok(RetrievedPassage {
                    vector_id: entry.vector_id,
                    path: entry.document.path.clone(),
                    text: entry.document.text.clone(),
                    distance: hit.distance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            k,
            returned = passages.len(),
            closest = ?passages.first().map(|p| p.distance),
            "Retrieved passages"
        );

        Ok(passages)
    }

    /// Retrieve and join the passage texts with the configured separator
    pub async fn search(&self, query: &str, k: usize) -> Result<String> {
        let passages = self.retrieve(query, k).await?;
        Ok(join_passages(&passages, &self.separator))
    }
}

fn describe_change(stored: &DocumentFingerprint, current: &DocumentFingerprint) -> String {
    if stored.path != current.path {
        current.path.display().to_string()
    } else {
        "edited text".to_string()
    }
}

/// Concatenate passage texts, nearest first
pub fn join_passages(passages: &[RetrievedPassage], separator: &str) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pdfchat_vector::testing::HashingEmbedding;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedder that maps known sentences to fixed 2-d points
    struct TopicEmbedding {
        calls: AtomicUsize,
    }

    impl TopicEmbedding {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn point(text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            if lower.contains("cat") || lower.contains("pet") {
                vec![1.0, 0.1]
            } else if lower.contains("quantum") || lower.contains("qubit") {
                vec![0.0, 1.0]
            } else {
                vec![0.5, 0.5]
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for TopicEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::point(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::point(t)).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "topic-test"
        }
    }

    fn pets_and_physics() -> Vec<Document> {
        vec![
            Document::new("pdfs/cat.pdf", "The cat sat on the mat."),
            Document::new("pdfs/quantum.pdf", "Quantum computers use qubits."),
        ]
    }

    #[tokio::test]
    async fn test_empty_corpus_fails_before_embedding() {
        let embedder = TopicEmbedding::new();
        let result = KnowledgeBase::build(Vec::new(), &embedder).await;

        assert!(matches!(result, Err(PdfChatError::EmptyCorpus(_))));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pets_query_returns_cat_document() {
        let embedder = Arc::new(TopicEmbedding::new());
        let kb = KnowledgeBase::build(pets_and_physics(), embedder.as_ref())
            .await
            .unwrap();
        let retriever = Retriever::new(embedder, kb, &RagConfig::default()).unwrap();

        let context = retriever.search("Tell me about pets", 1).await.unwrap();
        assert_eq!(context, "The cat sat on the mat.");
    }

    #[tokio::test]
    async fn test_retrieve_returns_min_k_n_sorted() {
        let embedder = Arc::new(TopicEmbedding::new());
        let kb = KnowledgeBase::build(pets_and_physics(), embedder.as_ref())
            .await
            .unwrap();
        let retriever = Retriever::new(embedder, kb, &RagConfig::default()).unwrap();

        let passages = retriever.retrieve("qubits", 3).await.unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].path, Path::new("pdfs/quantum.pdf"));
        assert!(passages[0].distance <= passages[1].distance);

        let texts = retriever.knowledge().corpus().texts();
        for p in &passages {
            assert_eq!(texts[p.vector_id], p.text);
        }
    }

    #[tokio::test]
    async fn test_search_joins_with_separator() {
        let embedder = Arc::new(TopicEmbedding::new());
        let kb = KnowledgeBase::build(pets_and_physics(), embedder.as_ref())
            .await
            .unwrap();
        let retriever = Retriever::new(embedder, kb, &RagConfig::default()).unwrap();

        let context = retriever.search("cats", 2).await.unwrap();
        assert_eq!(
            context,
            "The cat sat on the mat.\n\n---\n\nQuantum computers use qubits."
        );
    }

    #[tokio::test]
    async fn test_zero_k_is_rejected() {
        let embedder = Arc::new(TopicEmbedding::new());
        let kb = KnowledgeBase::build(pets_and_physics(), embedder.as_ref())
            .await
            .unwrap();
        let retriever = Retriever::new(embedder, kb, &RagConfig::default()).unwrap();

        assert!(matches!(
            retriever.retrieve("cats", 0).await,
            Err(PdfChatError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_persisted_index_gives_same_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfchat.index");
        let embedder = Arc::new(HashingEmbedding::new(64));

        let docs = vec![
            Document::new("a.pdf", "rust ownership and borrowing"),
            Document::new("b.pdf", "baking sourdough bread at home"),
            Document::new("c.pdf", "borrow checker error messages in rust"),
        ];
        let built = KnowledgeBase::build(docs.clone(), embedder.as_ref())
            .await
            .unwrap();
        built.persist(&path).unwrap();
        let loaded = KnowledgeBase::load(&path, docs).unwrap();

        let config = RagConfig::default();
        let original = Retriever::new(embedder.clone(), built, &config).unwrap();
        let reloaded = Retriever::new(embedder, loaded, &config).unwrap();

        let query = "rust borrow checker";
        assert_eq!(
            original.retrieve(query, 3).await.unwrap(),
            reloaded.retrieve(query, 3).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_load_detects_changed_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfchat.index");
        let embedder = HashingEmbedding::new(16);

        KnowledgeBase::build(pets_and_physics(), &embedder)
            .await
            .unwrap()
            .persist(&path)
            .unwrap();

        let mut docs = pets_and_physics();
        docs.push(Document::new("pdfs/new.pdf", "A third document."));
        let result = KnowledgeBase::load(&path, docs);

        assert!(matches!(result, Err(PdfChatError::IndexMismatch(_))));
    }

    #[tokio::test]
    async fn test_load_detects_swapped_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfchat.index");
        let embedder = Arc::new(TopicEmbedding::new());

        let docs = vec![
            Document::new("pdfs/a.pdf", "cat sat mat pets"),
            Document::new("pdfs/b.pdf", "quantum computers qubits"),
        ];
        KnowledgeBase::build(docs, embedder.as_ref())
            .await
            .unwrap()
            .persist(&path)
            .unwrap();

        // Same file names and count, contents exchanged
        let swapped = vec![
            Document::new("pdfs/a.pdf", "quantum computers qubits"),
            Document::new("pdfs/b.pdf", "cat sat mat pets"),
        ];
        let err = KnowledgeBase::load(&path, swapped).unwrap_err();

        assert!(matches!(err, PdfChatError::IndexMismatch(_)));
        assert!(err.to_string().contains("row 0"));
    }

    #[tokio::test]
    async fn test_load_detects_renamed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfchat.index");

        KnowledgeBase::build(pets_and_physics(), &TopicEmbedding::new())
            .await
            .unwrap()
            .persist(&path)
            .unwrap();

        let mut docs = pets_and_physics();
        docs[1].path = "pdfs/physics.pdf".into();
        let err = KnowledgeBase::load(&path, docs).unwrap_err();

        assert!(matches!(err, PdfChatError::IndexMismatch(_)));
        assert!(err.to_string().contains("physics.pdf"));
    }

    #[tokio::test]
    async fn test_load_accepts_unchanged_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfchat.index");
        let embedder = Arc::new(TopicEmbedding::new());

        KnowledgeBase::build(pets_and_physics(), embedder.as_ref())
            .await
            .unwrap()
            .persist(&path)
            .unwrap();
        let kb = KnowledgeBase::load(&path, pets_and_physics()).unwrap();
        let retriever = Retriever::new(embedder, kb, &RagConfig::default()).unwrap();

        let context = retriever.search("Tell me about pets", 1).await.unwrap();
        assert_eq!(context, "The cat sat on the mat.");
    }

    #[tokio::test]
    async fn test_retriever_rejects_dimension_mismatch() {
        let kb = KnowledgeBase::build(pets_and_physics(), &TopicEmbedding::new())
            .await
            .unwrap();
        let result = Retriever::new(
            Arc::new(HashingEmbedding::new(8)),
            kb,
            &RagConfig::default(),
        );
        assert!(matches!(result, Err(PdfChatError::IndexError(_))));
    }
}
