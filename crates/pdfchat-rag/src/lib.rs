//! pdfchat RAG - Retrieval-Augmented Generation over local PDFs
//!
//! This crate implements the question answering pipeline:
//! - Knowledge base: documents paired with their embeddings in a flat index
//! - Retriever: embed the question, take the top-k nearest documents
//! - Prompt construction from the joined passages and the raw question
//! - Generative model clients
//! - The interactive chat loop, behind a request/response I/O trait
//!
//! Author: hephaex@gmail.com

pub mod chat;
pub mod llm;
pub mod retriever;

pub use chat::{ChatIo, ChatSession, ChatState, TurnInput, TurnOutcome};
pub use llm::{create_llm_client, OllamaClient, OpenAiClient};
pub use retriever::{join_passages, KnowledgeBase, Retriever};

// ============================================================================
// Prompt Builder
// ============================================================================

/// Builder for constructing RAG prompts
///
/// Produces `Context: <context>\nUser Question: <question>`, optionally
/// preceded by a system instruction and a blank line.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system_instruction: Option<String>,
    context: String,
    question: String,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set system instruction
    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        self.system_instruction = (!instruction.trim().is_empty()).then_some(instruction);
        self
    }

    /// Set the retrieved context
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the question
    pub fn question(mut self, q: impl Into<String>) -> Self {
        self.question = q.into();
        self
    }

    /// Build the final prompt
    pub fn build(self) -> String {
        let mut prompt = String::new();

        if let Some(system) = &self.system_instruction {
            prompt.push_str(system);
            prompt.push_str("\n\n");
        }

        prompt.push_str("Context: ");
        prompt.push_str(&self.context);
        prompt.push_str("\nUser Question: ");
        prompt.push_str(&self.question);

        prompt
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_builder() {
        let prompt = PromptBuilder::new()
            .context("The cat sat on the mat.")
            .question("Where did the cat sit?")
            .build();

        assert_eq!(
            prompt,
            "Context: The cat sat on the mat.\nUser Question: Where did the cat sit?"
        );
    }

    #[test]
    fn test_prompt_builder_with_system() {
        let prompt = PromptBuilder::new()
            .system("Answer only from the context.")
            .context("ctx")
            .question("q")
            .build();

        assert!(prompt.starts_with("Answer only from the context.\n\nContext: ctx"));
    }

    #[test]
    fn test_blank_system_instruction_is_ignored() {
        let prompt = PromptBuilder::new()
            .system("  ")
            .context("ctx")
            .question("q")
            .build();

        assert_eq!(prompt, "Context: ctx\nUser Question: q");
    }
}
