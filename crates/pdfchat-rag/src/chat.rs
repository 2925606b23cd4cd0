//! Interactive chat loop
//!
//! A session alternates between waiting for a line and answering it until
//! the user types `exit` or input ends. Every other line, blank ones
//! included, is a question. Each turn is independent: the question, its
//! context and the reply are not kept for later turns.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;

use async_trait::async_trait;
use pdfchat_core::{LlmClient, RagConfig, Result};
use tracing::{debug, info};

use crate::{PromptBuilder, Retriever};

/// Printed once when the loop starts
pub const BANNER: &str = "Chatbot ready! Type 'exit' to quit.";

/// Input that ends the session, compared after lowercasing
pub const EXIT_COMMAND: &str = "exit";

/// Chat loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    AwaitingInput,
    Terminated,
}

/// Request/response channel between the session and the user
#[async_trait]
pub trait ChatIo: Send {
    /// Next line of input without its line terminator; `None` at end of input
    async fn read_line(&mut self) -> Result<Option<String>>;

    /// Deliver a model reply
    async fn write_reply(&mut self, reply: &str) -> Result<()>;

    /// Deliver a status message such as the banner
    async fn write_notice(&mut self, notice: &str) -> Result<()>;
}

/// What a line of input asks the session to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    Exit,
    Question(String),
}

impl TurnInput {
    /// Classify a raw input line
    pub fn parse(line: &str) -> Self {
        if line.to_lowercase() == EXIT_COMMAND {
            Self::Exit
        } else {
            Self::Question(line.to_string())
        }
    }
}

/// Result of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A question was answered
    Answered,
    /// `exit` was typed or input ended
    Ended,
}

impl TurnOutcome {
    /// State the loop moves to after this turn
    pub fn next_state(self) -> ChatState {
        match self {
            Self::Ended => ChatState::Terminated,
            Self::Answered => ChatState::AwaitingInput,
        }
    }
}

/// A chat session over one knowledge base and one generative model
pub struct ChatSession {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    top_k: usize,
    system_prompt: Option<String>,
}

impl ChatSession {
    /// Create a new session
    pub fn new(retriever: Retriever, llm: Arc<dyn LlmClient>, config: &RagConfig) -> Self {
        Self {
            retriever,
            llm,
            top_k: config.top_k,
            system_prompt: config.system_prompt.clone(),
        }
    }

    /// The retriever answering this session's questions
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Build the prompt for a question from already retrieved context
    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        let mut builder = PromptBuilder::new();
        if let Some(system) = &self.system_prompt {
            builder = builder.system(system.clone());
        }
        builder.context(context).question(question).build()
    }

    /// Answer one question: retrieve, prompt, generate, trim
    pub async fn answer(&self, question: &str) -> Result<String> {
        let context = self.retriever.search(question, self.top_k).await?;
        let prompt = self.build_prompt(&context, question);

        debug!(
            prompt_chars = prompt.len(),
            model = self.llm.model(),
            "Calling generative model"
        );
        let response = self.llm.generate(&prompt).await?;
        debug!(response_chars = response.len(), "Generative model replied");

        Ok(response.trim().to_string())
    }

    /// Run one iteration of the loop
    pub async fn step(&self, io: &mut dyn ChatIo) -> Result<TurnOutcome> {
        let Some(line) = io.read_line().await? else {
            return Ok(TurnOutcome::Ended);
        };

        match TurnInput::parse(&line) {
            TurnInput::Exit => Ok(TurnOutcome::Ended),
            TurnInput::Question(question) => {
                let reply = self.answer(&question).await?;
                io.write_reply(&reply).await?;
                Ok(TurnOutcome::Answered)
            }
        }
    }

    /// Run until terminated; returns the number of questions answered
    pub async fn run(&self, io: &mut dyn ChatIo) -> Result<usize> {
        io.write_notice(BANNER).await?;
        info!(
            documents = self.retriever.knowledge().len(),
            top_k = self.top_k,
            "Chat session started"
        );

        let mut answered = 0;
        let mut state = ChatState::AwaitingInput;
        while state == ChatState::AwaitingInput {
            let outcome = self.step(io).await?;
            if outcome == TurnOutcome::Answered {
                answered += 1;
            }
            state = outcome.next_state();
        }

        info!(answered, "Chat session ended");
        Ok(answered)
    }
}
