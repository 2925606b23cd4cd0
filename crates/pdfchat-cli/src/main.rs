//! pdfchat CLI - chat with a directory of PDFs
//!
//! Usage:
//!   pdfchat [--config <file>] [chat [--reuse-index]]
//!   pdfchat index
//!   pdfchat ask <question>
//!
//! Author: hephaex@gmail.com

mod console;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pdfchat_core::{AppConfig, Corpus, LlmClient, LoggingConfig};
use pdfchat_parser::{load_pdf_directory, LoadOptions};
use pdfchat_rag::{create_llm_client, ChatSession, KnowledgeBase, Retriever};
use pdfchat_vector::{create_embedding_client, EmbeddingClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleIo;

#[derive(Parser, Debug)]
#[command(name = "pdfchat")]
#[command(about = "Ask questions about a directory of PDF documents")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Index the PDFs and start an interactive chat (default)
    Chat {
        /// Reload the persisted index instead of re-embedding the PDFs
        #[arg(long)]
        reuse_index: bool,
    },
    /// Build and persist the index, then list the indexed documents
    Index,
    /// Answer a single question and exit
    Ask {
        /// Question to ask
        question: String,

        /// Reload the persisted index instead of re-embedding the PDFs
        #[arg(long)]
        reuse_index: bool,
    },
}

impl Cli {
    fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Chat { reuse_index: false })
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the PDFs and pair them with an index, built fresh or reloaded
async fn prepare_knowledge(
    config: &AppConfig,
    embedder: &dyn EmbeddingClient,
    reuse_index: bool,
) -> anyhow::Result<KnowledgeBase> {
    let options = LoadOptions {
        skip_empty: config.documents.skip_empty,
    };
    let documents = load_pdf_directory(&config.documents.pdf_dir, &options)
        .with_context(|| format!("loading PDFs from {}", config.documents.pdf_dir.display()))?;

    let index_path = &config.index.path;
    if reuse_index && index_path.exists() {
        info!(path = %index_path.display(), "Reusing persisted index");
        return Ok(KnowledgeBase::load(index_path, documents)?);
    }

    let knowledge = KnowledgeBase::build(documents, embedder).await?;
    knowledge
        .persist(index_path)
        .with_context(|| format!("writing index to {}", index_path.display()))?;

    Ok(knowledge)
}

async fn build_session(config: &AppConfig, reuse_index: bool) -> anyhow::Result<ChatSession> {
    let embedder: Arc<dyn EmbeddingClient> = Arc::from(create_embedding_client(&config.llm)?);
    let knowledge = prepare_knowledge(config, embedder.as_ref(), reuse_index).await?;
    let retriever = Retriever::new(embedder, knowledge, &config.rag)?;
    let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);

    Ok(ChatSession::new(retriever, llm, &config.rag))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging);

    match cli.command() {
        Commands::Chat { reuse_index } => {
            let session = build_session(&config, reuse_index).await?;
            let mut console = ConsoleIo::stdio();
            session.run(&mut console).await?;
        }
        Commands::Index => {
            let embedder = create_embedding_client(&config.llm)?;
            let knowledge = prepare_knowledge(&config, embedder.as_ref(), false).await?;

            println!(
                "Indexed {} documents into {}",
                knowledge.len(),
                config.index.path.display()
            );
            for line in index_listing(knowledge.corpus()) {
                println!("{line}");
            }
        }
        Commands::Ask {
            question,
            reuse_index,
        } => {
            let session = build_session(&config, reuse_index).await?;
            println!("{}", session.answer(&question).await?);
        }
    }

    Ok(())
}

/// One line per indexed document: row, source path and text length
fn index_listing(corpus: &Corpus) -> Vec<String> {
    corpus
        .paths()
        .into_iter()
        .zip(corpus.texts())
        .enumerate()
        .map(|(row, (path, text))| {
            format!("  [{row}] {} ({} chars)", path.display(), text.chars().count())
        })
        .collect()
}
