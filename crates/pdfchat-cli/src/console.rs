//! Console implementation of the chat I/O channel
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use pdfchat_core::Result;
use pdfchat_rag::ChatIo;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

/// Shown before every line the user types
pub const INPUT_PROMPT: &str = "You: ";

/// Label in front of every model reply
pub const REPLY_LABEL: &str = "AI: ";

/// Line-oriented console over any async reader/writer pair
pub struct ConsoleIo<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> ConsoleIo<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    async fn write_line(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}

impl ConsoleIo<tokio::io::BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Console bound to the process stdin/stdout
    pub fn stdio() -> Self {
        Self::new(
            tokio::io::BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
    }
}

#[async_trait]
impl<R, W> ChatIo for ConsoleIo<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<Option<String>> {
        self.out.write_all(INPUT_PROMPT.as_bytes()).await?;
        self.out.flush().await?;

        // `Lines` strips both "\n" and "\r\n"
        Ok(self.lines.next_line().await?)
    }

    async fn write_reply(&mut self, reply: &str) -> Result<()> {
        let line = format!("{REPLY_LABEL}{reply}");
        self.write_line(&line).await
    }

    async fn write_notice(&mut self, notice: &str) -> Result<()> {
        self.write_line(notice).await
    }
}
