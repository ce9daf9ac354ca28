use crate::traits::Interface;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

pub const DEFAULT_PROMPT: &str = "> ";

pub struct TerminalInterface {
    reader: Mutex<BufReader<Stdin>>,
    prompt: String,
}

impl TerminalInterface {
    pub fn new() -> Self {
        Self::with_prompt(DEFAULT_PROMPT)
    }

    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
            prompt: prompt.into(),
        }
    }

    async fn write_stdout(&self, text: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(text.as_bytes()).await;
        let _ = stdout.flush().await;
    }
}

impl Default for TerminalInterface {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads one line without its terminator. Invalid UTF-8 is replaced rather
/// than ending the session; `None` means end of input or a read failure.
async fn next_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut buf = Vec::new();
    match reader.read_until(b'\n', &mut buf).await {
        Ok(0) => None, // EOF
        Ok(_) => {
            let line = String::from_utf8_lossy(&buf);
            Some(line.trim_end_matches(['\r', '\n']).to_string())
        }
        Err(e) => {
            tracing::warn!("Failed to read from stdin: {}", e);
            None
        }
    }
}

#[async_trait]
impl Interface for TerminalInterface {
    async fn receive_input(&self) -> Option<String> {
        self.write_stdout(&self.prompt).await;

        let mut reader = self.reader.lock().await;
        next_line(&mut *reader).await
    }

    async fn send_output(&self, message: &str) {
        self.write_stdout(&format!("{}\n", message)).await;
    }

    async fn show_status(&self, status: &str) {
        self.write_stdout(&format!("ℹ️  {}\n", status)).await;
    }

    async fn show_error(&self, error: &str) {
        let mut stderr = tokio::io::stderr();
        let _ = stderr.write_all(format!("Error: {}\n", error).as_bytes()).await;
        let _ = stderr.flush().await;
    }
}
