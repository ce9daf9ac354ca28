use async_trait::async_trait;

/// Line-oriented user surface driven by the conversation engine.
#[async_trait]
pub trait Interface: Send + Sync {
    /// Next line of input, or `None` once the input stream is closed.
    async fn receive_input(&self) -> Option<String>;
    async fn send_output(&self, message: &str);
    async fn show_status(&self, status: &str);
    async fn show_error(&self, error: &str);
}
