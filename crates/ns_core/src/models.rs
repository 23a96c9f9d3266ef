use crate::Result;
use async_trait::async_trait;

/// A hosted text-completion model that can produce a short article summary.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    /// Human-readable model name for logs.
    fn name(&self) -> &str;

    /// Summarize `text`, aiming for at most `max_length` words.
    async fn summarize(&self, text: &str, max_length: usize) -> Result<String>;
}
