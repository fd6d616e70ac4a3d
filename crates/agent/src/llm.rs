use anyhow::Result;
use async_trait::async_trait;

/// One-shot completion against a language model. Implementations own
/// their transport, auth, and timeouts.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
