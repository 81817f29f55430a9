//! Reply generation
//!
//! Each backend implements `ReplyGenerator`; failures propagate to the caller
//! untouched (no retries here).

mod openai;

use async_trait::async_trait;

pub use openai::{DEFAULT_BASE_URL, OpenAiGenerator};

use crate::Result;

/// Produces a conversation continuation from a prompt
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Complete `prompt` with `model`, stopping at any of `stop`
    async fn complete(&self, prompt: &str, model: &str, stop: &[&str]) -> Result<String>;

    /// Generator name for logs
    fn name(&self) -> &'static str;
}
