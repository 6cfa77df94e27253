//! LLM provider trait

use crate::{Completion, CompletionRequest, Result};
use async_trait::async_trait;

/// A backend able to complete a prompt
///
/// Implementations own their HTTP client and credentials; a request carries
/// only what varies per call.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send `request` and wait for the whole completion
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    /// Provider identifier used in logs (e.g. "anthropic", "openai")
    fn name(&self) -> &str;
}
