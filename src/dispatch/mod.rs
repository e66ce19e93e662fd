pub mod http;
pub mod registry;

use async_trait::async_trait;

use crate::error::PromptcastError;
use crate::input::ModelIdentifier;

/// One chat completion: a system message followed by a user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a ModelIdentifier,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
}

/// Textual reply of a completion. Provider-specific response shapes are
/// reduced to message text before this is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
}

/// Anything that can answer one completion request per call.
/// No batching, no retries; timeouts are the implementor's business.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, req: &CompletionRequest<'_>) -> Result<Completion, PromptcastError>;
}
