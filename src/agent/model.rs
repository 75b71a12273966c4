//! The seam between a session and whatever serves the model

use async_trait::async_trait;

use crate::ollama::{ChatError, ChatMessage, ChatResponse, Tool};

/// A chat-capable model backend
///
/// [`OllamaClient`](crate::ollama::OllamaClient) is the production
/// implementation; tests script their own. The backend decides per call
/// whether to answer or to request tools from `tools`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[Tool],
    ) -> Result<ChatResponse, ChatError>;
}
