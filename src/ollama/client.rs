//! Ollama API client for chat inference and model listing

use async_trait::async_trait;
use serde::Deserialize;

use super::tool_use::{ChatError, ChatMessage, ChatResponse, Tool};
use crate::agent::ModelClient;

/// One entry of `/api/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Client for interacting with Ollama's HTTP API
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Ollama server (e.g., "http://localhost:11434")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the models installed on the server
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        let endpoint = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&endpoint).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }
        let tags: TagsResponse = serde_json::from_str(&text)?;
        Ok(tags.models)
    }

    /// Send a non-streaming chat request with optional tools
    ///
    /// # Arguments
    /// * `messages` - The conversation so far
    /// * `model` - The model name (e.g., "llama3.2")
    /// * `tools` - Tools the model may call; omitted from the body when empty
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[Tool],
    ) -> Result<ChatResponse, ChatError> {
        let endpoint = format!("{}/api/chat", self.base_url);

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools)?;
        }

        let response = self.client.post(&endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)?;
        Ok(chat_response)
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[Tool],
    ) -> Result<ChatResponse, ChatError> {
        OllamaClient::chat(self, messages, model, tools).await
    }
}

/// Ollama reports failures as `{"error": "..."}`; fall back to the raw body
fn status_error(status: u16, body: &str) -> ChatError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    ChatError::Status { status, message }
}

/// Whether `wanted` is among the installed models
///
/// Ollama tags untagged pulls as `:latest`, so `llama2` matches `llama2:latest`.
pub fn has_model(models: &[ModelInfo], wanted: &str) -> bool {
    models.iter().any(|m| {
        m.name == wanted
            || m.name
                .strip_suffix(":latest")
                .map_or(false, |base| base == wanted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            size: 0,
        }
    }

    #[test]
    fn test_has_model_matches_latest_tag() {
        let models = vec![model("llama2:latest"), model("qwen3:8b")];
        assert!(has_model(&models, "llama2"));
        assert!(has_model(&models, "llama2:latest"));
        assert!(has_model(&models, "qwen3:8b"));
        assert!(!has_model(&models, "qwen3"));
        assert!(!has_model(&[], "llama2"));
    }

    #[test]
    fn test_status_error_extracts_message() {
        match status_error(404, r#"{"error":"model 'x' not found"}"#) {
            ChatError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "model 'x' not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        match status_error(500, "boom\n") {
            ChatError::Status { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(
            OllamaClient::new("http://localhost:11434/").base_url(),
            "http://localhost:11434"
        );
    }
}
