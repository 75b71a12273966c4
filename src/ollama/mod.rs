//! Ollama LLM integration module
//!
//! This module provides a client for Ollama's HTTP API: the `/api/chat`
//! endpoint with tool calling, and `/api/tags` for listing installed models.

pub mod client;
pub mod tool_use;

// Re-export public types so callers can write `crate::ollama::ChatMessage`
pub use client::{has_model, ModelInfo, OllamaClient};
pub use tool_use::{
    parse_tool_calls_from_text, ChatError, ChatMessage, ChatResponse, FunctionCall, Tool,
    ToolCall, ToolFunction,
};
