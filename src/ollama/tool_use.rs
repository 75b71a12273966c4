//! Ollama Chat API wire types with tool calling support
//!
//! These mirror the JSON shapes of Ollama's `/api/chat` endpoint. Models
//! without native tool support sometimes write the call into the message
//! text instead, so a text fallback parser lives here too.

use serde::{Deserialize, Serialize};

/// A message in a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system", "user", "assistant", "tool"
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::with_role("tool", content)
    }

    fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: None,
        }
    }
}

/// A tool call from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Function call details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Tool definition for the model
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String, // Always "function"
    pub function: ToolFunction,
}

/// Function specification for a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value, // JSON Schema
}

/// Response from /api/chat
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: u32,
    #[serde(default)]
    pub eval_duration: u64,
}

impl ChatResponse {
    /// A finished response carrying plain assistant text
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::assistant(content),
            done: true,
            eval_count: 0,
            eval_duration: 0,
        }
    }

    /// A finished response that asks for the given tool calls
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        let mut message = ChatMessage::assistant("");
        message.tool_calls = Some(calls);
        Self {
            message,
            done: true,
            eval_count: 0,
            eval_duration: 0,
        }
    }
}

/// Error type for chat operations
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Transport failure: refused connection, reset, timeout
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success status
    #[error("model server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("empty response from Ollama")]
    EmptyResponse,
    /// The call did not finish within the configured bound
    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),
}

/// Try to parse tool calls from the response content text
///
/// This handles models that output tool calls as JSON in the text
/// instead of using the native tool_calls field. Only objects naming one of
/// `known_tools` are accepted, so JSON examples in an ordinary answer are
/// left alone.
pub fn parse_tool_calls_from_text(content: &str, known_tools: &[&str]) -> Vec<ToolCall> {
    let content = content.trim();
    let is_known = |call: &ToolCall| known_tools.contains(&call.function.name.as_str());

    // The whole message may be a single tool call
    if let Some(tool_call) = try_parse_tool_call(content) {
        return if is_known(&tool_call) {
            vec![tool_call]
        } else {
            Vec::new()
        };
    }

    // Otherwise scan for balanced {...} objects within the text
    let mut tool_calls = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for (i, c) in content.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Some(tool_call) = try_parse_tool_call(&content[s..=i]) {
                            if is_known(&tool_call) {
                                tool_calls.push(tool_call);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    tool_calls
}

fn try_parse_tool_call(json_str: &str) -> Option<ToolCall> {
    let value = serde_json::from_str::<serde_json::Value>(json_str).ok()?;
    parse_tool_call_from_value(&value)
}

/// Parse a tool call from a JSON Value
///
/// Accepts `{"name": ..., "arguments": {...}}`, the `"parameters"` spelling
/// some models use, and arguments that arrive as a JSON-encoded string.
fn parse_tool_call_from_value(value: &serde_json::Value) -> Option<ToolCall> {
    // Some models wrap the call the same way the native format does
    let value = value.get("function").unwrap_or(value);
    let name = value.get("name").and_then(|n| n.as_str())?;

    let arguments = value
        .get("arguments")
        .or_else(|| value.get("parameters"))?
        .clone();

    let arguments = match arguments {
        serde_json::Value::String(encoded) => {
            serde_json::from_str(&encoded).unwrap_or(serde_json::Value::String(encoded))
        }
        other => other,
    };

    Some(ToolCall::new(name, arguments))
}
