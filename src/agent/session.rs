//! Agent Session - one persona, one tool registry, one turn at a time
//!
//! The session sends the persona prompt and the user's text to the model,
//! executes any tools the model asks for, feeds their results back, and
//! returns the model's final answer. It keeps no history between turns.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::ModelClient;
use crate::metrics::{AGENT_TURNS, LLM_CALL_TIME, TOOL_CALLS};
use crate::ollama::{parse_tool_calls_from_text, ChatError, ChatMessage, ChatResponse, Tool, ToolCall};
use crate::persona::Persona;
use crate::tools::{ToolError, ToolRegistry};

/// Tuning for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Rounds of tool execution allowed per turn before giving up
    pub max_tool_rounds: usize,
    /// Upper bound on each model call; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            timeout: None,
        }
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed and accepting turns
    Ready,
    /// Torn down; every further turn fails with [`AgentError::SessionClosed`]
    Closed,
}

/// One tool call made while answering a turn
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: serde_json::Value,
    pub outcome: Result<String, ToolError>,
}

/// Result of a single turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Text to show the user
    pub output: String,
    /// Number of model calls made
    pub rounds: usize,
    /// Tool calls executed, in order
    pub tool_invocations: Vec<ToolInvocation>,
    /// Correlates the turn's log events
    pub trace_id: String,
}

/// Error type for session turns
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The model server went away after startup, or a call timed out
    #[error("model server unreachable: {0}")]
    ModelUnreachable(String),
    /// A tool failed and the model produced no answer despite it
    #[error("tool failure: {0}")]
    ToolFailure(#[from] ToolError),
    /// The model server answered without usable content
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("model was still requesting tools after {0} rounds")]
    ToolRoundsExceeded(usize),
    #[error("session is closed")]
    SessionClosed,
}

impl AgentError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::ModelUnreachable(_) => "model_unreachable",
            AgentError::ToolFailure(_) => "tool_failure",
            AgentError::MalformedResponse(_) => "malformed_response",
            AgentError::ToolRoundsExceeded(_) => "tool_rounds_exceeded",
            AgentError::SessionClosed => "session_closed",
        }
    }
}

impl From<ChatError> for AgentError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Request(ref inner) if inner.is_decode() => {
                AgentError::MalformedResponse(e.to_string())
            }
            ChatError::Request(_) | ChatError::Timeout(_) => AgentError::ModelUnreachable(e.to_string()),
            ChatError::Status { .. } | ChatError::Parse(_) | ChatError::EmptyResponse => {
                AgentError::MalformedResponse(e.to_string())
            }
        }
    }
}

/// A persona bound to a model backend and a tool registry
pub struct Session {
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    persona: Persona,
    options: SessionOptions,
    state: SessionState,
}

impl Session {
    /// Create a new session
    ///
    /// # Arguments
    /// * `client` - Shared model backend
    /// * `tools` - Shared, read-only tool registry
    /// * `persona` - Persona owned by this session for its whole lifetime
    /// * `options` - Tool-round limit and optional per-call timeout
    pub fn new(
        client: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        persona: Persona,
        options: SessionOptions,
    ) -> Self {
        Self {
            client,
            tools,
            persona,
            options,
            state: SessionState::Ready,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Tear the session down; later turns fail with [`AgentError::SessionClosed`]
    pub fn close(&mut self) {
        if self.state == SessionState::Ready {
            info!(persona = %self.persona.name(), "Session closed");
        }
        self.state = SessionState::Closed;
    }

    /// Answer `text`, returning only the output shown to the user
    pub async fn respond(&self, text: &str) -> Result<String, AgentError> {
        self.respond_turn(text).await.map(|report| report.output)
    }

    /// Answer `text`, returning the output together with what it took to produce
    pub async fn respond_turn(&self, text: &str) -> Result<TurnReport, AgentError> {
        if self.state == SessionState::Closed {
            return Err(AgentError::SessionClosed);
        }

        let trace_id = Uuid::now_v7().to_string();
        let turn_span = info_span!(
            "turn",
            trace_id = %trace_id,
            persona = %self.persona.name(),
            model = %self.persona.model(),
        );

        let result = self.run_turn(text, &trace_id).instrument(turn_span).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        AGENT_TURNS.with_label_values(&[outcome]).inc();
        result
    }

    async fn run_turn(&self, text: &str, trace_id: &str) -> Result<TurnReport, AgentError> {
        info!(input_len = text.len(), "Starting turn");

        let tools = self.tools.definitions();
        let known_tools = self.tools.names();
        let max_rounds = self.options.max_tool_rounds;

        let mut messages = vec![
            ChatMessage::system(self.persona.system_prompt()),
            ChatMessage::user(text),
        ];
        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut last_failure: Option<ToolError> = None;

        for round in 1..=max_rounds + 1 {
            let response = self.call_model(&messages, &tools, round).await?;
            let message = response.message;

            // Native tool_calls first, then calls written into the text
            let tool_calls = message
                .tool_calls
                .clone()
                .filter(|tc| !tc.is_empty())
                .unwrap_or_else(|| parse_tool_calls_from_text(&message.content, &known_tools));

            if tool_calls.is_empty() {
                let content = message.content.trim();
                if content.is_empty() {
                    return Err(match last_failure {
                        Some(e) => AgentError::ToolFailure(e),
                        None => AgentError::MalformedResponse("model returned no content".to_string()),
                    });
                }

                info!(rounds = round, tool_calls = invocations.len(), "Turn completed");
                return Ok(TurnReport {
                    output: self.render_output(content, &invocations),
                    rounds: round,
                    tool_invocations: invocations,
                    trace_id: trace_id.to_string(),
                });
            }

            if round > max_rounds {
                break;
            }

            messages.push(message);

            // Only the latest batch decides whether an empty answer is a tool failure
            last_failure = None;
            for call in tool_calls {
                let outcome = self.invoke_tool(&call).await;
                let tool_message = match &outcome {
                    Ok(output) => output.clone(),
                    Err(e) => {
                        last_failure = Some(e.clone());
                        format!("Error: {e}")
                    }
                };
                messages.push(ChatMessage::tool(tool_message));
                invocations.push(ToolInvocation {
                    name: call.function.name,
                    arguments: call.function.arguments,
                    outcome,
                });
            }
        }

        warn!(max_rounds, "Tool round limit reached");
        Err(AgentError::ToolRoundsExceeded(max_rounds))
    }

    async fn call_model(
        &self,
        messages: &[ChatMessage],
        tools: &[Tool],
        round: usize,
    ) -> Result<ChatResponse, AgentError> {
        let model = self.persona.model();
        let llm_span = info_span!("llm_call", round, model = %model);
        let started = Instant::now();

        let call = self.client.chat(messages, model, tools);
        let result = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .instrument(llm_span)
                .await
                .unwrap_or(Err(ChatError::Timeout(limit))),
            None => call.instrument(llm_span).await,
        };

        let elapsed = started.elapsed();
        LLM_CALL_TIME
            .with_label_values(&[model])
            .observe(elapsed.as_secs_f64());
        debug!(round, duration_ms = elapsed.as_secs_f64() * 1000.0, "LLM call completed");

        result.map_err(|e| {
            warn!(round, error = %e, "LLM call failed");
            AgentError::from(e)
        })
    }

    async fn invoke_tool(&self, call: &ToolCall) -> Result<String, ToolError> {
        let name = call.function.name.as_str();
        let tool_span = info_span!("tool_call", tool = %name);

        let result = match self.tools.get(name) {
            Some(tool) => tool.invoke(&call.function.arguments).instrument(tool_span).await,
            None => Err(ToolError::UnknownTool(name.to_string())),
        };

        match &result {
            Ok(output) => {
                info!(tool = %name, output_len = output.len(), "Tool call succeeded");
                TOOL_CALLS.with_label_values(&[name, "success"]).inc();
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                TOOL_CALLS.with_label_values(&[name, "error"]).inc();
            }
        }
        result
    }

    /// Final answer, prefixed with the tool calls when the persona echoes them
    fn render_output(&self, content: &str, invocations: &[ToolInvocation]) -> String {
        if !self.persona.show_tool_calls() || invocations.is_empty() {
            return content.to_string();
        }

        let mut output = String::from("Running:\n");
        for invocation in invocations {
            let _ = writeln!(
                output,
                " - {}({})",
                invocation.name,
                format_arguments(&invocation.arguments)
            );
        }
        output.push('\n');
        output.push_str(content);
        output
    }
}

/// `key=value` pairs for an arguments object; anything else as JSON
fn format_arguments(arguments: &serde_json::Value) -> String {
    match arguments {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            })
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_arguments() {
        assert_eq!(
            format_arguments(&serde_json::json!({"expression": "2+2"})),
            "expression=2+2"
        );
        assert_eq!(
            format_arguments(&serde_json::json!({"max_results": 3, "query": "takt"})),
            "max_results=3, query=takt"
        );
        assert_eq!(format_arguments(&serde_json::Value::Null), "");
        assert_eq!(format_arguments(&serde_json::json!("x")), "\"x\"");
    }

    #[test]
    fn test_chat_errors_map_to_agent_errors() {
        assert!(matches!(
            AgentError::from(ChatError::EmptyResponse),
            AgentError::MalformedResponse(_)
        ));
        assert!(matches!(
            AgentError::from(ChatError::Status {
                status: 404,
                message: "model not found".to_string()
            }),
            AgentError::MalformedResponse(_)
        ));
        assert!(matches!(
            AgentError::from(ChatError::Timeout(Duration::from_secs(1))),
            AgentError::ModelUnreachable(_)
        ));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AgentError::SessionClosed.kind(), "session_closed");
        assert_eq!(
            AgentError::ToolFailure(ToolError::UnknownTool("x".into())).kind(),
            "tool_failure"
        );
    }
}
