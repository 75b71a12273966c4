//! Shared fixtures: scripted model backends, a counting responder and
//! throwaway HTTP servers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use kaizen_agent::agent::{AgentError, ModelClient};
use kaizen_agent::ollama::{ChatError, ChatMessage, ChatResponse, Tool, ToolCall};
use kaizen_agent::repl::Responder;

/// Replays a fixed list of responses and records every request
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ChatResponse, ChatError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<ChatResponse, ChatError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _model: &str,
        _tools: &[Tool],
    ) -> Result<ChatResponse, ChatError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ChatError::EmptyResponse))
    }
}

/// Sends the user's text to the calculator, then reports the tool result
#[derive(Default)]
pub struct ArithmeticModel {
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    tool_counts: Mutex<Vec<usize>>,
}

impl ArithmeticModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// System message content of every request, in order
    pub fn system_prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|messages| {
                messages
                    .iter()
                    .find(|m| m.role == "system")
                    .map(|m| m.content.clone())
            })
            .collect()
    }

    /// Number of tool definitions offered on each request
    pub fn offered_tools(&self) -> Vec<usize> {
        self.tool_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ArithmeticModel {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _model: &str,
        tools: &[Tool],
    ) -> Result<ChatResponse, ChatError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.tool_counts.lock().unwrap().push(tools.len());

        let last = messages.last().ok_or(ChatError::EmptyResponse)?;
        if last.role == "tool" {
            return Ok(ChatResponse::text(format!("The result is {}.", last.content)));
        }
        let expression = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(ChatResponse::tool_calls(vec![ToolCall::new(
            "calculator",
            serde_json::json!({ "expression": expression }),
        )]))
    }
}

/// Never answers within any reasonable time
pub struct StalledModel;

#[async_trait]
impl ModelClient for StalledModel {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _tools: &[Tool],
    ) -> Result<ChatResponse, ChatError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ChatResponse::text("too late"))
    }
}

/// Responder that replays results and counts calls
pub struct CountingResponder {
    calls: AtomicUsize,
    replies: Mutex<VecDeque<Result<String, AgentError>>>,
    stall: bool,
}

impl CountingResponder {
    pub fn new(replies: Vec<Result<String, AgentError>>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            replies: Mutex::new(replies.into()),
            stall: false,
        }
    }

    /// A responder whose answers never arrive
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Responder for CountingResponder {
    async fn respond(&self, text: &str) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall {
            std::future::pending::<()>().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("echo: {text}")))
    }
}

/// Serve every request with `status` and `body`; returns the base URL and the raw requests
pub async fn spawn_http_stub(status: u16, body: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                if let Ok(request) = read_request(&mut socket).await {
                    seen.lock().unwrap().push(request);
                }
                let response = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), requests)
}

/// Accept connections but never answer them
pub async fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// A URL nothing listens on
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
