//! Kaizen Agent - persona-driven Lean Six Sigma assistant on a local Ollama server
//!
//! This library wires an Ollama model to a consultant persona and a small
//! tool set, and exposes it through a line-based interactive loop.
//!
//! # Modules
//!
//! - `probe` - Startup connectivity check against the model server
//! - `tools` - Tool registry with the calculator and web search tools
//! - `persona` - Persona configuration and the built-in presets
//! - `agent` - Sessions that run one conversational turn at a time
//! - `repl` - Interactive loop and meta-command dispatcher
//! - `app` - Startup sequence shared by the binaries
//! - `ollama` - Ollama chat client and wire types
//! - `config`, `metrics`, `tracing` - Configuration and observability
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use kaizen_agent::{app, persona::presets, Config, OllamaClient, Session};
//!
//! let config = Config::from_env();
//! let tools = Arc::new(app::default_tools(&config)?);
//! let session = Session::new(
//!     Arc::new(OllamaClient::new(config.base_url.clone())),
//!     tools,
//!     presets::specialist(config.model.clone()),
//!     config.session_options(),
//! );
//! let answer = session.respond("How do I reduce changeover time?").await?;
//! ```

pub mod agent;
pub mod app;
pub mod config;
pub mod metrics;
pub mod ollama;
pub mod persona;
pub mod probe;
pub mod repl;
pub mod tools;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use agent::{AgentError, ModelClient, Session, SessionOptions};
pub use config::Config;
pub use ollama::OllamaClient;
pub use persona::Persona;
pub use tools::{ToolDescriptor, ToolError, ToolRegistry};
