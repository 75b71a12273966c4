//! Agent module: persona-driven conversational sessions
//!
//! A [`Session`] binds a model backend, the tool registry and a persona, and
//! runs one turn at a time:
//!
//! ```text
//! User text → Session → model /api/chat (persona prompt + tools)
//!                  ↓
//!           Tool call? → ToolRegistry lookup → invoke
//!                  ↓
//!           Feed result back to the model → loop or answer
//! ```

pub mod model;
pub mod session;

pub use model::ModelClient;
pub use session::{
    AgentError, Session, SessionOptions, SessionState, ToolInvocation, TurnReport,
};
