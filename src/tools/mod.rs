//! Tools the model may call mid-response
//!
//! The registry is a fixed, name-unique set of [`ToolHandler`]s supplied at
//! session construction. It does no selection of its own: the model picks a
//! tool by name and the session looks it up here.

pub mod calculator;
pub mod web_search;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ollama::{Tool, ToolFunction};

pub use calculator::Calculator;
pub use web_search::{SearchResult, WebSearch};

/// What a tool touches when it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Talks to an external service
    Network,
    /// Pure local computation
    Compute,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Network => write!(f, "network"),
            Capability::Compute => write!(f, "compute"),
        }
    }
}

/// Name, signature and capability of a tool
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object
    pub parameters: serde_json::Value,
    pub capability: Capability,
}

impl ToolDescriptor {
    /// The `/api/chat` tool definition for this descriptor
    pub fn to_definition(&self) -> Tool {
        Tool {
            tool_type: "function".to_string(),
            function: ToolFunction {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: self.parameters.clone(),
            },
        }
    }
}

/// Error type for tool registration and execution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    /// The calculator could not evaluate its expression
    #[error("evaluation error: {0}")]
    Evaluation(String),
    /// A network-backed tool could not reach its service
    #[error("{tool} unavailable: {reason}")]
    Unavailable { tool: String, reason: String },
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}

/// A callable capability
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    /// Run the tool with the model-supplied arguments, returning text for the model
    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, ToolError>;
}

/// Name-unique set of tools, read-only once built
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; a second tool with the same name is rejected
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) -> Result<(), ToolError> {
        let name = tool.descriptor().name.clone();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, tool: Arc<dyn ToolHandler>) -> Result<Self, ToolError> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor())
    }

    /// Tool definitions in the shape `/api/chat` expects
    pub fn definitions(&self) -> Vec<Tool> {
        self.descriptors().map(ToolDescriptor::to_definition).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

/// Pull a required string argument out of a tool call
///
/// A bare string in place of the arguments object is accepted as the value.
pub(crate) fn string_arg<'a>(
    tool: &str,
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .or_else(|| arguments.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("missing string field `{key}`"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Calculator::new())).unwrap();
        let err = registry.register(Arc::new(Calculator::new())).unwrap_err();
        assert_eq!(err, ToolError::DuplicateTool("calculator".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_definitions_follow_descriptors() {
        let registry = ToolRegistry::new()
            .with(Arc::new(Calculator::new()))
            .unwrap()
            .with(Arc::new(WebSearch::new("http://127.0.0.1:9/", 3)))
            .unwrap();

        assert_eq!(registry.names(), vec!["calculator", "web_search"]);
        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert!(defs.iter().all(|d| d.tool_type == "function"));

        let caps: Vec<Capability> = registry.descriptors().map(|d| d.capability).collect();
        assert_eq!(caps, vec![Capability::Compute, Capability::Network]);
        assert_eq!(Capability::Network.to_string(), "network");
    }

    #[test]
    fn test_string_arg_forms() {
        let args = serde_json::json!({"expression": " 1+1 "});
        assert_eq!(string_arg("calculator", &args, "expression").unwrap(), "1+1");

        let bare = serde_json::json!("2*3");
        assert_eq!(string_arg("calculator", &bare, "expression").unwrap(), "2*3");

        let missing = serde_json::json!({"expr": "1"});
        assert!(matches!(
            string_arg("calculator", &missing, "expression"),
            Err(ToolError::InvalidArguments { .. })
        ));
    }
}
