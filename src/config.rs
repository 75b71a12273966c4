//! Runtime configuration, read once at startup
//!
//! Every setting has a default, so an empty environment gives a working
//! local setup against `http://localhost:11434`.

use std::time::Duration;

use tracing::warn;

use crate::agent::SessionOptions;
use crate::tools::web_search::DEFAULT_SEARCH_ENDPOINT;

/// Default model when `OLLAMA_MODEL` is unset
pub const DEFAULT_MODEL: &str = "llama2";

/// Default model server when `OLLAMA_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Configuration for the agent binaries
#[derive(Debug, Clone)]
pub struct Config {
    /// Model to use for Ollama (e.g., "llama3.2")
    pub model: String,
    /// Base URL of the model server, without a trailing slash
    pub base_url: String,
    /// Bound on the startup connectivity probe
    pub probe_timeout: Duration,
    /// Optional bound on each model call during a turn
    pub request_timeout: Option<Duration>,
    /// Rounds of tool execution allowed per turn
    pub max_tool_rounds: usize,
    /// Instant-answer endpoint for the web search tool
    pub search_endpoint: String,
    /// Per-request bound for the web search tool
    pub search_timeout: Duration,
    /// Most results the web search tool returns
    pub max_search_results: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            probe_timeout: Duration::from_secs(5),
            request_timeout: None,
            max_tool_rounds: 5,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            search_timeout: Duration::from_secs(10),
            max_search_results: 5,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    ///
    /// Empty values count as unset. Unparseable numbers keep the default and
    /// log a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let model = get("OLLAMA_MODEL").unwrap_or(defaults.model);
        let base_url = get("OLLAMA_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let request_timeout = get("KAIZEN_REQUEST_TIMEOUT_SECS")
            .and_then(|raw| parse_number::<u64>("KAIZEN_REQUEST_TIMEOUT_SECS", &raw))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let max_tool_rounds = get("KAIZEN_MAX_TOOL_ROUNDS")
            .and_then(|raw| parse_number("KAIZEN_MAX_TOOL_ROUNDS", &raw))
            .unwrap_or(defaults.max_tool_rounds);

        let search_endpoint = get("KAIZEN_SEARCH_URL").unwrap_or(defaults.search_endpoint);

        let max_search_results = get("KAIZEN_MAX_SEARCH_RESULTS")
            .and_then(|raw| parse_number("KAIZEN_MAX_SEARCH_RESULTS", &raw))
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_search_results);

        let log_format = match get("KAIZEN_LOG_FORMAT").as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            model,
            base_url,
            request_timeout,
            max_tool_rounds,
            search_endpoint,
            max_search_results,
            log_format,
            probe_timeout: defaults.probe_timeout,
            search_timeout: defaults.search_timeout,
        }
    }

    /// Session options derived from this configuration
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            max_tool_rounds: self.max_tool_rounds,
            timeout: self.request_timeout,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw, "Ignoring unparseable setting");
            None
        }
    }
}
