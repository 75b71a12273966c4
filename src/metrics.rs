//! Prometheus metrics for the agent
//!
//! Registered once in the default registry. Nothing scrapes them in an
//! interactive run; the shutdown path logs a summary via [`summary`].

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // ─────────────────────────────────────────────────────────────────────────────
    // Session Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Completed turns, by outcome.
    ///
    /// Labels:
    /// - outcome: "success" or the `AgentError` kind
    pub static ref AGENT_TURNS: CounterVec = register_counter_vec!(
        "kaizen_agent_turns_total",
        "Conversation turns handled by the session",
        &["outcome"]
    ).expect("failed to register AGENT_TURNS metric");

    /// Tool invocations requested by the model.
    ///
    /// Labels:
    /// - tool: registered tool name, or the unknown name the model asked for
    /// - status: "success" or "error"
    pub static ref TOOL_CALLS: CounterVec = register_counter_vec!(
        "kaizen_agent_tool_calls_total",
        "Tool invocations executed during turns",
        &["tool", "status"]
    ).expect("failed to register TOOL_CALLS metric");

    /// Wall time of each `/api/chat` round trip.
    pub static ref LLM_CALL_TIME: HistogramVec = register_histogram_vec!(
        "kaizen_agent_llm_call_seconds",
        "Latency of model chat calls",
        &["model"],
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    ).expect("failed to register LLM_CALL_TIME metric");

    // ─────────────────────────────────────────────────────────────────────────────
    // Startup Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Connectivity probe results: "reachable", "unreachable" or "error".
    pub static ref PROBE_RESULTS: CounterVec = register_counter_vec!(
        "kaizen_agent_probe_total",
        "Model server connectivity probes",
        &["result"]
    ).expect("failed to register PROBE_RESULTS metric");
}

/// Current value of the turn counter for `outcome`
pub fn turn_count(outcome: &str) -> f64 {
    AGENT_TURNS
        .get_metric_with_label_values(&[outcome])
        .map(|m| m.get())
        .unwrap_or(0.0)
}

/// Current value of the tool-call counter for `tool` and `status`
pub fn tool_call_count(tool: &str, status: &str) -> f64 {
    TOOL_CALLS
        .get_metric_with_label_values(&[tool, status])
        .map(|m| m.get())
        .unwrap_or(0.0)
}

/// One-line digest used in the shutdown log
pub fn summary() -> String {
    let turns = counter_total(&AGENT_TURNS);
    let failed = turns - turn_count("success");
    let tools = counter_total(&TOOL_CALLS);
    format!("turns={turns} failed={failed} tool_calls={tools}")
}

fn counter_total(counter: &CounterVec) -> f64 {
    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|metric| metric.get_counter().get_value())
        .sum()
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> String {
    let mut buffer = Vec::new();
    let families = prometheus::gather();
    if TextEncoder::new().encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
