//! Web search through a DuckDuckGo-compatible instant-answer endpoint

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{string_arg, Capability, ToolDescriptor, ToolError, ToolHandler};

const TOOL_NAME: &str = "web_search";

/// Default public endpoint
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";

/// One search hit as handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a leaf topic or a named group of topics
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    #[serde(default)]
    topics: Vec<RelatedTopic>,
}

/// The `web_search` tool
pub struct WebSearch {
    descriptor: ToolDescriptor,
    endpoint: String,
    max_results: usize,
    client: reqwest::Client,
}

impl WebSearch {
    /// Create a search tool against `endpoint` returning at most `max_results` hits
    pub fn new(endpoint: impl Into<String>, max_results: usize) -> Self {
        Self::with_client(endpoint, max_results, reqwest::Client::new())
    }

    /// Like [`new`](Self::new) with a per-request timeout
    pub fn with_timeout(endpoint: impl Into<String>, max_results: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(endpoint, max_results, client)
    }

    fn with_client(endpoint: impl Into<String>, max_results: usize, client: reqwest::Client) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: TOOL_NAME.to_string(),
                description: "Search the web for current industry benchmarks, best practices or \
                              methodology references. Returns a short list of results with title, \
                              url and snippet."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        },
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of results to return"
                        }
                    },
                    "required": ["query"]
                }),
                capability: Capability::Network,
            },
            endpoint: endpoint.into(),
            max_results: max_results.max(1),
            client,
        }
    }

    /// Run a query and return at most `limit` results
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ToolError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("search endpoint returned {status}")));
        }

        let answer: InstantAnswer = response.json().await.map_err(unavailable)?;
        Ok(collect_results(answer, limit))
    }
}

#[async_trait]
impl ToolHandler for WebSearch {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let query = string_arg(TOOL_NAME, arguments, "query")?;
        // The model may ask for fewer results, never more than configured
        let limit = arguments
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|n| (n as usize).clamp(1, self.max_results))
            .unwrap_or(self.max_results);

        let results = self.search(query, limit).await?;
        if results.is_empty() {
            return Ok(format!("No results found for \"{query}\"."));
        }
        serde_json::to_string_pretty(&results).map_err(unavailable)
    }
}

fn unavailable(reason: impl ToString) -> ToolError {
    ToolError::Unavailable {
        tool: TOOL_NAME.to_string(),
        reason: reason.to_string(),
    }
}

/// Flatten the abstract and related topics into at most `limit` results
fn collect_results(answer: InstantAnswer, limit: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() {
        results.push(SearchResult {
            title: answer.heading.clone(),
            url: answer.abstract_url.clone(),
            snippet: answer.abstract_text.clone(),
        });
    }

    let mut pending: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();
    while let Some(topic) = pending.pop() {
        if results.len() >= limit {
            break;
        }
        if !topic.topics.is_empty() {
            pending.extend(topic.topics.into_iter().rev());
            continue;
        }
        if topic.text.is_empty() {
            continue;
        }
        // DuckDuckGo puts the title before " - " in the topic text
        let title = topic
            .text
            .split_once(" - ")
            .map(|(head, _)| head.to_string())
            .unwrap_or_else(|| topic.text.clone());
        results.push(SearchResult {
            title,
            url: topic.first_url,
            snippet: topic.text,
        });
    }

    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InstantAnswer {
        serde_json::from_value(serde_json::json!({
            "Heading": "Six Sigma",
            "AbstractText": "Six Sigma is a set of techniques for process improvement.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Six_Sigma",
            "RelatedTopics": [
                {"Text": "DMAIC - A data-driven improvement cycle.", "FirstURL": "https://duckduckgo.com/DMAIC"},
                {"Name": "Tools", "Topics": [
                    {"Text": "Kaizen - Continuous improvement.", "FirstURL": "https://duckduckgo.com/Kaizen"},
                    {"Text": "Kanban - Scheduling system.", "FirstURL": "https://duckduckgo.com/Kanban"}
                ]},
                {"Text": "Lean manufacturing", "FirstURL": "https://duckduckgo.com/Lean"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_collect_results_flattens_groups_in_order() {
        let results = collect_results(sample(), 10);
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Six Sigma", "DMAIC", "Kaizen", "Kanban", "Lean manufacturing"]
        );
        assert_eq!(results[1].url, "https://duckduckgo.com/DMAIC");
    }

    #[test]
    fn test_collect_results_is_bounded() {
        assert_eq!(collect_results(sample(), 2).len(), 2);
        assert!(collect_results(InstantAnswer::default(), 5).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) is closed on test machines
        let search = WebSearch::with_timeout("http://127.0.0.1:9/", 3, Duration::from_secs(2));
        let err = search
            .invoke(&serde_json::json!({"query": "takt time"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Unavailable { .. }));
    }
}
