use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::register_toolbelt;

const TAVILY_API_BASE: &str = "https://api.tavily.com";

pub struct WebSearch {
    api_key: String,
    client: reqwest::Client,
}

impl Default for WebSearch {
    fn default() -> Self {
        Self {
            api_key: std::env::var("TAVILY_API_KEY")
                .expect("TAVILY_API_KEY environment variable not set"),
            client: reqwest::Client::builder()
                .user_agent("Rill/0.1")
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

register_toolbelt! {
    WebSearch {
        description: "Search the web using the Tavily search API",
        tools: {
            "search" => search {
                description: "Search the web for information. Returns a JSON list of results with titles, URLs, and content snippets. Use for general queries, news, or anything time-sensitive.",
                params: [
                    "query": "string" => "Search query",
                    "max_results": "integer" => "Maximum number of results to return (default: 4, max: 10)"
                ]
            }
        }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Serialize, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl WebSearch {
    async fn search(&self, args: &serde_json::Value) -> Result<String> {
        let query = args["query"].as_str().unwrap_or("");
        if query.is_empty() {
            return Ok("Error: query cannot be empty".to_string());
        }

        let max_results = args["max_results"].as_i64().unwrap_or(4).clamp(1, 10) as usize;

        self.search_web(query, max_results).await
    }

    async fn search_web(&self, query: &str, max_results: usize) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/search", TAVILY_API_BASE))
            .json(&SearchRequest {
                api_key: &self.api_key,
                query,
                max_results,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(format!("Search failed: {}", response.status()));
        }

        let data: SearchResponse = response.json().await?;

        if data.results.is_empty() {
            return Ok("No results found.".to_string());
        }

        // The model gets the result list as-is, serialized back to JSON.
        Ok(serde_json::to_string(&data.results)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_belt() -> WebSearch {
        WebSearch {
            api_key: "test-key".to_string(),
            client: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_a_request() {
        let belt = test_belt();
        let result = belt.search(&serde_json::json!({})).await.unwrap();
        assert_eq!(result, "Error: query cannot be empty");
    }

    #[test]
    fn search_is_the_only_entry() {
        assert_eq!(TOOL_ENTRIES.len(), 1);
        assert_eq!(TOOL_ENTRIES[0].0, "WebSearch::search");
    }

    #[test]
    fn result_list_serializes_compact() {
        let results = vec![SearchResult {
            title: "Paris weather".to_string(),
            url: "https://example.com".to_string(),
            content: "Sunny, 24C".to_string(),
        }];
        let json = serde_json::to_string(&results).unwrap();
        assert_eq!(
            json,
            r#"[{"title":"Paris weather","url":"https://example.com","content":"Sunny, 24C"}]"#
        );
    }
}
