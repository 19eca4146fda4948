//! `exa_search`: neural and keyword web search.

use crate::{opt_str, param, post_request, results_array, score_or_zero, str_or_empty};
use flowai_core::{
    ParamKind, ParamVisibility, RawResponse, Tool, ToolError, ToolOutcome, ToolRequest, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const NOT_OK_MESSAGE: &str = "Failed to execute search";
const ERROR_FALLBACK: &str = "An error occurred while executing the search";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub text: String,
    pub score: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    query: String,
    num_results: Option<u32>,
    #[serde(rename = "type")]
    search_type: Option<String>,
    use_autoprompt: Option<bool>,
    text: Option<bool>,
    api_key: String,
}

pub struct SearchTool {
    spec: ToolSpec,
}

impl SearchTool {
    pub fn new() -> Self {
        let mut params = BTreeMap::new();
        params.insert(
            "query".to_string(),
            param(
                ParamKind::String,
                true,
                ParamVisibility::UserOrLlm,
                "The search query to execute",
            ),
        );
        params.insert(
            "numResults".to_string(),
            param(
                ParamKind::Number,
                false,
                ParamVisibility::UserOnly,
                "Number of results to return (default: 10, max: 25)",
            ),
        );
        params.insert(
            "type".to_string(),
            param(
                ParamKind::String,
                false,
                ParamVisibility::UserOnly,
                "Search mode: auto, neural, keyword, or magic",
            ),
        );
        params.insert(
            "useAutoprompt".to_string(),
            param(
                ParamKind::Boolean,
                false,
                ParamVisibility::UserOnly,
                "Whether to rewrite the query for better results",
            ),
        );
        params.insert(
            "text".to_string(),
            param(
                ParamKind::Boolean,
                false,
                ParamVisibility::UserOrLlm,
                "Whether to include the full text of each result",
            ),
        );
        params.insert(
            "apiKey".to_string(),
            param(
                ParamKind::String,
                true,
                ParamVisibility::UserOnly,
                "Exa AI API key",
            ),
        );
        Self {
            spec: ToolSpec {
                id: "exa_search".to_string(),
                name: "Exa Search".to_string(),
                description: "Search the web using Exa AI. Returns ranked results with titles, \
                              snippets, and relevance scores."
                    .to_string(),
                version: "1.0.0".to_string(),
                params,
            },
        }
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn build_request(&self, params: &Value) -> Result<ToolRequest, ToolError> {
        let params: Params = serde_json::from_value(params.clone())
            .map_err(|e| ToolError::Validation(e.to_string()))?;

        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(params.query));
        if let Some(num_results) = params.num_results {
            body.insert("numResults".to_string(), json!(num_results));
        }
        if let Some(search_type) = params.search_type {
            body.insert("type".to_string(), Value::String(search_type));
        }
        if let Some(use_autoprompt) = params.use_autoprompt {
            body.insert("useAutoprompt".to_string(), Value::Bool(use_autoprompt));
        }
        if params.text.unwrap_or(false) {
            body.insert("contents".to_string(), json!({ "text": true }));
        }

        post_request("/search", &params.api_key, Value::Object(body))
    }

    fn transform_response(&self, response: RawResponse) -> Result<ToolOutcome, ToolError> {
        if !response.is_ok() {
            return Err(ToolError::Remote {
                message: response.error_message(NOT_OK_MESSAGE),
                status: Some(response.status),
            });
        }

        let results: Vec<SearchResult> = results_array(&response.body)?
            .iter()
            .map(|result| SearchResult {
                title: str_or_empty(result, "title"),
                url: str_or_empty(result, "url"),
                published_date: opt_str(result, "publishedDate"),
                author: opt_str(result, "author"),
                summary: opt_str(result, "summary"),
                favicon: opt_str(result, "favicon"),
                image: opt_str(result, "image"),
                text: str_or_empty(result, "text"),
                score: score_or_zero(result),
            })
            .collect();

        Ok(ToolOutcome::new(json!({ "results": results })))
    }

    fn transform_error(&self, error: &ToolError) -> String {
        flowai_core::user_message(error).unwrap_or_else(|| ERROR_FALLBACK.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> SearchTool {
        SearchTool::new()
    }

    #[test]
    fn body_carries_only_supplied_fields() {
        let request = tool()
            .build_request(&json!({ "query": "rust sdk", "apiKey": "k" }))
            .unwrap();
        assert_eq!(request.body.unwrap(), json!({ "query": "rust sdk" }));

        let request = tool()
            .build_request(&json!({
                "query": "rust sdk",
                "numResults": 3,
                "type": "neural",
                "useAutoprompt": false,
                "text": true,
                "apiKey": "k",
            }))
            .unwrap();
        assert_eq!(
            request.body.unwrap(),
            json!({
                "query": "rust sdk",
                "numResults": 3,
                "type": "neural",
                "useAutoprompt": false,
                "contents": { "text": true },
            })
        );
    }

    #[test]
    fn response_preserves_optional_metadata() {
        let response = RawResponse {
            status: 200,
            body: json!({
                "results": [{
                    "title": "Rust",
                    "url": "https://rust-lang.org",
                    "publishedDate": "2024-01-01",
                    "author": "core team",
                    "text": "a language",
                    "score": 0.7,
                }]
            }),
        };
        let outcome = tool().transform_response(response).unwrap();
        assert_eq!(
            outcome.output,
            json!({
                "results": [{
                    "title": "Rust",
                    "url": "https://rust-lang.org",
                    "publishedDate": "2024-01-01",
                    "author": "core team",
                    "text": "a language",
                    "score": 0.7,
                }]
            })
        );
    }

    #[test]
    fn sparse_result_gets_defaults_and_no_phantom_fields() {
        let response = RawResponse {
            status: 200,
            body: json!({ "results": [{ "url": "https://a.example" }] }),
        };
        let outcome = tool().transform_response(response).unwrap();
        assert_eq!(
            outcome.output,
            json!({
                "results": [{ "title": "", "url": "https://a.example", "text": "", "score": 0.0 }]
            })
        );
    }

    #[test]
    fn non_ok_uses_message_chain() {
        let response = RawResponse {
            status: 401,
            body: json!({ "error": "invalid api key" }),
        };
        let err = tool().transform_response(response).unwrap_err();
        assert!(matches!(err, ToolError::Remote { message, .. } if message == "invalid api key"));
    }
}
