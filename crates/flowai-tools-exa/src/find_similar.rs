//! `exa_find_similar_links`: webpages similar to a given URL.

use crate::{param, post_request, results_array, score_or_zero, str_or_empty};
use flowai_core::{
    ParamKind, ParamVisibility, RawResponse, Tool, ToolError, ToolOutcome, ToolRequest, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const NOT_OK_MESSAGE: &str = "Failed to find similar links";
const ERROR_FALLBACK: &str = "An error occurred while finding similar links";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarLink {
    pub title: String,
    pub url: String,
    pub text: String,
    pub score: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    url: String,
    num_results: Option<u32>,
    text: Option<bool>,
    api_key: String,
}

pub struct FindSimilarLinksTool {
    spec: ToolSpec,
}

impl FindSimilarLinksTool {
    pub fn new() -> Self {
        let mut params = BTreeMap::new();
        params.insert(
            "url".to_string(),
            param(
                ParamKind::String,
                true,
                ParamVisibility::UserOrLlm,
                "The URL to find similar links for",
            ),
        );
        params.insert(
            "numResults".to_string(),
            param(
                ParamKind::Number,
                false,
                ParamVisibility::UserOnly,
                "Number of similar links to return (default: 10, max: 25)",
            ),
        );
        params.insert(
            "text".to_string(),
            param(
                ParamKind::Boolean,
                false,
                ParamVisibility::UserOrLlm,
                "Whether to include the full text of the similar pages",
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
                id: "exa_find_similar_links".to_string(),
                name: "Exa Find Similar Links".to_string(),
                description: "Find webpages similar to a given URL using Exa AI. Returns a list \
                              of similar links with titles and text snippets."
                    .to_string(),
                version: "1.0.0".to_string(),
                params,
            },
        }
    }
}

impl Default for FindSimilarLinksTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for FindSimilarLinksTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn build_request(&self, params: &Value) -> Result<ToolRequest, ToolError> {
        let params: Params = serde_json::from_value(params.clone())
            .map_err(|e| ToolError::Validation(e.to_string()))?;

        let mut body = Map::new();
        body.insert("url".to_string(), Value::String(params.url));
        if let Some(num_results) = params.num_results {
            body.insert("numResults".to_string(), json!(num_results));
        }
        if params.text.unwrap_or(false) {
            body.insert("contents".to_string(), json!({ "text": true }));
        }

        post_request("/findSimilar", &params.api_key, Value::Object(body))
    }

    fn transform_response(&self, response: RawResponse) -> Result<ToolOutcome, ToolError> {
        if !response.is_ok() {
            return Err(ToolError::Remote {
                message: response.error_message(NOT_OK_MESSAGE),
                status: Some(response.status),
            });
        }

        let links: Vec<SimilarLink> = results_array(&response.body)?
            .iter()
            .map(|result| SimilarLink {
                title: str_or_empty(result, "title"),
                url: str_or_empty(result, "url"),
                text: str_or_empty(result, "text"),
                score: score_or_zero(result),
            })
            .collect();

        Ok(ToolOutcome::new(json!({ "similarLinks": links })))
    }

    fn transform_error(&self, error: &ToolError) -> String {
        flowai_core::user_message(error).unwrap_or_else(|| ERROR_FALLBACK.to_string())
    }
}
