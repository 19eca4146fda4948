//! `exa_get_contents`: page contents for a set of URLs.

use crate::{opt_str, param, post_request, results_array, str_or_empty};
use flowai_core::{
    ParamKind, ParamVisibility, RawResponse, Tool, ToolError, ToolOutcome, ToolRequest, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const NOT_OK_MESSAGE: &str = "Failed to retrieve contents";
const ERROR_FALLBACK: &str = "An error occurred while retrieving contents";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentsResult {
    pub url: String,
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    urls: String,
    text: Option<bool>,
    summary_query: Option<String>,
    api_key: String,
}

pub struct GetContentsTool {
    spec: ToolSpec,
}

impl GetContentsTool {
    pub fn new() -> Self {
        let mut params = BTreeMap::new();
        params.insert(
            "urls".to_string(),
            param(
                ParamKind::String,
                true,
                ParamVisibility::UserOrLlm,
                "Comma-separated list of URLs to fetch contents for",
            ),
        );
        params.insert(
            "text".to_string(),
            param(
                ParamKind::Boolean,
                false,
                ParamVisibility::UserOrLlm,
                "Whether to include the full page text",
            ),
        );
        params.insert(
            "summaryQuery".to_string(),
            param(
                ParamKind::String,
                false,
                ParamVisibility::UserOrLlm,
                "Query to focus the generated page summaries on",
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
                id: "exa_get_contents".to_string(),
                name: "Exa Get Contents".to_string(),
                description: "Retrieve the contents of one or more webpages using Exa AI."
                    .to_string(),
                version: "1.0.0".to_string(),
                params,
            },
        }
    }
}

impl Default for GetContentsTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for GetContentsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn build_request(&self, params: &Value) -> Result<ToolRequest, ToolError> {
        let params: Params = serde_json::from_value(params.clone())
            .map_err(|e| ToolError::Validation(e.to_string()))?;

        let urls: Vec<String> = params
            .urls
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(ToString::to_string)
            .collect();
        if urls.is_empty() {
            return Err(ToolError::Validation(
                "'urls' must contain at least one URL".to_string(),
            ));
        }

        let mut body = Map::new();
        body.insert("urls".to_string(), json!(urls));
        if params.text.unwrap_or(false) {
            body.insert("text".to_string(), Value::Bool(true));
        }
        if let Some(query) = params.summary_query {
            body.insert("summary".to_string(), json!({ "query": query }));
        }

        post_request("/contents", &params.api_key, Value::Object(body))
    }

    fn transform_response(&self, response: RawResponse) -> Result<ToolOutcome, ToolError> {
        if !response.is_ok() {
            return Err(ToolError::Remote {
                message: response.error_message(NOT_OK_MESSAGE),
                status: Some(response.status),
            });
        }

        let results: Vec<ContentsResult> = results_array(&response.body)?
            .iter()
            .map(|result| ContentsResult {
                url: str_or_empty(result, "url"),
                title: str_or_empty(result, "title"),
                text: str_or_empty(result, "text"),
                summary: opt_str(result, "summary"),
            })
            .collect();

        Ok(ToolOutcome::new(json!({ "results": results })))
    }

    fn transform_error(&self, error: &ToolError) -> String {
        flowai_core::user_message(error).unwrap_or_else(|| ERROR_FALLBACK.to_string())
    }
}
