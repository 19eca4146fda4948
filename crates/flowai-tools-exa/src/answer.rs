//! `exa_answer`: a direct answer with source citations.

use crate::{param, post_request, str_or_empty};
use flowai_core::{
    ParamKind, ParamVisibility, RawResponse, Tool, ToolError, ToolOutcome, ToolRequest, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const NOT_OK_MESSAGE: &str = "Failed to generate answer";
const ERROR_FALLBACK: &str = "An error occurred while generating the answer";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCitation {
    pub title: String,
    pub url: String,
    pub text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    query: String,
    text: Option<bool>,
    api_key: String,
}

pub struct AnswerTool {
    spec: ToolSpec,
}

impl AnswerTool {
    pub fn new() -> Self {
        let mut params = BTreeMap::new();
        params.insert(
            "query".to_string(),
            param(
                ParamKind::String,
                true,
                ParamVisibility::UserOrLlm,
                "The question to answer",
            ),
        );
        params.insert(
            "text".to_string(),
            param(
                ParamKind::Boolean,
                false,
                ParamVisibility::UserOrLlm,
                "Whether to include the full text of cited pages",
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
                id: "exa_answer".to_string(),
                name: "Exa Answer".to_string(),
                description: "Answer a question using Exa AI, citing the webpages the answer \
                              was drawn from."
                    .to_string(),
                version: "1.0.0".to_string(),
                params,
            },
        }
    }
}

impl Default for AnswerTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for AnswerTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn build_request(&self, params: &Value) -> Result<ToolRequest, ToolError> {
        let params: Params = serde_json::from_value(params.clone())
            .map_err(|e| ToolError::Validation(e.to_string()))?;

        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(params.query));
        if params.text.unwrap_or(false) {
            body.insert("text".to_string(), Value::Bool(true));
        }

        post_request("/answer", &params.api_key, Value::Object(body))
    }

    fn transform_response(&self, response: RawResponse) -> Result<ToolOutcome, ToolError> {
        if !response.is_ok() {
            return Err(ToolError::Remote {
                message: response.error_message(NOT_OK_MESSAGE),
                status: Some(response.status),
            });
        }

        let answer = response
            .body
            .get("answer")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::InvalidResponse("response is missing 'answer'".to_string())
            })?
            .to_string();

        let citations: Vec<AnswerCitation> = response
            .body
            .get("citations")
            .and_then(Value::as_array)
            .map(|citations| {
                citations
                    .iter()
                    .map(|citation| AnswerCitation {
                        title: str_or_empty(citation, "title"),
                        url: str_or_empty(citation, "url"),
                        text: str_or_empty(citation, "text"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ToolOutcome::new(json!({
            "answer": answer,
            "citations": citations,
        })))
    }

    fn transform_error(&self, error: &ToolError) -> String {
        flowai_core::user_message(error).unwrap_or_else(|| ERROR_FALLBACK.to_string())
    }
}
