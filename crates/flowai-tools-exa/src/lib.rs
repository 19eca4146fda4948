//! Exa AI tool descriptors for flowai-rs.
//!
//! Each descriptor declares one Exa endpoint: its parameter schema, how
//! validated parameters become a `POST` request, and how the response is
//! normalized. Credentials travel in the `x-api-key` header and never in
//! a request body.

mod answer;
mod contents;
mod find_similar;
mod search;

pub use answer::{AnswerCitation, AnswerTool};
pub use contents::{ContentsResult, GetContentsTool};
pub use find_similar::{FindSimilarLinksTool, SimilarLink};
pub use search::{SearchResult, SearchTool};

use flowai_core::{HttpMethod, ParamKind, ParamSpec, ParamVisibility, ToolError, ToolRequest};
use flowai_tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub const EXA_BASE_URL: &str = "https://api.exa.ai";

/// Registers every Exa descriptor.
pub fn install(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(Arc::new(FindSimilarLinksTool::new()))?;
    registry.register(Arc::new(SearchTool::new()))?;
    registry.register(Arc::new(GetContentsTool::new()))?;
    registry.register(Arc::new(AnswerTool::new()))?;
    Ok(())
}

pub(crate) fn param(
    kind: ParamKind,
    required: bool,
    visibility: ParamVisibility,
    description: &str,
) -> ParamSpec {
    ParamSpec {
        kind,
        required,
        visibility,
        description: description.to_string(),
    }
}

pub(crate) fn post_request(path: &str, api_key: &str, body: Value) -> Result<ToolRequest, ToolError> {
    let url = Url::parse(EXA_BASE_URL)
        .and_then(|base| base.join(path))
        .map_err(|e| ToolError::Internal(format!("failed to construct endpoint url: {e}")))?;
    Ok(ToolRequest {
        url,
        method: HttpMethod::Post,
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("x-api-key".to_string(), api_key.to_string()),
        ],
        body: Some(body),
    })
}

pub(crate) fn str_or_empty(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn opt_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

pub(crate) fn score_or_zero(value: &Value) -> f64 {
    value.get("score").and_then(Value::as_f64).unwrap_or(0.0)
}

/// The `results` array every Exa list endpoint responds with.
pub(crate) fn results_array(body: &Value) -> Result<&Vec<Value>, ToolError> {
    body.get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| ToolError::InvalidResponse("response is missing 'results' array".to_string()))
}
