//! Core domain types and the tool descriptor contract for flowai-rs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Immutable identity and parameter schema of one external capability.
///
/// A descriptor is constructed once at startup and looked up by `id` for
/// the rest of the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub params: BTreeMap<String, ParamSpec>,
}

impl ToolSpec {
    /// Parameters a model is allowed to see or fill in.
    pub fn llm_params(&self) -> impl Iterator<Item = (&str, &ParamSpec)> + '_ {
        self.params
            .iter()
            .filter(|(_, spec)| {
                matches!(
                    spec.visibility,
                    ParamVisibility::UserOrLlm | ParamVisibility::LlmOnly
                )
            })
            .map(|(name, spec)| (name.as_str(), spec))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: ParamKind,
    pub required: bool,
    pub visibility: ParamVisibility,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamVisibility {
    UserOnly,
    UserOrLlm,
    LlmOnly,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Fully built outbound request, produced by a descriptor's request
/// builder from validated parameters. Pure data; no transport types.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub url: Url,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// HTTP response normalized for response transformers: the status code
/// and the payload parsed as JSON (`Value::Null` when the body was not
/// JSON).
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort human-readable message from a remote error payload.
    ///
    /// Prefers a non-empty `message` field, then a non-empty `error`
    /// field, then the supplied fallback.
    pub fn error_message(&self, fallback: &str) -> String {
        for key in ["message", "error"] {
            if let Some(text) = self.body.get(key).and_then(Value::as_str) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
        fallback.to_string()
    }
}

/// Normalized success record produced by a response transformer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub output: Value,
}

impl ToolOutcome {
    pub fn new(output: Value) -> Self {
        Self {
            success: true,
            output,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{message}")]
    Remote {
        message: String,
        status: Option<u16>,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred while executing the tool";

/// Message that is safe to show an end user, when the error carries one.
pub fn user_message(error: &ToolError) -> Option<String> {
    match error {
        ToolError::Remote { message, .. } => Some(message.clone()),
        ToolError::Validation(message) => Some(message.clone()),
        _ => None,
    }
}

/// Declaration of one external HTTP capability: how validated input
/// becomes a request, and how a response becomes a normalized result or
/// a normalized error.
pub trait Tool: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    /// Builds the outbound request. Deterministic given `params`, which
    /// must already have passed [`validate_params`]. Optional fields the
    /// caller did not supply are omitted from the body entirely; the
    /// remote treats absence differently from an explicit default.
    fn build_request(&self, params: &Value) -> Result<ToolRequest, ToolError>;

    /// Normalizes a 2xx payload into a [`ToolOutcome`], or fails with
    /// [`ToolError::Remote`] carrying the remote's own message when one
    /// is present.
    fn transform_response(&self, response: RawResponse) -> Result<ToolOutcome, ToolError>;

    /// Last-resort normalizer: total over every error value, never
    /// fails, always yields a printable message.
    fn transform_error(&self, error: &ToolError) -> String {
        user_message(error).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
    }
}

/// Checks `params` against a descriptor's schema: every required
/// parameter present and non-null, every present parameter of its
/// declared type, no unknown names.
pub fn validate_params(spec: &ToolSpec, params: &Value) -> Result<(), ToolError> {
    let supplied = params.as_object().ok_or_else(|| {
        ToolError::Validation("tool parameters must be a JSON object".to_string())
    })?;

    for (name, param) in &spec.params {
        match supplied.get(name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(ToolError::Validation(format!(
                        "missing required parameter '{name}'"
                    )));
                }
            }
            Some(value) => {
                if !matches_kind(value, param.kind) {
                    return Err(ToolError::Validation(format!(
                        "parameter '{name}' must be of type {}",
                        param.kind.as_str()
                    )));
                }
            }
        }
    }

    for name in supplied.keys() {
        if !spec.params.contains_key(name) {
            return Err(ToolError::Validation(format!("unknown parameter '{name}'")));
        }
    }

    Ok(())
}

fn matches_kind(value: &Value, kind: ParamKind) -> bool {
    match kind {
        ParamKind::String => value.is_string(),
        ParamKind::Number => value.is_number(),
        ParamKind::Boolean => value.is_boolean(),
        ParamKind::Object => value.is_object(),
        ParamKind::Array => value.is_array(),
    }
}
