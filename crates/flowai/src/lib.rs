//! High-level flowai SDK: registry-backed tool execution over HTTP.

use async_trait::async_trait;
use flowai_core::{
    validate_params, HttpMethod, RawResponse, Tool, ToolError, ToolOutcome, ToolRequest,
};
use flowai_tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub use flowai_core;
pub use flowai_tools;
#[cfg(feature = "exa")]
pub use flowai_tools_exa;

/// Transport seam between descriptors and the network. Descriptors stay
/// pure; everything that touches a socket lives behind this trait.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: ToolRequest) -> Result<RawResponse, ToolError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ToolError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ToolRequest) -> Result<RawResponse, ToolError> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ToolError::Transport(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        // A non-JSON body still carries a meaningful status; the
        // transformers fall back to their fixed messages on Null.
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(RawResponse { status, body })
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Executes registered tool descriptors: validate, build, send once,
/// normalize.
pub struct Client {
    registry: ToolRegistry,
    transport: Arc<dyn HttpTransport>,
}

impl Client {
    pub fn new(registry: ToolRegistry) -> Result<Self, ToolError> {
        Ok(Self {
            registry,
            transport: Arc::new(ReqwestTransport::new()?),
        })
    }

    pub fn with_transport(registry: ToolRegistry, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn run(&self, tool_id: &str, params: &Value) -> Result<ToolOutcome, ToolError> {
        let tool = self.registry.get(tool_id)?;
        self.run_tool(tool.as_ref(), params).await
    }

    /// Like [`Client::run`], but every failure is normalized through the
    /// descriptor's `transform_error` into a user-facing message.
    pub async fn run_to_message(
        &self,
        tool_id: &str,
        params: &Value,
    ) -> Result<ToolOutcome, String> {
        let tool = match self.registry.get(tool_id) {
            Ok(tool) => tool,
            Err(error) => return Err(error.to_string()),
        };
        self.run_tool(tool.as_ref(), params)
            .await
            .map_err(|error| tool.transform_error(&error))
    }

    async fn run_tool(&self, tool: &dyn Tool, params: &Value) -> Result<ToolOutcome, ToolError> {
        validate_params(tool.spec(), params)?;
        let request = tool.build_request(params)?;

        let invocation = Uuid::new_v4();
        tracing::debug!(
            tool = %tool.spec().id,
            %invocation,
            method = request.method.as_str(),
            url = %request.url,
            "dispatching tool request"
        );

        let response = self.transport.execute(request).await?;
        if !response.is_ok() {
            tracing::warn!(
                tool = %tool.spec().id,
                %invocation,
                status = response.status,
                "tool request returned an error status"
            );
        }
        tool.transform_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowai_core::{ParamKind, ParamSpec, ParamVisibility, ToolSpec};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use url::Url;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct EchoTool {
        spec: ToolSpec,
    }

    impl EchoTool {
        fn new() -> Self {
            let mut params = BTreeMap::new();
            params.insert(
                "message".to_string(),
                ParamSpec {
                    kind: ParamKind::String,
                    required: true,
                    visibility: ParamVisibility::UserOrLlm,
                    description: "text to echo".to_string(),
                },
            );
            Self {
                spec: ToolSpec {
                    id: "echo".to_string(),
                    name: "Echo".to_string(),
                    description: "echoes its input".to_string(),
                    version: "1.0.0".to_string(),
                    params,
                },
            }
        }
    }

    impl Tool for EchoTool {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        fn build_request(&self, params: &Value) -> Result<ToolRequest, ToolError> {
            Ok(ToolRequest {
                url: Url::parse("https://example.com/echo").expect("static url"),
                method: HttpMethod::Post,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: Some(params.clone()),
            })
        }

        fn transform_response(&self, response: RawResponse) -> Result<ToolOutcome, ToolError> {
            if !response.is_ok() {
                return Err(ToolError::Remote {
                    message: response.error_message("Failed to echo"),
                    status: Some(response.status),
                });
            }
            Ok(ToolOutcome::new(response.body))
        }

        fn transform_error(&self, error: &ToolError) -> String {
            flowai_core::user_message(error)
                .unwrap_or_else(|| "An error occurred while echoing".to_string())
        }
    }

    struct MockTransport {
        requests: Mutex<Vec<ToolRequest>>,
        response: RawResponse,
    }

    impl MockTransport {
        fn returning(response: RawResponse) -> Self {
            Self {
                requests: Mutex::new(vec![]),
                response,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().expect("mock lock").len()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn execute(&self, request: ToolRequest) -> Result<RawResponse, ToolError> {
            self.requests.lock().expect("mock lock").push(request);
            Ok(self.response.clone())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl HttpTransport for FailingTransport {
        async fn execute(&self, _request: ToolRequest) -> Result<RawResponse, ToolError> {
            Err(ToolError::Transport("connection reset".to_string()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).expect("register");
        registry
    }

    #[tokio::test]
    async fn run_executes_the_full_pipeline() {
        let transport = Arc::new(MockTransport::returning(RawResponse {
            status: 200,
            body: json!({ "message": "hello" }),
        }));
        let client = Client::with_transport(registry(), transport.clone());

        let outcome = client
            .run("echo", &json!({ "message": "hello" }))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.output, json!({ "message": "hello" }));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn validation_failure_short_circuits_before_transport() {
        let transport = Arc::new(MockTransport::returning(RawResponse {
            status: 200,
            body: Value::Null,
        }));
        let client = Client::with_transport(registry(), transport.clone());

        let err = client.run("echo", &json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let client = Client::with_transport(
            registry(),
            Arc::new(MockTransport::returning(RawResponse {
                status: 200,
                body: Value::Null,
            })),
        );

        let err = client.run("missing", &json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn remote_error_surfaces_with_remote_message() {
        let transport = Arc::new(MockTransport::returning(RawResponse {
            status: 429,
            body: json!({ "message": "slow down" }),
        }));
        let client = Client::with_transport(registry(), transport);

        let err = client
            .run("echo", &json!({ "message": "hello" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Remote { message, .. } if message == "slow down"));
    }

    #[tokio::test]
    async fn run_to_message_applies_descriptor_fallback() {
        let client = Client::with_transport(registry(), Arc::new(FailingTransport));

        let message = client
            .run_to_message("echo", &json!({ "message": "hello" }))
            .await
            .unwrap_err();
        assert_eq!(message, "An error occurred while echoing");

        let message = client.run_to_message("missing", &json!({})).await.unwrap_err();
        assert_eq!(message, "tool not found: missing");
    }

    #[tokio::test]
    async fn reqwest_transport_forwards_request_and_normalizes_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({ "message": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let request = ToolRequest {
            url: Url::parse(&format!("{}/echo", server.uri())).unwrap(),
            method: HttpMethod::Post,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("x-api-key".to_string(), "test-key".to_string()),
            ],
            body: Some(json!({ "message": "hello" })),
        };

        let response = transport.execute(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn reqwest_transport_turns_non_json_body_into_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/half-broken"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let request = ToolRequest {
            url: Url::parse(&format!("{}/half-broken", server.uri())).unwrap(),
            method: HttpMethod::Get,
            headers: vec![],
            body: None,
        };

        let response = transport.execute(request).await.unwrap();
        assert_eq!(response.status, 502);
        assert_eq!(response.body, Value::Null);
    }
}
