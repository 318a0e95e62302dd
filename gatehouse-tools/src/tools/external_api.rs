use crate::audit::AuditSink;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::mode::ExecutionMode;
use crate::tools::base::{Tool, ToolResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const CALL_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Deserialize)]
struct CallExternalApiInput {
    endpoint: String,
    #[serde(default)]
    payload: Value,
}

/// Proxied outbound POST. Extended-mode only; the bearer token is read
/// through an environment indirection and neither it nor any body ever
/// reaches the audit trail.
pub struct CallExternalApiTool {
    client: Client,
    proxy_url: Option<String>,
    token_env: String,
    audit: Arc<dyn AuditSink>,
}

impl CallExternalApiTool {
    pub fn new(
        proxy_url: Option<String>,
        token_env: impl Into<String>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(Self {
            client,
            proxy_url,
            token_env: token_env.into(),
            audit,
        })
    }

    fn target(&self, endpoint: &str) -> String {
        match &self.proxy_url {
            Some(proxy) => format!(
                "{}/{}",
                proxy.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            ),
            None => endpoint.to_string(),
        }
    }
}

#[async_trait]
impl Tool for CallExternalApiTool {
    fn name(&self) -> &'static str {
        "call_external_api"
    }

    fn description(&self) -> &'static str {
        "POST a payload to an external endpoint through the configured proxy"
    }

    fn required_mode(&self) -> Option<ExecutionMode> {
        Some(ExecutionMode::Extended)
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "endpoint": {"type": "string"},
                "payload": {"type": "object"}
            },
            "required": ["endpoint"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: CallExternalApiInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let endpoint = self.target(&input.endpoint);
        let mut request = self.client.post(&endpoint).json(&input.payload);
        if let Ok(token) = std::env::var(&self.token_env) {
            if !token.is_empty() {
                request = request.bearer_auth(token);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToolError::UpstreamFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::UpstreamFailure(format!(
                "{endpoint} returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::UpstreamFailure(format!("invalid response body: {e}")))?;

        self.audit
            .append(
                "call_external_api",
                json!({"endpoint": endpoint, "status": status.as_u16()}),
            )
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(body),
            error: None,
        })
    }
}
