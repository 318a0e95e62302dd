use crate::audit::AuditSink;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::sandbox::PathGuard;
use crate::tools::base::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

#[derive(Deserialize)]
struct ReadFileInput {
    path: String,
}

pub struct ReadFileTool {
    guard: PathGuard,
    audit: Arc<dyn AuditSink>,
}

impl ReadFileTool {
    pub fn new(sandbox_root: impl AsRef<Path>, audit: Arc<dyn AuditSink>) -> Result<Self, ToolError> {
        Ok(Self {
            guard: PathGuard::new(sandbox_root)?,
            audit,
        })
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file inside the agent data root"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "path": {"type": "string"} },
            "required": ["path"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: ReadFileInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let path = self.guard.resolve(&input.path)?;
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        self.audit
            .append("read_file", json!({"path": path.to_string_lossy()}))
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"content": content})),
            error: None,
        })
    }
}
