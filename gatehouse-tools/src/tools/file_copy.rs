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
struct CopyFileInput {
    src: String,
    dst: String,
}

pub struct CopyFileTool {
    guard: PathGuard,
    audit: Arc<dyn AuditSink>,
}

impl CopyFileTool {
    pub fn new(sandbox_root: impl AsRef<Path>, audit: Arc<dyn AuditSink>) -> Result<Self, ToolError> {
        Ok(Self {
            guard: PathGuard::new(sandbox_root)?,
            audit,
        })
    }
}

#[async_trait]
impl Tool for CopyFileTool {
    fn name(&self) -> &'static str {
        "copy_file"
    }

    fn description(&self) -> &'static str {
        "Copy a file between two paths inside the agent data root"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "src": {"type": "string"},
                "dst": {"type": "string"}
            },
            "required": ["src", "dst"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: CopyFileInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let src = self.guard.resolve(&input.src)?;
        let dst = self.guard.resolve_new(&input.dst)?;
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        }

        let copied = fs::copy(&src, &dst)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        self.audit
            .append(
                "copy_file",
                json!({"src": src.to_string_lossy(), "dst": dst.to_string_lossy()}),
            )
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"src": src.to_string_lossy(), "dst": dst.to_string_lossy(), "bytes": copied})),
            error: None,
        })
    }
}
