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
use tokio::io::AsyncWriteExt;

#[derive(Deserialize)]
struct WriteFileInput {
    path: String,
    content: String,
}

pub struct WriteFileTool {
    guard: PathGuard,
    audit: Arc<dyn AuditSink>,
}

impl WriteFileTool {
    pub fn new(sandbox_root: impl AsRef<Path>, audit: Arc<dyn AuditSink>) -> Result<Self, ToolError> {
        Ok(Self {
            guard: PathGuard::new(sandbox_root)?,
            audit,
        })
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write content to a file inside the agent data root"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "content": {"type": "string"}
            },
            "required": ["path", "content"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: WriteFileInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let path = self.guard.resolve_new(&input.path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ToolError::Validation("path has no file name".into()))?;
        let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        file.write_all(input.content.as_bytes())
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        file.sync_all()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let bytes = input.content.len();
        self.audit
            .append(
                "write_file",
                json!({"path": path.to_string_lossy(), "bytes": bytes}),
            )
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"path": path.to_string_lossy(), "bytes": bytes})),
            error: None,
        })
    }
}
