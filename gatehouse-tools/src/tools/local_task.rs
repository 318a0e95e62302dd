use crate::audit::AuditSink;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::mode::ExecutionMode;
use crate::tools::base::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
struct LocalTaskInput {
    task: String,
}

/// Offline stand-in for the remote task endpoint: answers immediately
/// without leaving the process.
pub struct LocalTaskTool {
    mode: ExecutionMode,
    audit: Arc<dyn AuditSink>,
}

impl LocalTaskTool {
    pub fn new(mode: ExecutionMode, audit: Arc<dyn AuditSink>) -> Self {
        Self { mode, audit }
    }
}

#[async_trait]
impl Tool for LocalTaskTool {
    fn name(&self) -> &'static str {
        "local_task"
    }

    fn description(&self) -> &'static str {
        "Run a task against the local stub"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "task": {"type": "string"} },
            "required": ["task"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: LocalTaskInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        self.audit
            .append("local_task", json!({"task": input.task}))
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({
                "mode": self.mode,
                "task": input.task,
                "result": format!("offline stub completed: {}", input.task),
            })),
            error: None,
        })
    }
}
