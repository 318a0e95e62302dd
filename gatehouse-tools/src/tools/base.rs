use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::mode::ExecutionMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> serde_json::Value;

    /// Mode the caller must be in to run this tool. `None` means the tool
    /// is available in every mode.
    fn required_mode(&self) -> Option<ExecutionMode> {
        None
    }

    async fn execute(
        &self,
        ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError>;
}
