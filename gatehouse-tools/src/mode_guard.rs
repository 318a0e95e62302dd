use crate::audit::AuditSink;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::mode::ExecutionMode;
use crate::tools::{Tool, ToolResult};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Gates tool execution on the process's active execution mode.
///
/// The check runs strictly before the tool body: a denied call is audited
/// as `tool_denied` and fails with `ModeViolation` without any partial
/// side effects.
#[derive(Clone)]
pub struct ModeGuard {
    active: ExecutionMode,
    audit: Arc<dyn AuditSink>,
}

impl ModeGuard {
    pub fn new(active: ExecutionMode, audit: Arc<dyn AuditSink>) -> Self {
        Self { active, audit }
    }

    pub fn active(&self) -> ExecutionMode {
        self.active
    }

    pub async fn invoke(
        &self,
        tool: Arc<dyn Tool>,
        ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        if let Some(required) = tool.required_mode() {
            if required != self.active {
                warn!(tool = tool.name(), %required, active = %self.active, "tool denied");
                let payload = json!({
                    "tool": tool.name(),
                    "required_mode": required,
                    "current_mode": self.active,
                });
                if let Err(audit_err) = self.audit.append("tool_denied", payload).await {
                    // The denial stands even if it could not be recorded.
                    error!(error = %audit_err, "failed to record tool denial");
                }
                return Err(ToolError::ModeViolation(format!(
                    "{} requires {required} mode, active mode is {}",
                    tool.name(),
                    self.active
                )));
            }
        }

        tool.execute(ctx, input).await
    }
}
