use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::mode_guard::ModeGuard;
use crate::registry::ToolRegistry;
use crate::tools::ToolResult;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

const MAX_INPUT_BYTES: usize = 1_000_000;

pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    guard: ModeGuard,
    timeout_ms: u64,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, guard: ModeGuard, timeout_ms: u64) -> Self {
        Self {
            registry,
            guard,
            timeout_ms,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn dispatch(
        &self,
        agent: &str,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        self.validate_input(&input)?;

        let tool = self.registry.get(tool_name).ok_or_else(|| {
            warn!(agent, tool = tool_name, "unknown tool requested");
            ToolError::ToolNotFound(tool_name.to_string())
        })?;

        let ctx = ExecutionContext::new(agent.to_string(), self.guard.active(), self.timeout_ms);
        info!(agent, tool = tool_name, invocation = %ctx.invocation, "dispatching tool");

        // Spawn so a panicking tool body cannot take the dispatcher down.
        let guard = self.guard.clone();
        let handle = tokio::spawn(async move { guard.invoke(tool, ctx, input).await });

        match timeout(Duration::from_millis(self.timeout_ms), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    error!(tool = tool_name, "tool execution panicked");
                } else {
                    error!(tool = tool_name, "tool execution cancelled");
                }
                Err(ToolError::Internal)
            }
            Err(_) => {
                warn!(tool = tool_name, timeout_ms = self.timeout_ms, "tool execution timed out");
                Err(ToolError::Timeout)
            }
        }
    }

    fn validate_input(&self, input: &serde_json::Value) -> Result<(), ToolError> {
        if input.is_null() {
            return Err(ToolError::Validation("input must not be null".into()));
        }
        if let Ok(serialized) = serde_json::to_string(input) {
            if serialized.len() > MAX_INPUT_BYTES {
                return Err(ToolError::Validation("input exceeds size limit".into()));
            }
        }
        Ok(())
    }
}
