use crate::mode::ExecutionMode;
use serde::{Deserialize, Serialize};

/// Per-invocation metadata threaded through tool execution. The
/// invocation id correlates tracing output; it never enters audit records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub agent: String,
    pub mode: ExecutionMode,
    pub invocation: String,
    pub timeout_ms: u64,
}

impl ExecutionContext {
    pub fn new(agent: String, mode: ExecutionMode, timeout_ms: u64) -> Self {
        Self {
            agent,
            mode,
            invocation: uuid::Uuid::new_v4().to_string(),
            timeout_ms,
        }
    }
}
