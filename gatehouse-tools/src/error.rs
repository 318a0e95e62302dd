use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("mode violation: {0}")]
    ModeViolation(String),

    #[error("path escapes sandbox: {0}")]
    PathEscape(String),

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("audit write failed: {0}")]
    AuditWriteFailure(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("operation timed out")]
    Timeout,

    #[error("internal error")]
    Internal,
}

impl ToolError {
    /// Stable kind tag exposed at the invocation boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::ToolNotFound(_) => "ToolNotFound",
            ToolError::ModeViolation(_) => "ModeViolation",
            ToolError::PathEscape(_) => "PathEscape",
            ToolError::PolicyViolation(_) => "PolicyViolation",
            ToolError::UpstreamFailure(_) => "UpstreamFailure",
            ToolError::AuditWriteFailure(_) => "AuditWriteFailure",
            ToolError::Validation(_) => "ValidationError",
            ToolError::ExecutionFailed(_) => "ExecutionFailed",
            ToolError::Timeout => "Timeout",
            ToolError::Internal => "Internal",
        }
    }

    pub fn to_wire(&self) -> WireError {
        WireError {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Error shape returned over RPC-like transports.
#[derive(Debug, Clone, Serialize)]
pub struct WireError {
    pub kind: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ToolError::ToolNotFound("x".into()).kind(), "ToolNotFound");
        assert_eq!(ToolError::ModeViolation("m".into()).kind(), "ModeViolation");
        assert_eq!(ToolError::Timeout.kind(), "Timeout");

        let wire = ToolError::PathEscape("../up".into()).to_wire();
        assert_eq!(wire.kind, "PathEscape");
        assert!(wire.message.contains("../up"));
    }
}
