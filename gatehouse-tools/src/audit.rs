use crate::error::ToolError;
use crate::mode::ExecutionMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One structured entry describing a tool invocation or denial.
///
/// Fields are declared in lexicographic order and `payload` objects use
/// serde_json's sorted maps, so the derived serialization is canonical:
/// logically identical records serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event: String,
    pub mode: ExecutionMode,
    pub payload: Value,
    pub ts: f64,
}

impl AuditRecord {
    pub fn new(event: impl Into<String>, mode: ExecutionMode, payload: Value, ts: f64) -> Self {
        Self {
            event: event.into(),
            mode,
            payload,
            ts,
        }
    }

    /// Record stamped with the current wall clock (seconds since epoch).
    pub fn now(event: impl Into<String>, mode: ExecutionMode, payload: Value) -> Self {
        let ts = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        Self::new(event, mode, payload, ts)
    }

    /// Deterministic plaintext form, the exact bytes stored (then
    /// encrypted, in isolated mode) on disk.
    pub fn canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Error, Debug)]
#[error("{0}")]
pub struct AuditWriteError(pub String);

impl From<AuditWriteError> for ToolError {
    fn from(err: AuditWriteError) -> Self {
        ToolError::AuditWriteFailure(err.0)
    }
}

/// Destination for audit records. Tools and the mode guard hold this as a
/// trait object; the concrete mode-aware logger lives in the infra crate.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, event: &str, payload: Value) -> Result<(), AuditWriteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_form_is_deterministic() {
        let a = AuditRecord::new(
            "write_file",
            ExecutionMode::Isolated,
            json!({"path": "notes/a.txt", "bytes": 2}),
            1_700_000_000.25,
        );
        let b = AuditRecord::new(
            "write_file",
            ExecutionMode::Isolated,
            json!({"bytes": 2, "path": "notes/a.txt"}),
            1_700_000_000.25,
        );
        assert_eq!(a.canonical_json().unwrap(), b.canonical_json().unwrap());
    }

    #[test]
    fn canonical_form_sorts_keys() {
        let record = AuditRecord::new(
            "read_file",
            ExecutionMode::Extended,
            json!({"path": "a.txt"}),
            1.0,
        );
        let text = String::from_utf8(record.canonical_json().unwrap()).unwrap();
        let positions: Vec<usize> = ["\"event\"", "\"mode\"", "\"payload\"", "\"ts\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
