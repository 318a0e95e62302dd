use async_trait::async_trait;
use gatehouse_tools::{AuditSink, AuditWriteError};
use serde_json::Value;
use std::sync::Arc;

use crate::infra::audit_logger::AuditLogger;

/// Bridges the concrete logger into the tool layer's `AuditSink` seam.
/// Records are small and written synchronously so the append is durable
/// before the wrapped call returns.
pub struct AuditAdapter {
    logger: Arc<AuditLogger>,
}

impl AuditAdapter {
    pub fn new(logger: Arc<AuditLogger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &AuditLogger {
        &self.logger
    }
}

#[async_trait]
impl AuditSink for AuditAdapter {
    async fn append(&self, event: &str, payload: Value) -> Result<(), AuditWriteError> {
        self.logger
            .append(event, payload)
            .map_err(|e| AuditWriteError(e.to_string()))
    }
}
