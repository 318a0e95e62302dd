//! Device bridge tools backed by the Termux:API command set.
//!
//! Launch requests pass through the denylist in [`crate::policy`] before
//! the bridge is even probed, so a blocked package is blocked on every
//! host, not just on-device.

use crate::audit::AuditSink;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::policy;
use crate::tools::base::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::process::Command;
use tracing::error;

const BRIDGE_COMMANDS: &[&str] = &[
    "termux-app-list",
    "termux-activity-start",
    "termux-notification-list",
];

fn bridge_available() -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path)
        .any(|dir| BRIDGE_COMMANDS.iter().any(|cmd| dir.join(cmd).is_file()))
}

fn ensure_bridge() -> Result<(), ToolError> {
    if bridge_available() {
        Ok(())
    } else {
        Err(ToolError::ExecutionFailed(
            "device bridge commands not available on PATH".to_string(),
        ))
    }
}

async fn run_bridge(cmd: &str, args: &[&str]) -> Result<String, ToolError> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("{cmd}: {e}")))?;
    if !output.status.success() {
        return Err(ToolError::ExecutionFailed(format!(
            "{cmd} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub struct DeviceListAppsTool {
    audit: Arc<dyn AuditSink>,
}

impl DeviceListAppsTool {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl Tool for DeviceListAppsTool {
    fn name(&self) -> &'static str {
        "device_list_apps"
    }

    fn description(&self) -> &'static str {
        "List applications installed on the device"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        _input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        ensure_bridge()?;
        let stdout = run_bridge("termux-app-list", &[]).await?;

        // The bridge emits JSON on recent versions, bare lines on older ones.
        let apps: Vec<Value> = match serde_json::from_str::<Value>(&stdout) {
            Ok(Value::Array(items)) => items,
            _ => stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Value::String(line.to_string()))
                .collect(),
        };

        self.audit
            .append("device_list_apps", json!({"count": apps.len()}))
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"apps": apps})),
            error: None,
        })
    }
}

#[derive(Deserialize)]
struct LaunchAppInput {
    package: String,
}

pub struct DeviceLaunchAppTool {
    audit: Arc<dyn AuditSink>,
}

impl DeviceLaunchAppTool {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl Tool for DeviceLaunchAppTool {
    fn name(&self) -> &'static str {
        "device_launch_app"
    }

    fn description(&self) -> &'static str {
        "Launch an installed application (financial apps are blocked)"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "package": {"type": "string"} },
            "required": ["package"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: LaunchAppInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        if let Err(denied) = policy::check_launch_target(&input.package) {
            if let Err(audit_err) = self
                .audit
                .append("device_launch_blocked", json!({"package": input.package}))
                .await
            {
                error!(error = %audit_err, "failed to record blocked launch");
            }
            return Err(denied);
        }

        ensure_bridge()?;
        run_bridge("termux-activity-start", &["-p", &input.package]).await?;

        self.audit
            .append("device_launch_app", json!({"package": input.package}))
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"status": "launched", "package": input.package})),
            error: None,
        })
    }
}

#[derive(Deserialize)]
struct ReadNotificationsInput {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

pub struct DeviceReadNotificationsTool {
    audit: Arc<dyn AuditSink>,
}

impl DeviceReadNotificationsTool {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl Tool for DeviceReadNotificationsTool {
    fn name(&self) -> &'static str {
        "device_read_notifications"
    }

    fn description(&self) -> &'static str {
        "Read recent device notifications"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "limit": {"type": "number"} },
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: ReadNotificationsInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        ensure_bridge()?;
        let stdout = run_bridge("termux-notification-list", &[]).await?;

        let mut notifications: Vec<Value> = if stdout.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&stdout)
                .map_err(|e| ToolError::ExecutionFailed(format!("invalid bridge output: {e}")))?
        };
        notifications.truncate(input.limit);

        self.audit
            .append(
                "device_read_notifications",
                json!({"count": notifications.len()}),
            )
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"notifications": notifications})),
            error: None,
        })
    }
}
