use gatehouse_tools::tools::{
    CallExternalApiTool, CopyFileTool, DeviceLaunchAppTool, DeviceListAppsTool,
    DeviceReadNotificationsTool, LocalTaskTool, ReadFileTool, SolveEquationTool, VectorNormTool,
    WriteFileTool,
};
use gatehouse_tools::{
    AuditSink, ExecutionMode, ModeGuard, ToolDispatcher, ToolError, ToolRegistry, ToolResult,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::infra::audit_adapter::AuditAdapter;
use crate::infra::audit_logger::AuditLogger;
use crate::infra::config::GatewayConfig;

pub const ISOLATED_AGENT: &str = "isolated_worker";
pub const EXTENDED_AGENT: &str = "extended_connector";

/// A named tool set routed through the gateway's dispatcher. The agent's
/// declared mode picks its default behavior for `run`; whether a given
/// tool may execute is decided by the process-wide mode guard.
pub struct Agent {
    name: String,
    mode: ExecutionMode,
    dispatcher: ToolDispatcher,
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn tools(&self) -> Vec<String> {
        self.dispatcher.registry().list()
    }

    pub async fn invoke(&self, tool: &str, input: Value) -> Result<ToolResult, ToolError> {
        self.dispatcher.dispatch(&self.name, tool, input).await
    }

    /// Run a free-form task: the isolated agent answers from the local
    /// stub, the extended agent forwards to the remote task endpoint.
    pub async fn run(&self, task: &str) -> Result<ToolResult, ToolError> {
        match self.mode {
            ExecutionMode::Isolated => self.invoke("local_task", json!({"task": task})).await,
            ExecutionMode::Extended => {
                self.invoke(
                    "call_external_api",
                    json!({
                        "endpoint": "/agent/task",
                        "payload": {"task": task},
                    }),
                )
                .await
            }
        }
    }
}

/// Tool set available in every mode: file I/O, local computation, and
/// device bridging.
pub fn isolated_registry(
    config: &GatewayConfig,
    sink: Arc<dyn AuditSink>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(ReadFileTool::new(&config.data_root, sink.clone())?))
        .register(Arc::new(WriteFileTool::new(&config.data_root, sink.clone())?))
        .register(Arc::new(CopyFileTool::new(&config.data_root, sink.clone())?))
        .register(Arc::new(SolveEquationTool::new(sink.clone())))
        .register(Arc::new(VectorNormTool::new(sink.clone())))
        .register(Arc::new(LocalTaskTool::new(config.mode, sink.clone())))
        .register(Arc::new(DeviceListAppsTool::new(sink.clone())))
        .register(Arc::new(DeviceLaunchAppTool::new(sink.clone())))
        .register(Arc::new(DeviceReadNotificationsTool::new(sink)));
    Ok(registry)
}

/// Isolated set plus the network tools — strictly a superset, so moving
/// a deployment from isolated to extended never removes a capability.
pub fn extended_registry(
    config: &GatewayConfig,
    sink: Arc<dyn AuditSink>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = isolated_registry(config, sink.clone())?;
    registry.register(Arc::new(CallExternalApiTool::new(
        config.proxy_url.clone(),
        config.token_env.clone(),
        sink,
    )?));
    Ok(registry)
}

/// The two default agents over a shared audit logger.
pub fn build_default_agents(
    config: &GatewayConfig,
    logger: Arc<AuditLogger>,
) -> Result<HashMap<String, Agent>, ToolError> {
    let sink: Arc<dyn AuditSink> = Arc::new(AuditAdapter::new(logger));

    let mut agents = HashMap::new();
    agents.insert(
        ISOLATED_AGENT.to_string(),
        Agent {
            name: ISOLATED_AGENT.to_string(),
            mode: ExecutionMode::Isolated,
            dispatcher: ToolDispatcher::new(
                Arc::new(isolated_registry(config, sink.clone())?),
                ModeGuard::new(config.mode, sink.clone()),
                config.tool_timeout_ms,
            ),
        },
    );
    agents.insert(
        EXTENDED_AGENT.to_string(),
        Agent {
            name: EXTENDED_AGENT.to_string(),
            mode: ExecutionMode::Extended,
            dispatcher: ToolDispatcher::new(
                Arc::new(extended_registry(config, sink.clone())?),
                ModeGuard::new(config.mode, sink),
                config.tool_timeout_ms,
            ),
        },
    );
    Ok(agents)
}
