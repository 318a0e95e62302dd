pub mod base;
pub mod compute;
pub mod device;
pub mod external_api;
pub mod file_copy;
pub mod file_read;
pub mod file_write;
pub mod local_task;

pub use base::{Tool, ToolResult};
pub use compute::{SolveEquationTool, VectorNormTool};
pub use device::{DeviceLaunchAppTool, DeviceListAppsTool, DeviceReadNotificationsTool};
pub use external_api::CallExternalApiTool;
pub use file_copy::CopyFileTool;
pub use file_read::ReadFileTool;
pub use file_write::WriteFileTool;
pub use local_task::LocalTaskTool;
