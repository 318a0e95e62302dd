use gatehouse_tools::ExecutionMode;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const MODE_ENV: &str = "GATEHOUSE_MODE";
pub const DATA_ROOT_ENV: &str = "GATEHOUSE_DATA_ROOT";
pub const AUDIT_LOG_ENV: &str = "GATEHOUSE_AUDIT_LOG";
pub const KEY_FILE_ENV: &str = "GATEHOUSE_KEY_FILE";
pub const PROXY_URL_ENV: &str = "GATEHOUSE_PROXY_URL";
pub const TOKEN_ENV_ENV: &str = "GATEHOUSE_TOKEN_ENV";

const DEFAULT_TOKEN_ENV: &str = "GATEHOUSE_REMOTE_TOKEN";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable gateway configuration, resolved once at startup.
///
/// `token_env` is an indirection: it names the environment variable that
/// holds the bearer token, so the token itself never sits in config.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mode: ExecutionMode,
    pub data_root: PathBuf,
    pub audit_log_path: PathBuf,
    pub key_path: PathBuf,
    pub proxy_url: Option<String>,
    pub token_env: String,
    pub tool_timeout_ms: u64,
}

impl GatewayConfig {
    /// Resolve from the environment. Unknown mode strings fall back to
    /// isolated, the safe default. Directories are created on load.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = env::var(MODE_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(ExecutionMode::Isolated);
        let data_root = match env::var_os(DATA_ROOT_ENV) {
            Some(root) => PathBuf::from(root),
            None => env::current_dir()?.join("gatehouse_data"),
        };
        let audit_log_path = env::var_os(AUDIT_LOG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join("audit.log"));
        let key_path = env::var_os(KEY_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join("audit.key"));
        let proxy_url = env::var(PROXY_URL_ENV).ok().filter(|s| !s.is_empty());
        let token_env = env::var(TOKEN_ENV_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());

        let config = Self {
            mode,
            data_root,
            audit_log_path,
            key_path,
            proxy_url,
            token_env,
            tool_timeout_ms: DEFAULT_TIMEOUT_MS,
        };
        config.ensure_directories()?;
        Ok(config)
    }

    /// Configuration over an explicit data root, for embedding and tests.
    pub fn with_data_root(
        mode: ExecutionMode,
        data_root: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let data_root = data_root.into();
        let config = Self {
            mode,
            audit_log_path: data_root.join("audit.log"),
            key_path: data_root.join("audit.key"),
            data_root,
            proxy_url: None,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            tool_timeout_ms: DEFAULT_TIMEOUT_MS,
        };
        config.ensure_directories()?;
        Ok(config)
    }

    fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_root)?;
        if let Some(parent) = self.audit_log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Some(parent) = self.key_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
