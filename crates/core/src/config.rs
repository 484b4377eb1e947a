use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_http_list_key")]
    pub list_key: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            list_key: default_http_list_key(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    #[serde(default = "default_mcp_list_key")]
    pub list_key: String,
    #[serde(default = "default_stderr_delay_ms")]
    pub stderr_delay_ms: u64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl McpConfig {
    pub fn new(executable: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
            env: BTreeMap::new(),
            tool_name: default_tool_name(),
            list_key: default_mcp_list_key(),
            stderr_delay_ms: default_stderr_delay_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }

    pub fn stderr_delay(&self) -> Duration {
        Duration::from_millis(self.stderr_delay_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub mcp: Option<McpConfig>,
}

impl AppConfig {
    /// Build configuration from the optional YAML file, then overlay well-known
    /// environment variables on top of it.
    pub fn load_from_env() -> Result<Self> {
        preload_env_files();

        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::load_from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("config file {} is not valid YAML", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(player_id) = env_var_non_empty("RIVALS_PLAYER_ID") {
            self.player_id = Some(player_id);
        }
        if let Ok(base_url) = env_var_non_empty("RIVALS_API_BASE_URL") {
            self.http.base_url = base_url;
        }
        if let Ok(list_key) = env_var_non_empty("RIVALS_HTTP_LIST_KEY") {
            self.http.list_key = list_key;
        }
        if let Some(timeout) = env_u64("RIVALS_HTTP_TIMEOUT_SECS")? {
            self.http.timeout_secs = timeout;
        }

        if let Ok(executable) = env_var_non_empty("MCP_EXECUTABLE") {
            let args = env::var("MCP_ARGS")
                .ok()
                .map(|value| split_args(&value))
                .unwrap_or_default();
            match self.mcp.as_mut() {
                Some(mcp) => {
                    mcp.executable = executable;
                    if !args.is_empty() {
                        mcp.args = args;
                    }
                }
                None => self.mcp = Some(McpConfig::new(executable, args)),
            }
        }

        if let Some(mcp) = self.mcp.as_mut() {
            if let Ok(tool_name) = env_var_non_empty("MCP_TOOL_NAME") {
                mcp.tool_name = tool_name;
            }
            if let Ok(list_key) = env_var_non_empty("MCP_LIST_KEY") {
                mcp.list_key = list_key;
            }
            if let Some(delay) = env_u64("MCP_STDERR_DELAY_MS")? {
                mcp.stderr_delay_ms = delay;
            }
            if let Some(timeout) = env_u64("MCP_SHUTDOWN_TIMEOUT_SECS")? {
                mcp.shutdown_timeout_secs = timeout;
            }
        }

        Ok(())
    }

    /// Helper that forces the presence of a player identifier.
    pub fn require_player_id(&self) -> Result<&str> {
        let player_id = self.player_id.as_deref().context(
            "no player identifier: pass --player or set RIVALS_PLAYER_ID (e.g. IronManFan#1234)",
        )?;
        ensure!(
            !player_id.trim().is_empty(),
            "player identifier must not be blank"
        );
        Ok(player_id)
    }

    /// Helper that forces the presence of the MCP process configuration.
    pub fn require_mcp_config(&self) -> Result<&McpConfig> {
        let config = self.mcp.as_ref().context(
            "no MCP configuration: create a .env file and set MCP_EXECUTABLE (and optionally MCP_ARGS)",
        )?;

        ensure!(
            !config.executable.trim().is_empty(),
            "MCP_EXECUTABLE must not be blank"
        );

        Ok(config)
    }
}

pub fn split_args(value: &str) -> Vec<String> {
    value.split_whitespace().map(|s| s.to_string()).collect()
}

fn env_var_non_empty(key: &str) -> Result<String, env::VarError> {
    let value = env::var(key)?;
    if value.trim().is_empty() {
        return Err(env::VarError::NotPresent);
    }
    Ok(value)
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match env_var_non_empty(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{key} must be a non-negative integer, got {value:?}")),
        Err(_) => Ok(None),
    }
}

fn config_file_path() -> Option<PathBuf> {
    let config_path =
        env::var("RIVALS_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let path = PathBuf::from(&config_path);
    if path.is_absolute() {
        return Some(path);
    }
    env::current_dir().ok().map(|dir| dir.join(path))
}

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_http_list_key() -> String {
    "matches".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_tool_name() -> String {
    "get_player_match_history".to_string()
}

fn default_mcp_list_key() -> String {
    "matchHistory".to_string()
}

fn default_stderr_delay_ms() -> u64 {
    200
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

fn preload_env_files() {
    // .env in the working directory or any parent
    let _ = dotenv();

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join("../../.env");
    if candidate.exists() {
        let _ = dotenvy::from_path(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_file_fills_defaults_for_missing_keys() {
        let yaml = r#"
player_id: "IronManFan#1234"
mcp:
  executable: node
  args: ["dist/index.js"]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.require_player_id().unwrap(), "IronManFan#1234");
        assert_eq!(config.http.base_url, "http://localhost:3000");
        assert_eq!(config.http.list_key, "matches");

        let mcp = config.require_mcp_config().unwrap();
        assert_eq!(mcp.args, vec!["dist/index.js".to_string()]);
        assert_eq!(mcp.tool_name, "get_player_match_history");
        assert_eq!(mcp.list_key, "matchHistory");
        assert_eq!(mcp.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(mcp.stderr_delay(), Duration::from_millis(200));
    }

    #[test]
    fn missing_sections_are_reported() {
        let config = AppConfig::default();
        assert!(config.require_player_id().is_err());
        assert!(config.require_mcp_config().is_err());

        let blank = AppConfig {
            player_id: Some("   ".into()),
            mcp: Some(McpConfig::new(" ", Vec::new())),
            ..AppConfig::default()
        };
        assert!(blank.require_player_id().is_err());
        assert!(blank.require_mcp_config().is_err());
    }

    #[test]
    fn args_split_on_whitespace() {
        assert_eq!(
            split_args("  dist/index.js   --stdio "),
            vec!["dist/index.js".to_string(), "--stdio".to_string()]
        );
        assert!(split_args("   ").is_empty());
    }
}
