use rivals_core::config::McpConfig;
use tracing::{debug, info, instrument, warn};

use crate::error::McpError;
use crate::process::{McpProcessHandle, ShutdownOutcome};
use crate::types::{McpRequest, McpResponse};

/// Everything observed during one request/response cycle.
#[derive(Debug)]
pub struct McpExchange {
    pub result: Result<McpResponse, McpError>,
    pub stderr: Vec<String>,
    /// `None` only when the process could not be started.
    pub shutdown: Option<ShutdownOutcome>,
}

/// Runs one request per child process; nothing is kept between calls.
#[derive(Debug, Clone)]
pub struct McpClient {
    config: McpConfig,
}

impl McpClient {
    pub fn new(config: McpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &McpConfig {
        &self.config
    }

    pub async fn call(&self, request: McpRequest) -> Result<McpResponse, McpError> {
        self.exchange(request).await.result
    }

    pub async fn list_tools(&self) -> Result<McpResponse, McpError> {
        self.call(McpRequest::list_tools()).await
    }

    pub async fn call_tool_for_player(&self, identifier: &str) -> Result<McpResponse, McpError> {
        self.call(McpRequest::call_tool_for_player(
            self.config.tool_name.clone(),
            identifier,
        ))
        .await
    }

    /// Spawn, send one line, read one line, then stop the child. The child is
    /// stopped on every path: gracefully after a good exchange, killed after a
    /// failed one.
    #[instrument(skip_all, fields(request_id = %request.id))]
    pub async fn exchange(&self, request: McpRequest) -> McpExchange {
        let mut handle = match McpProcessHandle::spawn(&self.config).await {
            Ok(handle) => handle,
            Err(err) => {
                return McpExchange {
                    result: Err(err),
                    stderr: Vec::new(),
                    shutdown: None,
                }
            }
        };

        debug!(request = ?request.params, "sending MCP request");
        let result = round_trip(&mut handle, &request).await;

        let stderr = handle.drain_stderr(self.config.stderr_delay()).await;
        for line in &stderr {
            debug!(target: "mcp_stderr", "{line}");
        }

        let shutdown = match &result {
            Ok(_) => handle.shutdown(self.config.shutdown_timeout()).await,
            Err(err) => {
                warn!(%err, "MCP exchange failed; killing process");
                handle.kill().await
            }
        };
        info!(?shutdown, "MCP process stopped");

        McpExchange {
            result,
            stderr,
            shutdown: Some(shutdown),
        }
    }
}

async fn round_trip(
    handle: &mut McpProcessHandle,
    request: &McpRequest,
) -> Result<McpResponse, McpError> {
    handle.send(request).await?;
    let response = handle.read_response().await?;
    if response.is_no_response() {
        warn!("MCP process closed stdout without answering");
    }
    Ok(response)
}
