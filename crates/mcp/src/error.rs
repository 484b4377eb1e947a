use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("MCP executable not found: {executable} (check MCP_EXECUTABLE)")]
    ExecutableNotFound { executable: String },
    #[error("failed to spawn MCP process {executable}: {source}")]
    Spawn {
        executable: String,
        #[source]
        source: io::Error,
    },
    #[error("MCP process does not expose {0}")]
    MissingPipe(&'static str),
    #[error("failed to serialize MCP request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("MCP process returned a line that is not valid JSON: {source}; line: {line}")]
    Decode {
        line: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error talking to MCP process: {0}")]
    Io(#[from] io::Error),
}

impl McpError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, McpError::ExecutableNotFound { .. })
    }
}
