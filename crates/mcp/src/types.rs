use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One request line sent to the MCP process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub id: String,
    pub params: RequestParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestParams {
    ListTools,
    CallTool {
        name: String,
        #[serde(default)]
        arguments: Value,
    },
}

impl McpRequest {
    pub fn list_tools() -> Self {
        Self::new(RequestParams::ListTools)
    }

    pub fn call_tool(name: impl Into<String>, arguments: Value) -> Self {
        Self::new(RequestParams::CallTool {
            name: name.into(),
            arguments,
        })
    }

    /// Tool call whose only argument is the player identifier.
    pub fn call_tool_for_player(name: impl Into<String>, identifier: &str) -> Self {
        Self::call_tool(name, json!({ "identifier": identifier }))
    }

    pub fn new(params: RequestParams) -> Self {
        let prefix = match &params {
            RequestParams::ListTools => "list_tools",
            RequestParams::CallTool { .. } => "call_tool",
        };
        Self {
            kind: RequestKind::Request,
            id: format!("{prefix}-{}", Utc::now().timestamp_millis()),
            params,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".to_string()),
            text: Some(text.into()),
        }
    }
}

/// One response line read back from the MCP process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpResponse {
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub const NO_RESPONSE_MESSAGE: &str = "no response from MCP process";

impl McpResponse {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    pub fn with_tools(tools: Vec<Value>) -> Self {
        Self {
            tools,
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            is_error: true,
            content: vec![ContentBlock::text(message.clone())],
            error: Some(message),
            ..Self::default()
        }
    }

    /// Error-tagged payload used when the process closes stdout without
    /// writing a line.
    pub fn no_response() -> Self {
        Self::error(NO_RESPONSE_MESSAGE)
    }

    pub fn is_no_response(&self) -> bool {
        self.is_error && self.error.as_deref() == Some(NO_RESPONSE_MESSAGE)
    }

    /// Best description of what went wrong on an error-tagged response.
    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error {
            return None;
        }
        self.error
            .as_deref()
            .or_else(|| self.content.first().and_then(|block| block.text.as_deref()))
            .or(Some("MCP process reported an error"))
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter_map(|tool| tool.get("name").and_then(Value::as_str))
            .collect()
    }
}
