use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::env;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::types::{ContentBlock, McpRequest, McpResponse, RequestParams};

pub const DEFAULT_TOOL_NAME: &str = "get_player_match_history";

/// Small stand-in for the Marvel Rivals game-data server. It answers the
/// line protocol with canned match history, which is enough to exercise the
/// client end to end without the real service.
#[derive(Debug, Clone)]
pub struct MockRivalsServer {
    tool_name: String,
    payload: Value,
}

impl Default for MockRivalsServer {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_NAME, sample_payload())
    }
}

impl MockRivalsServer {
    pub fn new(tool_name: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            payload,
        }
    }

    /// `MOCK_RIVALS_FIXTURE` points at a JSON file used as the tool payload;
    /// `MOCK_RIVALS_TOOL_NAME` renames the tool.
    pub fn from_env() -> Result<Self> {
        let tool_name =
            env::var("MOCK_RIVALS_TOOL_NAME").unwrap_or_else(|_| DEFAULT_TOOL_NAME.to_string());
        let payload = match env::var("MOCK_RIVALS_FIXTURE") {
            Ok(path) if !path.trim().is_empty() => load_fixture(Path::new(&path))?,
            _ => sample_payload(),
        };
        Ok(Self::new(tool_name, payload))
    }

    /// Answer a single request line.
    pub fn handle_line(&self, line: &str) -> McpResponse {
        let request: McpRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "received a request that is not valid JSON");
                return McpResponse::error(format!("invalid request: {err}"));
            }
        };
        debug!(id = %request.id, "handling request");

        match request.params {
            RequestParams::ListTools => McpResponse::with_tools(vec![json!({
                "name": self.tool_name,
                "description": "Return the recent match history of a Marvel Rivals player.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"identifier": {"type": "string"}},
                    "required": ["identifier"]
                }
            })]),
            RequestParams::CallTool { name, arguments } => {
                if name != self.tool_name {
                    return McpResponse::error(format!("unknown tool: {name}"));
                }
                let Some(identifier) = arguments.get("identifier").and_then(Value::as_str) else {
                    return McpResponse::error("missing argument: identifier");
                };
                info!(identifier, "serving match history");
                McpResponse::success(vec![ContentBlock::text(self.payload.to_string())])
            }
        }
    }

    /// Serve requests until the reader hits EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            let payload = serde_json::to_string(&response)?;
            writer.write_all(payload.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Run over the process stdio and return once the peer disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }
}

fn load_fixture(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("fixture {} is not valid JSON", path.display()))
}

pub fn sample_payload() -> Value {
    json!({
        "matchHistory": [
            {
                "matchId": "5912438_1712345678_1",
                "outcome": "Victory",
                "mapName": "Tokyo 2099: Shin-Shibuya",
                "heroPlayed": "Spider-Man",
                "durationSeconds": 612,
                "kills": 18,
                "deaths": 4,
                "assists": 7,
                "damageDealt": 21450,
                "healingDone": 0,
                "ultimateUses": 3,
                "timePlayedHeroSeconds": 598,
                "gameMode": "Competitive",
                "timestamp": "2025-01-11T19:42:10Z"
            },
            {
                "matchId": "5912438_1712349999_1",
                "outcome": "Defeat",
                "mapName": "Yggsgard: Royal Palace",
                "heroPlayed": "Luna Snow",
                "durationSeconds": 745,
                "kills": 6,
                "deaths": 5,
                "assists": 21,
                "damageDealt": 8120,
                "healingDone": 18342,
                "ultimateUses": 2,
                "gameMode": "Competitive",
                "timestamp": "2025-01-11T20:05:44Z"
            },
            {
                "matchId": "5912438_1712352001_1",
                "outcome": "Victory",
                "mapName": "Hydra Charteris Base: Hell's Heaven",
                "heroPlayed": "Magneto",
                "durationSeconds": 530,
                "gameMode": "Quick Match"
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_single_tool() {
        let server = MockRivalsServer::default();
        let line = serde_json::to_string(&McpRequest::list_tools()).unwrap();
        let response = server.handle_line(&line);
        assert_eq!(response.tool_names(), vec![DEFAULT_TOOL_NAME]);
    }

    #[test]
    fn call_tool_wraps_payload_as_text() {
        let server = MockRivalsServer::default();
        let line = serde_json::to_string(&McpRequest::call_tool_for_player(
            DEFAULT_TOOL_NAME,
            "IronManFan#1234",
        ))
        .unwrap();
        let response = server.handle_line(&line);

        assert!(!response.is_error);
        let text = response.content[0].text.as_deref().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["matchHistory"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn rejects_unknown_tool_and_bad_input() {
        let server = MockRivalsServer::default();

        let unknown = serde_json::to_string(&McpRequest::call_tool_for_player("get_comics", "x"))
            .unwrap();
        assert_eq!(
            server.handle_line(&unknown).error_message(),
            Some("unknown tool: get_comics")
        );

        let no_args =
            serde_json::to_string(&McpRequest::call_tool(DEFAULT_TOOL_NAME, json!({}))).unwrap();
        assert!(server.handle_line(&no_args).is_error);

        assert!(server.handle_line("{not json").is_error);
    }

    #[tokio::test]
    async fn serves_one_line_per_request() {
        let server = MockRivalsServer::new("history", json!({"matchHistory": []}));
        let input = format!(
            "{}\n\n{}\n",
            serde_json::to_string(&McpRequest::list_tools()).unwrap(),
            serde_json::to_string(&McpRequest::call_tool_for_player("history", "p")).unwrap()
        );
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<McpResponse> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].tool_names(), vec!["history"]);
        assert_eq!(
            lines[1].content[0].text.as_deref(),
            Some(r#"{"matchHistory":[]}"#)
        );
    }
}
