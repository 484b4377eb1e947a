use rivals_core::types::{records_under_key, MatchRecord};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::types::McpResponse;

#[derive(Debug, Error)]
pub enum UnwrapError {
    #[error("MCP tool reported an error: {0}")]
    ToolError(String),
    #[error("response is missing {0}")]
    MissingField(&'static str),
    #[error("tool payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pull the JSON payload out of `content[0].text`, which carries it as an
/// encoded string.
pub fn unwrap_payload(response: &McpResponse) -> Result<Value, UnwrapError> {
    if let Some(message) = response.error_message() {
        return Err(UnwrapError::ToolError(message.to_string()));
    }

    let text = response
        .content
        .first()
        .and_then(|block| block.text.as_deref())
        .ok_or(UnwrapError::MissingField("content[0].text"))?;

    Ok(serde_json::from_str(text)?)
}

/// Map the list stored under `key`. A missing, non-list or empty entry is a
/// soft condition: it logs and yields no rows.
pub fn map_match_history(payload: &Value, key: &str) -> Vec<MatchRecord> {
    match records_under_key(payload, key) {
        Some(records) if !records.is_empty() => {
            info!(count = records.len(), "mapped match history");
            records
        }
        _ => {
            let keys: Vec<&str> = payload
                .as_object()
                .map(|object| object.keys().map(String::as_str).collect())
                .unwrap_or_default();
            warn!(
                ?keys,
                "no '{key}' list in the tool payload or it is empty; adjust MCP_LIST_KEY if the server uses another key"
            );
            Vec::new()
        }
    }
}

pub fn match_history_from_response(
    response: &McpResponse,
    key: &str,
) -> Result<Vec<MatchRecord>, UnwrapError> {
    let payload = unwrap_payload(response)?;
    Ok(map_match_history(&payload, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentBlock;
    use rivals_core::types::Cell;
    use serde_json::json;

    fn wrap(payload: &Value) -> McpResponse {
        McpResponse::success(vec![ContentBlock::text(payload.to_string())])
    }

    #[test]
    fn nested_payload_is_parsed_twice() {
        let response = wrap(&json!({
            "matchHistory": [
                {"matchId": "m1", "kills": 10, "deaths": 2, "gameMode": "Competitive"},
                {"matchId": "m2", "healingDone": 15000.5, "timestamp": "2025-01-01T12:00:00Z"}
            ]
        }));

        let records = match_history_from_response(&response, "matchHistory").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kills, Some(Cell::Integer(10)));
        assert_eq!(records[0].game_mode, Some(Cell::from("Competitive")));
        assert_eq!(records[0].assists, None);
        assert_eq!(records[1].healing_done, Some(Cell::Float(15000.5)));
        assert_eq!(records[1].timestamp, Some(Cell::from("2025-01-01T12:00:00Z")));
    }

    #[test]
    fn missing_text_is_missing_field() {
        let response = McpResponse::success(vec![ContentBlock::default()]);
        assert!(matches!(
            unwrap_payload(&response),
            Err(UnwrapError::MissingField("content[0].text"))
        ));
        assert!(matches!(
            unwrap_payload(&McpResponse::default()),
            Err(UnwrapError::MissingField(_))
        ));
    }

    #[test]
    fn invalid_inner_json_is_parse_error() {
        let response = McpResponse::success(vec![ContentBlock::text("matchHistory: none")]);
        assert!(matches!(unwrap_payload(&response), Err(UnwrapError::Parse(_))));
    }

    #[test]
    fn error_responses_are_reported() {
        let err = unwrap_payload(&McpResponse::error("player not found")).unwrap_err();
        assert!(matches!(err, UnwrapError::ToolError(ref message) if message == "player not found"));

        let bare = McpResponse {
            is_error: true,
            ..McpResponse::default()
        };
        assert!(matches!(unwrap_payload(&bare), Err(UnwrapError::ToolError(_))));
    }

    #[test]
    fn absent_or_empty_list_is_empty() {
        let absent = wrap(&json!({"matches": [{"matchId": "m1"}]}));
        assert!(match_history_from_response(&absent, "matchHistory")
            .unwrap()
            .is_empty());

        let empty = wrap(&json!({"matchHistory": []}));
        assert!(match_history_from_response(&empty, "matchHistory")
            .unwrap()
            .is_empty());

        assert!(map_match_history(&json!([1, 2, 3]), "matchHistory").is_empty());
    }
}
