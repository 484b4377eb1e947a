use rivals_core::types::MatchRecord;
use tracing::{error, info, instrument, warn};

use crate::client::McpClient;
use crate::unwrap::match_history_from_response;

/// Full subprocess path: a `list_tools` connectivity check followed by the
/// match-history tool call. Every failure is logged and yields no rows.
#[instrument(skip(client), fields(tool = %client.config().tool_name))]
pub async fn fetch_match_history(client: &McpClient, player_id: &str) -> Vec<MatchRecord> {
    match client.list_tools().await {
        Ok(response) if response.is_error => {
            warn!(
                error = response.error_message().unwrap_or_default(),
                "list_tools returned an error; trying the history call anyway"
            );
        }
        Ok(response) => {
            info!(tools = ?response.tool_names(), "MCP server is reachable");
        }
        Err(err) if err.is_configuration() => {
            error!(%err, "cannot start the MCP server");
            return Vec::new();
        }
        Err(err) => {
            warn!(%err, "list_tools failed; trying the history call anyway");
        }
    }

    let response = match client.call_tool_for_player(player_id).await {
        Ok(response) => response,
        Err(err) => {
            error!(%err, "match history call failed");
            return Vec::new();
        }
    };

    match match_history_from_response(&response, &client.config().list_key) {
        Ok(records) => records,
        Err(err) => {
            error!(%err, "could not read match history from the MCP response");
            Vec::new()
        }
    }
}
