use mcp_adapter::{fetch_match_history, McpClient, McpRequest, ShutdownOutcome};
use rivals_core::config::McpConfig;
use rivals_core::types::{Cell, FieldSet};
use serde_json::json;

fn mock_config() -> McpConfig {
    let mut config = McpConfig::new(env!("CARGO_BIN_EXE_rivals-mock-server"), Vec::new());
    config.stderr_delay_ms = 50;
    config.shutdown_timeout_secs = 2;
    config
        .env
        .insert("RUST_LOG".to_string(), "debug".to_string());
    config
}

#[tokio::test]
async fn list_tools_reaches_mock_server() {
    let client = McpClient::new(mock_config());
    let exchange = client.exchange(McpRequest::list_tools()).await;

    let response = exchange.result.unwrap();
    assert_eq!(response.tool_names(), vec!["get_player_match_history"]);
    match exchange.shutdown {
        Some(ShutdownOutcome::Exited(status)) => assert!(status.success()),
        other => panic!("mock server should exit on EOF, got {other:?}"),
    }
}

#[tokio::test]
async fn fetches_extended_match_history() {
    let client = McpClient::new(mock_config());
    let records = fetch_match_history(&client, "IronManFan#1234").await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].hero_played, Some(Cell::from("Spider-Man")));
    assert_eq!(records[0].kills, Some(Cell::Integer(18)));
    assert_eq!(records[1].healing_done, Some(Cell::Integer(18342)));
    assert_eq!(records[1].time_played_hero_seconds, None);
    assert_eq!(records[2].kills, None);
    assert_eq!(records[2].game_mode, Some(Cell::from("Quick Match")));

    let mut out = Vec::new();
    rivals_core::export::write_records(&mut out, &records, FieldSet::Extended, b',').unwrap();
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 4);
}

#[tokio::test]
async fn fixture_payload_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = dir.path().join("history.json");
    std::fs::write(
        &fixture,
        json!({"matchHistory": [{"matchId": "m1", "outcome": "Victory"}]}).to_string(),
    )
    .unwrap();

    let mut config = mock_config();
    config.env.insert(
        "MOCK_RIVALS_FIXTURE".to_string(),
        fixture.display().to_string(),
    );
    let records = fetch_match_history(&McpClient::new(config), "Player").await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].match_id, Some(Cell::from("m1")));
    assert_eq!(records[0].map_name, None);
}

#[tokio::test]
async fn empty_history_is_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = dir.path().join("empty.json");
    std::fs::write(&fixture, r#"{"matchHistory": []}"#).unwrap();

    let mut config = mock_config();
    config.env.insert(
        "MOCK_RIVALS_FIXTURE".to_string(),
        fixture.display().to_string(),
    );
    assert!(fetch_match_history(&McpClient::new(config), "Player")
        .await
        .is_empty());
}

#[tokio::test]
async fn wrong_tool_name_yields_empty_history() {
    let mut config = mock_config();
    config.tool_name = "get_comics".to_string();
    let client = McpClient::new(config);

    let response = client.call_tool_for_player("Player").await.unwrap();
    assert!(response.is_error);
    assert!(fetch_match_history(&client, "Player").await.is_empty());
}

#[tokio::test]
async fn missing_executable_yields_empty_history() {
    let client = McpClient::new(McpConfig::new("/no/such/rivals-mcp-server", Vec::new()));
    assert!(fetch_match_history(&client, "Player").await.is_empty());
}
