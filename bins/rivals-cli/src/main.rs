use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rivals_core::config::AppConfig;
use rivals_core::export::{output_filename, parse_delimiter, write_match_history};
use rivals_core::types::{Column, FieldSet, MatchRecord};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PREVIEW_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "rivals-cli",
    about = "Export Marvel Rivals match history to a CSV file",
    version
)]
struct Cli {
    /// In-game name and battletag, e.g. IronManFan#1234 (defaults to RIVALS_PLAYER_ID)
    #[arg(long, short = 'p', global = true)]
    player: Option<String>,
    /// Output file (defaults to <player>_match_history.csv)
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,
    /// Column separator, a single character or "\t"
    #[arg(long, short = 'd', global = true, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,
    /// Column set to export: basic or extended (defaults per source)
    #[arg(long, global = true)]
    fields: Option<FieldSet>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch match history over HTTP
    #[cfg(feature = "http")]
    Http(HttpCommand),
    /// Fetch match history from a local MCP server process
    #[cfg(feature = "mcp")]
    Mcp(McpCommand),
    /// List the tools exposed by the MCP server process
    #[cfg(feature = "mcp")]
    Tools(McpProcessArgs),
}

#[cfg(feature = "http")]
#[derive(Debug, Parser)]
struct HttpCommand {
    /// Base URL of the match history server (defaults to RIVALS_API_BASE_URL)
    #[arg(long, short = 'u')]
    base_url: Option<String>,
    /// Key holding the match list in the response body
    #[arg(long)]
    list_key: Option<String>,
}

#[cfg(feature = "mcp")]
#[derive(Debug, Parser)]
struct McpCommand {
    #[command(flatten)]
    process: McpProcessArgs,
    /// Tool to call for the match history (defaults to MCP_TOOL_NAME)
    #[arg(long, short = 't')]
    tool: Option<String>,
    /// Key holding the match list in the tool payload
    #[arg(long)]
    list_key: Option<String>,
}

#[cfg(feature = "mcp")]
#[derive(Debug, Clone, clap::Args)]
struct McpProcessArgs {
    /// MCP server executable (defaults to MCP_EXECUTABLE)
    #[arg(long, short = 'x')]
    executable: Option<String>,
    /// Argument passed to the executable; repeat for several (replaces MCP_ARGS)
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let mut config = AppConfig::load_from_env()?;
    if let Some(player) = &cli.player {
        config.player_id = Some(player.clone());
    }

    match &cli.command {
        #[cfg(feature = "http")]
        Commands::Http(cmd) => handle_http(&cli, cmd, config).await?,
        #[cfg(feature = "mcp")]
        Commands::Mcp(cmd) => handle_mcp(&cli, cmd, config).await?,
        #[cfg(feature = "mcp")]
        Commands::Tools(args) => handle_tools(args, config).await?,
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing::subscriber::set_global_default(
        tracing_subscriber::fmt().with_env_filter(filter).finish(),
    );
    Ok(())
}

#[cfg(feature = "http")]
async fn handle_http(cli: &Cli, cmd: &HttpCommand, mut config: AppConfig) -> Result<()> {
    use rivals_api::RivalsRestClient;

    if let Some(base_url) = &cmd.base_url {
        config.http.base_url = base_url.clone();
    }
    if let Some(list_key) = &cmd.list_key {
        config.http.list_key = list_key.clone();
    }
    let player_id = config.require_player_id()?.to_string();

    info!(player = %player_id, base_url = %config.http.base_url, "fetching match history over HTTP");
    let client = RivalsRestClient::from_config(&config).context("invalid HTTP configuration")?;
    let records = client.fetch_match_history(&player_id).await;

    export(cli, &player_id, &records, FieldSet::Basic)
}

#[cfg(feature = "mcp")]
fn mcp_config(
    args: &McpProcessArgs,
    config: &mut AppConfig,
) -> Result<rivals_core::config::McpConfig> {
    use rivals_core::config::McpConfig;

    if let Some(executable) = &args.executable {
        match config.mcp.as_mut() {
            Some(mcp) => {
                mcp.executable = executable.clone();
                if !args.args.is_empty() {
                    mcp.args = args.args.clone();
                }
            }
            None => config.mcp = Some(McpConfig::new(executable.clone(), args.args.clone())),
        }
    } else if !args.args.is_empty() {
        if let Some(mcp) = config.mcp.as_mut() {
            mcp.args = args.args.clone();
        }
    }
    Ok(config.require_mcp_config()?.clone())
}

#[cfg(feature = "mcp")]
async fn handle_mcp(cli: &Cli, cmd: &McpCommand, mut config: AppConfig) -> Result<()> {
    use mcp_adapter::{fetch_match_history, McpClient};

    let mut mcp = mcp_config(&cmd.process, &mut config)?;
    if let Some(tool) = &cmd.tool {
        mcp.tool_name = tool.clone();
    }
    if let Some(list_key) = &cmd.list_key {
        mcp.list_key = list_key.clone();
    }
    let player_id = config.require_player_id()?.to_string();

    info!(player = %player_id, executable = %mcp.executable, "fetching match history from MCP server");
    let client = McpClient::new(mcp);
    let records = fetch_match_history(&client, &player_id).await;

    export(cli, &player_id, &records, FieldSet::Extended)
}

#[cfg(feature = "mcp")]
async fn handle_tools(args: &McpProcessArgs, mut config: AppConfig) -> Result<()> {
    use mcp_adapter::McpClient;

    let client = McpClient::new(mcp_config(args, &mut config)?);
    let response = client.list_tools().await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn export(
    cli: &Cli,
    player_id: &str,
    records: &[MatchRecord],
    default_fields: FieldSet,
) -> Result<()> {
    if records.is_empty() {
        warn!("could not retrieve match history or it is empty; check the server setup and the list key");
        return Ok(());
    }

    let field_set = cli.fields.unwrap_or(default_fields);
    print_preview(records, field_set);
    println!("Total matches fetched: {}", records.len());

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(output_filename(player_id)));
    write_match_history(&path, records, field_set, cli.delimiter)?;
    println!("Match history saved to {}", path.display());
    Ok(())
}

fn print_preview(records: &[MatchRecord], field_set: FieldSet) {
    let columns: &[Column] = field_set.columns();
    let header: Vec<&str> = columns.iter().map(|column| column.header()).collect();
    println!("{}", header.join("\t"));
    for record in records.iter().take(PREVIEW_ROWS) {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                record
                    .get(*column)
                    .map(|cell| cell.to_string())
                    .unwrap_or_default()
            })
            .collect();
        println!("{}", row.join("\t"));
    }
}
