use anyhow::Result;
use mcp_adapter::MockRivalsServer;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    MockRivalsServer::from_env()?.serve_stdio().await
}

// stdout carries the protocol, so logs go to stderr and, optionally, a file.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt().with_env_filter(filter).with_ansi(false);

    match std::env::var("MOCK_SERVER_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("rivals-mock-server")
                .build(dir)?;
            let writer = std::io::stderr.and(file_appender);
            let _ =
                tracing::subscriber::set_global_default(subscriber.with_writer(writer).finish());
        }
        _ => {
            let _ = tracing::subscriber::set_global_default(
                subscriber.with_writer(std::io::stderr).finish(),
            );
        }
    }
    Ok(())
}
