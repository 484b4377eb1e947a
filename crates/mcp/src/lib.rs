pub mod client;
pub mod error;
pub mod history;
pub mod process;
pub mod server;
pub mod types;
pub mod unwrap;

pub use client::{McpClient, McpExchange};
pub use error::McpError;
pub use history::fetch_match_history;
pub use process::{McpProcessHandle, ShutdownOutcome};
pub use server::MockRivalsServer;
pub use types::{ContentBlock, McpRequest, McpResponse, RequestParams};
pub use unwrap::UnwrapError;
