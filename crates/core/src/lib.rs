pub mod config;
pub mod export;
pub mod types;

pub use config::{AppConfig, HttpConfig, McpConfig};
pub use types::{Cell, Column, FieldSet, MatchRecord};
