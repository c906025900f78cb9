use std::time::Duration;

use thiserror::Error;

use super::types::Stage;

#[derive(Error, Debug)]
pub enum SpeedTestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse server list: {0}")]
    ServerList(#[from] serde_json::Error),

    #[error("Invalid server '{name}': {reason}")]
    InvalidServer { name: String, reason: String },

    #[error("No speed test servers: {0}")]
    NoServers(String),

    #[error("{stage} timed out after {}s", limit.as_secs_f64())]
    Timeout { stage: Stage, limit: Duration },

    #[error("All speed test servers failed")]
    AllServersFailed,

    #[error("Speed test cancelled")]
    Cancelled,

    #[error("Failed to resolve '{host}': {reason}")]
    Resolve { host: String, reason: String },

    #[error("{0}")]
    Other(String),
}
