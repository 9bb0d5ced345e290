//! Error types for the MCP bridge

use thiserror::Error;

/// Bridge-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;
