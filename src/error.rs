//! Error handling for rtoken

use thiserror::Error;

/// Main error type for rtoken operations
#[derive(Error, Debug)]
pub enum RtokenError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Browser closed before a token was captured")]
    BrowserClosed,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Token store is empty: {0}")]
    EmptyStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out waiting for login")]
    Timeout,

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Result type alias for rtoken operations
pub type Result<T> = std::result::Result<T, RtokenError>;
