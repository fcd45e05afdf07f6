// src/errors.rs
use thiserror::Error;

/// Failures of a profile import. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Please enter a username")]
    EmptyUsername,
    #[error("Could not find data in response.")]
    Extraction,
    #[error("Parsing failed: {0}")]
    MalformedPayload(String),
    #[error("Server timed out (408). Please try again later.")]
    Timeout,
    #[error("User {0} not found. Check capitalization (e.g. \"BorisAka\").")]
    NotFound(String),
    #[error("Network error ({0})")]
    Network(u16),
    #[error("Proxy error possibly.")]
    Proxy,
    #[error("Request failed: {0}")]
    Transport(String),
}

impl ImportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ImportError::Timeout)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while pulling index price history for the reference data.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rate limited by history provider")]
    RateLimited,
    #[error("Bad response: {0}")]
    BadResponse(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
