//! Error types for the sync layer

use planner_board::BoardError;
use thiserror::Error;

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while talking to the board server or loading configuration
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport-level failure (connect, timeout, body decode)
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// The backend refused the call (used by the in-memory server to
    /// simulate outages)
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl From<figment::Error> for SyncError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}

impl SyncError {
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Unavailable(_) => true,
            _ => false,
        }
    }
}
