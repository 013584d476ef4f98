use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Run-level failure.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is missing or invalid
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The search request could not be completed
    #[error("search failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Failure talking to the search API. A non-200 status is not one of these:
/// it resolves to an empty result instead.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("network error: {0}")]
    Network(String),

    #[error("response body could not be read")]
    InvalidBody,

    #[error("malformed search response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid search endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Why a single image was not saved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DownloadError {
    #[error("invalid URL")]
    InvalidUrl,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("response body could not be read")]
    InvalidBody,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("download task failed: {0}")]
    Task(String),
}

impl From<std::io::Error> for DownloadError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
