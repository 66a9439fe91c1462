use std::fmt;

/// Coarse classification of a failure, produced where the failure happens
/// instead of being guessed later from message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    Decode,
    NotFound,
    Unauthorized,
    InvalidInput,
    Api,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Decode => "decode",
            ErrorKind::NotFound => "not found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Api => "api",
            ErrorKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Errors surfaced by the catalog client, the backends and the repositories.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CueError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Other(String),
}

impl CueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CueError::Network(_) => ErrorKind::Network,
            CueError::Timeout(_) => ErrorKind::Timeout,
            CueError::Decode(_) => ErrorKind::Decode,
            CueError::NotFound(_) => ErrorKind::NotFound,
            CueError::Unauthorized(_) => ErrorKind::Unauthorized,
            CueError::InvalidInput(_) => ErrorKind::InvalidInput,
            CueError::Api { .. } => ErrorKind::Api,
            CueError::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CueError::Network(_) | CueError::Timeout(_) => true,
            CueError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => CueError::Unauthorized(message),
            404 => CueError::NotFound(message),
            _ => CueError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for CueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CueError::Timeout(err.to_string())
        } else if err.is_decode() {
            CueError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            CueError::from_status(status.as_u16(), err.to_string())
        } else {
            CueError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CueError {
    fn from(err: serde_json::Error) -> Self {
        CueError::Decode(err.to_string())
    }
}

pub type CueResult<T> = Result<T, CueError>;
